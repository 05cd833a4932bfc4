use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bugzilla_cli_auth::CredentialStore;
use bugzilla_cli_config::Config;
use bugzilla_cli_output::OutputRenderer;
use clap::{Args, Subcommand};
use serde::Serialize;
use url::Url;

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Add or update a profile and store its API key
    Add(AddArgs),
    /// List configured profiles
    List,
    /// Remove a profile and its stored API key
    Remove(RemoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Profile name to create or update.
    #[arg(long)]
    pub name: String,
    /// REST endpoint of the Bugzilla instance (e.g. https://bugzilla.mozilla.org/rest/).
    #[arg(long)]
    pub base_url: String,
    /// API key to store in the credentials file. Profiles without one can
    /// still read public bugs.
    #[arg(long, env = "BUGZILLA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Mark this profile as the default one.
    #[arg(long)]
    pub default: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    #[arg(long)]
    pub name: String,
}

pub fn handle(
    command: ProfileCommand,
    config: &mut Config,
    config_path: Option<&Path>,
    store: &CredentialStore,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        ProfileCommand::Add(args) => add(args, config, config_path, store, renderer),
        ProfileCommand::List => list(config, store, renderer),
        ProfileCommand::Remove(args) => remove(args, config, config_path, store, renderer),
    }
}

fn add(
    args: AddArgs,
    config: &mut Config,
    config_path: Option<&Path>,
    store: &CredentialStore,
    renderer: &OutputRenderer,
) -> Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(anyhow!("Profile name cannot be empty"));
    }

    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("Invalid Bugzilla URL: {}", args.base_url))?;

    let profile = config.profiles.entry(name.to_string()).or_default();
    profile.base_url = Some(base_url.to_string());
    profile.api_key = None;

    if args.default || config.default_profile.is_none() {
        config.default_profile = Some(name.to_string());
    }

    if let Some(key) = args.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        store
            .set_secret(name, key)
            .context("Failed to store API key")?;
    }

    config
        .save(config_path)
        .context("Failed to save configuration")?;

    tracing::info!(profile = name, "Profile saved");
    renderer.success(&format!("Saved profile '{name}'"));
    Ok(())
}

fn list(config: &Config, store: &CredentialStore, renderer: &OutputRenderer) -> Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        name: &'a str,
        base_url: &'a str,
        default: bool,
        api_key: &'static str,
    }

    if config.profiles.is_empty() {
        tracing::info!("No profiles configured. Run `bugzilla-cli profile add` first.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(config.profiles.len());
    for (name, profile) in &config.profiles {
        let api_key = if store.get_secret(name)?.is_some() {
            "stored"
        } else if profile.api_key.is_some() {
            "in config"
        } else {
            "none"
        };
        rows.push(Row {
            name,
            base_url: profile.base_url.as_deref().unwrap_or(""),
            default: config.default_profile.as_deref() == Some(name.as_str()),
            api_key,
        });
    }

    renderer.render(&rows)
}

fn remove(
    args: RemoveArgs,
    config: &mut Config,
    config_path: Option<&Path>,
    store: &CredentialStore,
    renderer: &OutputRenderer,
) -> Result<()> {
    if config.remove_profile(&args.name).is_none() {
        return Err(anyhow!("Profile '{}' does not exist", args.name));
    }
    store
        .delete_secret(&args.name)
        .context("Failed to remove stored API key")?;
    config
        .save(config_path)
        .context("Failed to save configuration")?;

    renderer.success(&format!("Removed profile '{}'", args.name));
    Ok(())
}
