mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use bugzilla_api::{ApiError, BugzillaClient};
use bugzilla_cli_auth::CredentialStore;
use bugzilla_cli_config::{Config, Profile};
use bugzilla_cli_output::{OutputFormat, OutputRenderer};
use clap::{Parser, Subcommand};
use commands::attachment::AttachmentCommands;
use commands::bug::BugCommands;
use commands::comment::CommentCommands;
use commands::profile::{self, ProfileCommand};
use commands::search::SearchArgs;
use commands::utils::BugzillaContext;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bugzilla-cli", version, about = "Command-line client for the Bugzilla REST API", long_about = None)]
struct Cli {
    /// Profile to use from config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Path to config file (defaults to ~/.bugzilla-cli/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: BugzillaCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum BugzillaCommand {
    /// Search bugs
    Search(SearchArgs),
    /// Bug commands
    #[command(subcommand)]
    Bug(BugCommands),
    /// Comment commands
    #[command(subcommand)]
    Comment(CommentCommands),
    /// Attachment commands
    #[command(subcommand)]
    Attachment(AttachmentCommands),
    /// Profile commands
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(hint) = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<ApiError>())
                .and_then(ApiError::suggestion)
            {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    let mut config = Config::load(config_path.as_ref())?;
    let renderer = OutputRenderer::new(cli.output);
    let store = CredentialStore::new()?;
    let requested = cli.profile.as_deref();

    match cli.command {
        BugzillaCommand::Search(args) => {
            let ctx = connect(&config, requested, &store, &renderer)?;
            commands::search::execute(args, &ctx).await
        }
        BugzillaCommand::Bug(command) => {
            let ctx = connect(&config, requested, &store, &renderer)?;
            commands::bug::execute(command, &ctx).await
        }
        BugzillaCommand::Comment(command) => {
            let ctx = connect(&config, requested, &store, &renderer)?;
            commands::comment::execute(command, &ctx).await
        }
        BugzillaCommand::Attachment(command) => {
            let ctx = connect(&config, requested, &store, &renderer)?;
            commands::attachment::execute(command, &ctx).await
        }
        BugzillaCommand::Profile(command) => profile::handle(
            command,
            &mut config,
            config_path.as_deref(),
            &store,
            &renderer,
        ),
    }
}

fn connect<'a>(
    config: &Config,
    requested: Option<&str>,
    store: &CredentialStore,
    renderer: &'a OutputRenderer,
) -> Result<BugzillaContext<'a>> {
    Ok(BugzillaContext {
        client: build_client(config, requested, store)?,
        renderer,
    })
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,bugzilla_api=debug,bugzilla_cli=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

fn build_client(
    config: &Config,
    requested: Option<&str>,
    store: &CredentialStore,
) -> Result<BugzillaClient> {
    let (name, profile) = config
        .resolve_profile(requested)
        .ok_or_else(|| match requested {
            Some(name) => anyhow!("Profile '{name}' is not configured."),
            None => anyhow!("No profile configured. Run `bugzilla-cli profile add` first."),
        })?;

    let base_url = profile
        .base_url
        .as_deref()
        .ok_or_else(|| anyhow!("Profile '{name}' is missing a base_url."))?;

    let api_key = resolve_api_key(name, profile, store)?;
    if api_key.is_empty() {
        tracing::debug!(profile = name, "No API key configured, using anonymous access");
    }

    Ok(BugzillaClient::new(base_url, api_key)?)
}

/// Key lookup: `BUGZILLA_API_KEY_{PROFILE}` → `BUGZILLA_API_KEY` →
/// credentials file → profile `api_key`. Empty when none is set.
fn resolve_api_key(name: &str, profile: &Profile, store: &CredentialStore) -> Result<String> {
    let from_env = |var: &str| {
        std::env::var(var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(key) = from_env(&profile_env_var(name)).or_else(|| from_env("BUGZILLA_API_KEY")) {
        return Ok(key);
    }
    if let Some(key) = store.get_secret(name)? {
        return Ok(key);
    }
    Ok(profile.api_key.clone().unwrap_or_default())
}

fn profile_env_var(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("BUGZILLA_API_KEY_{suffix}")
}
