use anyhow::{Context, Result};
use bugzilla_api::{record, Record};
use clap::Subcommand;

use super::utils::{apply_assignments, report, BugzillaContext};

#[derive(Subcommand, Debug, Clone)]
pub enum BugCommands {
    /// Fetch a single bug by id or alias
    Get { id: String },

    /// File a new bug
    Create {
        #[arg(long)]
        product: String,
        #[arg(long)]
        component: String,
        #[arg(long)]
        summary: String,
        /// Initial description (first comment)
        #[arg(long)]
        description: Option<String>,
        /// Product version (defaults to "other")
        #[arg(long)]
        version: Option<String>,
        /// Operating system (defaults to "All")
        #[arg(long)]
        op_sys: Option<String>,
        /// Hardware platform (defaults to "All")
        #[arg(long)]
        platform: Option<String>,
        /// Any other bug field (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Update an existing bug
    Update {
        id: String,
        /// Field to change (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required_unless_present = "comment")]
        fields: Vec<String>,
        /// Comment to add along with the change
        #[arg(long)]
        comment: Option<String>,
    },
}

pub async fn execute(command: BugCommands, ctx: &BugzillaContext<'_>) -> Result<()> {
    match command {
        BugCommands::Get { id } => {
            let bug = ctx
                .client
                .get_bug(id.as_str())
                .await
                .with_context(|| format!("Failed to fetch bug {id}"))?;
            ctx.renderer.render(&bug)
        }
        BugCommands::Create {
            product,
            component,
            summary,
            description,
            version,
            op_sys,
            platform,
            fields,
        } => {
            let mut bug = record! {
                "product" => product,
                "component" => component,
                "summary" => summary,
            };
            let optional = [
                ("description", description),
                ("version", version),
                ("op_sys", op_sys),
                ("platform", platform),
            ];
            for (field, value) in optional {
                if let Some(value) = value {
                    bug.set(field, value);
                }
            }
            apply_assignments(&mut bug, &fields)?;

            let response = ctx
                .client
                .post_bug(&mut bug)
                .await
                .context("Failed to create bug")?;
            let id = response.get_as::<u64>("id").unwrap_or_default();
            tracing::info!(id, "Bug created");
            report(ctx, &response, &format!("Created bug {id}"))
        }
        BugCommands::Update {
            id,
            fields,
            comment,
        } => {
            let mut update = Record::new();
            apply_assignments(&mut update, &fields)?;
            if let Some(body) = comment {
                update.set("comment", serde_json::json!({ "body": body }));
            }

            let response = ctx
                .client
                .put_bug(id.as_str(), &mut update)
                .await
                .with_context(|| format!("Failed to update bug {id}"))?;
            report(ctx, &response, &format!("Updated bug {id}"))
        }
    }
}
