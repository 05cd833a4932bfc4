use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bugzilla_api::{record, Record};
use clap::Subcommand;
use serde_json::Value;

use super::utils::{apply_assignments, first_entry, report, BugzillaContext};

const COLUMNS: [&str; 6] = [
    "id",
    "file_name",
    "summary",
    "content_type",
    "size",
    "is_obsolete",
];

#[derive(Subcommand, Debug, Clone)]
pub enum AttachmentCommands {
    /// List attachments of a bug
    List { bug: String },
    /// Fetch a single attachment
    Get {
        id: String,
        /// Write the decoded contents to this file instead of printing metadata
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Attach a text file to a bug
    Add {
        bug: String,
        /// File to upload
        #[arg(long)]
        file: PathBuf,
        /// Short description of the attachment
        #[arg(long)]
        summary: String,
        /// Name shown in Bugzilla (defaults to the file's name)
        #[arg(long)]
        file_name: Option<String>,
        /// MIME type (defaults to text/plain)
        #[arg(long)]
        content_type: Option<String>,
        /// Comment to add along with the attachment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Update attachment metadata
    Update {
        id: String,
        /// Field to change (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },
}

pub async fn execute(command: AttachmentCommands, ctx: &BugzillaContext<'_>) -> Result<()> {
    match command {
        AttachmentCommands::List { bug } => {
            let attachments: Value = ctx
                .client
                .get_attachments(bug.as_str())
                .await
                .with_context(|| format!("Failed to fetch attachments for bug {bug}"))?
                .into();
            ctx.renderer
                .with_columns(COLUMNS)
                .render(first_entry(&attachments, "bug")?)
        }
        AttachmentCommands::Get { id, save } => {
            let response = ctx
                .client
                .get_attachment(id.as_str())
                .await
                .with_context(|| format!("Failed to fetch attachment {id}"))?;
            let attachment = first_entry(response.get("attachments")?, "attachment")?;

            match save {
                Some(path) => {
                    let encoded = attachment
                        .get("data")
                        .and_then(|data| data.as_str())
                        .ok_or_else(|| anyhow!("Attachment {id} has no data"))?;
                    save_decoded(encoded, &path)?;
                    ctx.renderer
                        .success(&format!("Saved attachment {id} to {}", path.display()));
                    Ok(())
                }
                None => ctx.renderer.render(attachment),
            }
        }
        AttachmentCommands::Add {
            bug,
            file,
            summary,
            file_name,
            content_type,
            comment,
        } => {
            let mut attachment = build_attachment(&file, summary, file_name)?;
            if let Some(content_type) = content_type {
                attachment.set("content_type", content_type);
            }
            if let Some(comment) = comment {
                attachment.set("comment", comment);
            }

            let response = ctx
                .client
                .post_attachment(bug.as_str(), &mut attachment)
                .await
                .with_context(|| format!("Failed to attach {} to bug {bug}", file.display()))?;
            report(ctx, &response, &format!("Attached {} to bug {bug}", file.display()))
        }
        AttachmentCommands::Update { id, fields } => {
            let mut update = Record::new();
            apply_assignments(&mut update, &fields)?;

            let response = ctx
                .client
                .put_attachment(id.as_str(), &mut update)
                .await
                .with_context(|| format!("Failed to update attachment {id}"))?;
            report(ctx, &response, &format!("Updated attachment {id}"))
        }
    }
}

fn build_attachment(file: &Path, summary: String, file_name: Option<String>) -> Result<Record> {
    let data = fs::read_to_string(file)
        .with_context(|| format!("Unable to read {} as text", file.display()))?;

    let file_name = match file_name {
        Some(name) => name,
        None => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Cannot derive a file name from {}", file.display()))?,
    };

    Ok(record! {
        "data" => data,
        "file_name" => file_name,
        "summary" => summary,
    })
}

fn save_decoded(encoded: &str, path: &Path) -> Result<()> {
    let bytes = STANDARD
        .decode(encoded)
        .context("Attachment data is not valid base64")?;
    fs::write(path, bytes).with_context(|| format!("Unable to write {}", path.display()))
}
