use anyhow::{anyhow, Context, Result};
use clap::Subcommand;

use super::utils::{first_entry, report, BugzillaContext};

const COLUMNS: [&str; 5] = ["id", "count", "creator", "creation_time", "text"];

#[derive(Subcommand, Debug, Clone)]
pub enum CommentCommands {
    /// List comments on a bug
    List { bug: String },
    /// Fetch a single comment by id
    Get { id: String },
    /// Add a comment to a bug
    Add {
        bug: String,
        /// Comment text
        text: String,
    },
}

pub async fn execute(command: CommentCommands, ctx: &BugzillaContext<'_>) -> Result<()> {
    match command {
        CommentCommands::List { bug } => {
            let response = ctx
                .client
                .get_comments(bug.as_str())
                .await
                .with_context(|| format!("Failed to fetch comments for bug {bug}"))?;
            let comments = first_entry(response.get("bugs")?, "bug")?
                .get("comments")
                .ok_or_else(|| anyhow!("Server returned no comments for bug {bug}"))?;
            ctx.renderer.with_columns(COLUMNS).render(comments)
        }
        CommentCommands::Get { id } => {
            let response = ctx
                .client
                .get_comment(id.as_str())
                .await
                .with_context(|| format!("Failed to fetch comment {id}"))?;
            ctx.renderer
                .render(first_entry(response.get("comments")?, "comment")?)
        }
        CommentCommands::Add { bug, text } => {
            let response = ctx
                .client
                .post_comment(bug.as_str(), &text)
                .await
                .with_context(|| format!("Failed to comment on bug {bug}"))?;
            let id = response.get_as::<u64>("id").unwrap_or_default();
            report(ctx, &response, &format!("Added comment {id} to bug {bug}"))
        }
    }
}
