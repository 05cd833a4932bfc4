use anyhow::{anyhow, Context, Result};
use bugzilla_api::SearchTerm;
use clap::Args;

use super::utils::BugzillaContext;

const COLUMNS: [&str; 7] = [
    "id",
    "status",
    "resolution",
    "product",
    "component",
    "assigned_to",
    "summary",
];

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Quick search text, as typed into the Bugzilla search box
    #[arg(short, long, conflicts_with_all = ["product", "component", "status", "assignee", "terms"])]
    pub quick: Option<String>,

    /// Filter by product
    #[arg(short, long)]
    pub product: Option<String>,

    /// Filter by component
    #[arg(short, long)]
    pub component: Option<String>,

    /// Filter by status (repeatable)
    #[arg(short, long)]
    pub status: Vec<String>,

    /// Filter by assignee login
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Any other search field (repeatable)
    #[arg(long = "term", value_name = "FIELD=VALUE")]
    pub terms: Vec<String>,

    /// Maximum number of bugs to return
    #[arg(long)]
    pub limit: Option<usize>,
}

impl SearchArgs {
    /// Filter flags as search terms, in flag order.
    pub fn to_terms(&self) -> Result<Vec<SearchTerm>> {
        let mut terms = Vec::new();

        if let Some(text) = &self.quick {
            terms.push(SearchTerm::new("quicksearch", text));
        }
        if let Some(product) = &self.product {
            terms.push(SearchTerm::new("product", product));
        }
        if let Some(component) = &self.component {
            terms.push(SearchTerm::new("component", component));
        }
        terms.extend(self.status.iter().map(|s| SearchTerm::new("status", s)));
        if let Some(assignee) = &self.assignee {
            terms.push(SearchTerm::new("assigned_to", assignee));
        }
        for raw in &self.terms {
            let (field, value) = raw
                .split_once('=')
                .filter(|(field, _)| !field.trim().is_empty())
                .ok_or_else(|| anyhow!("Expected FIELD=VALUE, got '{raw}'"))?;
            terms.push(SearchTerm::new(field.trim(), value));
        }

        if terms.is_empty() {
            return Err(anyhow!(
                "Provide --quick or at least one filter (--product, --status, --term, ...)"
            ));
        }

        if let Some(limit) = self.limit {
            terms.push(SearchTerm::new("limit", limit.to_string()));
        }

        Ok(terms)
    }
}

pub async fn execute(args: SearchArgs, ctx: &BugzillaContext<'_>) -> Result<()> {
    let response = match (&args.quick, args.limit) {
        (Some(text), None) => ctx.client.quick_search(text).await,
        _ => ctx.client.search_bugs(args.to_terms()?).await,
    }
    .context("Failed to search bugs")?;

    let found = response
        .get("bugs")
        .ok()
        .and_then(|bugs| bugs.as_array())
        .map_or(0, Vec::len);
    if found == 0 {
        tracing::info!("No bugs matched the search.");
        return Ok(());
    }

    ctx.renderer.with_columns(COLUMNS).render(&response)
}
