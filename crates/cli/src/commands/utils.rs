use anyhow::{anyhow, Result};
use bugzilla_api::{BugzillaClient, Record};
use bugzilla_cli_output::{OutputFormat, OutputRenderer};
use serde_json::Value;

pub struct BugzillaContext<'a> {
    pub client: BugzillaClient,
    pub renderer: &'a OutputRenderer,
}

/// Parses `FIELD=VALUE`. The value is read as JSON when it parses, so
/// `--set priority=P1` gives a string and `--set blocks=[12,13]` an array.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected FIELD=VALUE, got '{raw}'"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(anyhow!("Field name cannot be empty in '{raw}'"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

pub fn apply_assignments(record: &mut Record, assignments: &[String]) -> Result<()> {
    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        record.set(field, value);
    }
    Ok(())
}

/// Prints a confirmation for table output, the raw response otherwise.
pub fn report(ctx: &BugzillaContext<'_>, response: &Record, message: &str) -> Result<()> {
    if ctx.renderer.format() == OutputFormat::Table {
        ctx.renderer.success(message);
        Ok(())
    } else {
        ctx.renderer.render(response)
    }
}

/// First value of an object keyed by id, e.g. `{"42": {...}}`.
pub fn first_entry<'v>(value: &'v Value, what: &str) -> Result<&'v Value> {
    value
        .as_object()
        .and_then(|obj| obj.values().next())
        .ok_or_else(|| anyhow!("Server returned no {what}"))
}
