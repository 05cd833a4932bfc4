use anyhow::{anyhow, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Csv,
    Quiet,
}

pub struct OutputRenderer {
    format: OutputFormat,
    columns: Option<Vec<String>>,
}

type Rows = (Vec<String>, Vec<Vec<String>>);

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            columns: None,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Restricts table and CSV output to `columns`, in that order.
    pub fn with_columns<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format: self.format,
            columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;

        match self.format {
            OutputFormat::Table => match self.table(&json_value) {
                Some(table) => println!("{table}"),
                None => println!("{}", serde_json::to_string_pretty(&json_value)?),
            },
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&json_value)?);
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(&json_value)?);
            }
            OutputFormat::Csv => match self.csv(&json_value)? {
                Some(csv) => print!("{csv}"),
                None => println!("{}", serde_json::to_string_pretty(&json_value)?),
            },
            OutputFormat::Quiet => {
                for id in Self::ids(&json_value) {
                    println!("{id}");
                }
            }
        }

        Ok(())
    }

    /// Prints a confirmation line unless output is meant for machines.
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Table => println!("{} {}", "✓".green().bold(), message),
            _ => eprintln!("{message}"),
        }
    }

    fn table(&self, value: &Value) -> Option<String> {
        let (headers, rows) = self.coerce_rows(value)?;

        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }

        Some(builder.build().with(Style::rounded()).to_string())
    }

    fn csv(&self, value: &Value) -> Result<Option<String>> {
        let Some((headers, rows)) = self.coerce_rows(value) else {
            return Ok(None);
        };

        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        wtr.write_record(&headers)?;
        for row in &rows {
            wtr.write_record(row)?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|err| anyhow!("failed to flush CSV output: {err}"))?;
        Ok(Some(String::from_utf8(bytes)?))
    }

    /// Finds the list to tabulate: the value itself, or the first array of
    /// objects inside a response wrapper such as `{"bugs": [...]}`.
    fn row_source(value: &Value) -> Option<&Vec<Value>> {
        match value {
            Value::Array(rows) => Some(rows),
            Value::Object(obj) => obj.values().find_map(|field| match field {
                Value::Array(rows) if rows.iter().any(Value::is_object) => Some(rows),
                _ => None,
            }),
            _ => None,
        }
    }

    fn coerce_rows(&self, value: &Value) -> Option<Rows> {
        let rows = Self::row_source(value).filter(|rows| !rows.is_empty())?;

        let headers: Vec<String> = match &self.columns {
            Some(columns) => columns.clone(),
            None => {
                let mut headers: Vec<String> = Vec::new();
                for key in rows.iter().filter_map(Value::as_object).flat_map(|o| o.keys()) {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
                headers
            }
        };

        if headers.is_empty() {
            return None;
        }

        let data: Vec<Vec<String>> = rows
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| {
                headers
                    .iter()
                    .map(|header| obj.get(header).map(Self::value_to_string).unwrap_or_default())
                    .collect::<Vec<String>>()
            })
            .collect();

        Some((headers, data))
    }

    fn ids(value: &Value) -> Vec<String> {
        let id_of = |row: &Value| row.get("id").map(Self::value_to_string);

        if let Some(rows) = Self::row_source(value) {
            return rows.iter().filter_map(id_of).collect();
        }
        id_of(value).into_iter().collect()
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
                .iter()
                .map(Self::value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
