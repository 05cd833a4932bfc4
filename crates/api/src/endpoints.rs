//! Bug, comment and attachment operations.
//!
//! Operations that send a caller-built [`Record`] take it by `&mut` and fill
//! in defaults on it before serializing, so the caller sees exactly what was
//! transmitted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::types::{encode_search_terms, Id, SearchTerm};
use crate::{BugzillaClient, Record};

impl BugzillaClient {
    /// Free-text search, equivalent to a single `quicksearch` term.
    pub async fn quick_search(&self, text: &str) -> Result<Record> {
        self.search_bugs([SearchTerm::new("quicksearch", text)])
            .await
    }

    /// Searches bugs. The response carries the matches under `bugs`.
    pub async fn search_bugs<I>(&self, terms: I) -> Result<Record>
    where
        I: IntoIterator<Item = SearchTerm>,
    {
        let params = encode_search_terms(terms);
        debug!(params = %params, "Searching bugs");
        self.get("bug", &params).await
    }

    pub async fn get_bug(&self, id: impl Into<Id>) -> Result<Record> {
        let id: Id = id.into();
        let response = self.get(&format!("bug/{id}"), "").await?;
        let first = response
            .get("bugs")?
            .as_array()
            .and_then(|bugs| bugs.first())
            .cloned()
            .ok_or_else(|| ApiError::InvalidResponse(format!("no bug returned for {id}")))?;
        Record::try_from(first)
    }

    pub async fn get_comments(&self, bug_id: impl Into<Id>) -> Result<Record> {
        let id: Id = bug_id.into();
        self.get(&format!("bug/{id}/comment"), "").await
    }

    pub async fn get_comment(&self, comment_id: impl Into<Id>) -> Result<Record> {
        let id: Id = comment_id.into();
        self.get(&format!("bug/comment/{id}"), "").await
    }

    /// Attachments of a bug, keyed by bug id as returned by the server.
    pub async fn get_attachments(&self, bug_id: impl Into<Id>) -> Result<Record> {
        let id: Id = bug_id.into();
        let mut response = self.get(&format!("bug/{id}/attachment"), "").await?;
        Record::try_from(response.delete("bugs")?)
    }

    pub async fn get_attachment(&self, attachment_id: impl Into<Id>) -> Result<Record> {
        let id: Id = attachment_id.into();
        self.get(&format!("bug/attachment/{id}"), "").await
    }

    /// Updates an attachment. `ids` defaults to `[attachment_id]`.
    pub async fn put_attachment(
        &self,
        attachment_id: impl Into<Id>,
        update: &mut Record,
    ) -> Result<Record> {
        let id: Id = attachment_id.into();
        update.set_default("ids", json!([Value::from(&id)]));
        self.put(&format!("bug/attachment/{id}"), &*update).await
    }

    /// Updates a bug. `ids` defaults to `[bug_id]`.
    pub async fn put_bug(&self, bug_id: impl Into<Id>, update: &mut Record) -> Result<Record> {
        let id: Id = bug_id.into();
        update.set_default("ids", json!([Value::from(&id)]));
        self.put(&format!("bug/{id}"), &*update).await
    }

    /// Attaches a file to a bug.
    ///
    /// `data`, `file_name` and `summary` are required. `data` must be ASCII
    /// text and is replaced with its base64 encoding before sending;
    /// `content_type` defaults to `text/plain`.
    pub async fn post_attachment(
        &self,
        bug_id: impl Into<Id>,
        attachment: &mut Record,
    ) -> Result<Record> {
        const OPERATION: &str = "post_attachment";
        require(attachment, OPERATION, &["data", "file_name", "summary"])?;

        let encoded = match attachment.get("data")? {
            Value::String(data) if data.is_ascii() => STANDARD.encode(data.as_bytes()),
            _ => {
                return Err(ApiError::PreconditionFailed {
                    operation: OPERATION,
                    field: "data",
                })
            }
        };

        let id: Id = bug_id.into();
        attachment.set_default("content_type", "text/plain");
        attachment.set("ids", &id);
        attachment.set("data", encoded);

        self.post(&format!("bug/{id}/attachment"), &*attachment)
            .await
    }

    /// Files a new bug.
    ///
    /// `product`, `component` and `summary` are required; `version`,
    /// `op_sys` and `platform` default to `other`, `All` and `All`.
    pub async fn post_bug(&self, bug: &mut Record) -> Result<Record> {
        require(bug, "post_bug", &["product", "component", "summary"])?;
        bug.set_default("version", "other");
        bug.set_default("op_sys", "All");
        bug.set_default("platform", "All");

        self.post("bug", &*bug).await
    }

    pub async fn post_comment(&self, bug_id: impl Into<Id>, comment: &str) -> Result<Record> {
        let id: Id = bug_id.into();
        let body = json!({ "id": Value::from(&id), "comment": comment });
        self.post(&format!("bug/{id}/comment"), &body).await
    }
}

fn require(record: &Record, operation: &'static str, fields: &[&'static str]) -> Result<()> {
    match fields.iter().find(|field| !record.contains_key(field)) {
        Some(field) => Err(ApiError::PreconditionFailed {
            operation,
            field: *field,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_require_reports_first_missing_field() {
        let bug = record! { "product" => "P" };
        match require(&bug, "post_bug", &["product", "component", "summary"]) {
            Err(ApiError::PreconditionFailed { operation, field }) => {
                assert_eq!(operation, "post_bug");
                assert_eq!(field, "component");
            }
            other => panic!("expected PreconditionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_require_all_present() {
        let bug = record! { "product" => "P", "component" => "C", "summary" => "S" };
        assert!(require(&bug, "post_bug", &["product", "component", "summary"]).is_ok());
    }
}
