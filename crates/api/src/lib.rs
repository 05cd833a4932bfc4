pub mod error;
mod endpoints;
pub mod record;
pub mod types;

pub use error::{ApiError, Result};
pub use record::Record;
pub use serde_json;
pub use types::{encode_search_terms, Id, SearchTerm};

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Client for the Bugzilla REST API (`/rest/` endpoints).
///
/// Holds a base URL and an API key and nothing else; every operation is one
/// request/response round trip with no retries and no shared mutable state.
///
/// The key is sent as the `api_key` query parameter, percent-encoded like
/// search values (a no-op for alphanumeric keys). It never appears in logs
/// or errors: the `url` of [`ApiError::Remote`] is the response URL with the
/// parameter rewritten to `api_key=***`.
#[derive(Clone)]
pub struct BugzillaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for BugzillaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BugzillaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl BugzillaClient {
    /// Creates a client rooted at `base_url`, e.g. `https://bugzilla.mozilla.org/rest/`.
    ///
    /// A missing trailing `/` is appended.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.as_ref().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url)?;

        let client = Client::builder()
            .user_agent(format!("bugzilla-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::RequestFailed)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `path` with the API key and any extra
    /// `&field=value` parameters appended.
    pub fn request_url(&self, path: &str, params: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        format!(
            "{}{}?api_key={}{}",
            self.base_url,
            path,
            types::quote(&self.api_key),
            params
        )
    }

    pub async fn get(&self, path: &str, params: &str) -> Result<Record> {
        self.request(Method::GET, path, params, Option::<&()>::None)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Record> {
        self.request(Method::POST, path, "", Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Record> {
        self.request(Method::PUT, path, "", Some(body)).await
    }

    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &str,
        body: Option<&B>,
    ) -> Result<Record> {
        let url = self.request_url(path, params);
        debug!(method = %method, url = %self.redact(&url), "Sending request");

        let mut req = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let response = req.send().await?;
        let status = response.status();
        let response_url = self.redact(response.url().as_str());
        let text = response.text().await?;

        debug!(method = %method, status = status.as_u16(), "Received response");

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(ApiError::InvalidResponse(format!(
                    "response from {response_url} is not JSON: {err}"
                )));
            }
            Err(_) => Value::String(text),
        };

        let signals_error = body.get("error").and_then(Value::as_bool) == Some(true);
        if !status.is_success() || signals_error {
            if status.is_success() {
                warn!(url = %response_url, "Server reported an error in a successful response");
            }
            return Err(ApiError::Remote {
                url: response_url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        Record::try_from(body)
    }

    fn redact(&self, url: &str) -> String {
        if self.api_key.is_empty() {
            return url.to_string();
        }
        url.replace(
            &format!("api_key={}", types::quote(&self.api_key)),
            "api_key=***",
        )
    }
}
