//! Remote game-data service client.
//!
//! Fetches the manifest index, the manifest archive and the live milestone
//! feed. Every call is a single attempt: a transport failure, a non-success
//! HTTP status or a non-success response envelope is returned as an
//! [`ApiError`] and the caller aborts before touching the cache.

mod archive;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use archive::extract_manifest;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// `ErrorCode` the service uses for a successful response.
const SUCCESS_CODE: i64 = 1;
/// Manifest locale to download.
const MANIFEST_LOCALE: &str = "en";

/// Milestone payloads keyed by milestone identifier.
pub type Milestones = BTreeMap<String, Value>;

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service answered with a non-success HTTP status.
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response envelope reported an error.
    #[error("upstream error {code} ({status}): {message}")]
    Upstream {
        code: i64,
        status: String,
        message: String,
    },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The manifest archive could not be read.
    #[error("invalid manifest archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Writing the extracted manifest failed.
    #[error("failed to write manifest: {0}")]
    Io(#[from] std::io::Error),
}

/// Game-data service client.
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(ApiError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(ApiError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolves the download path of the current manifest database.
    pub async fn manifest_content_path(&self, index_path: &str) -> Result<String, ApiError> {
        let body = self.get_text(index_path).await?;
        parse_manifest_index(&body)
    }

    /// Downloads raw bytes, typically the zipped manifest.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "downloading");
        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        let bytes = response.bytes().await?;
        tracing::debug!(bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    /// Fetches the live milestone feed.
    pub async fn milestones(&self, milestone_path: &str) -> Result<Milestones, ApiError> {
        let body = self.get_text(milestone_path).await?;
        let milestones: Milestones = parse_envelope(&body)?;
        tracing::debug!(milestones = milestones.len(), "fetched milestones");
        Ok(milestones)
    }

    async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "requesting");
        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_envelope_error(&body).unwrap_or(ApiError::Status { status, body }));
        }
        Ok(body)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<T> {
    response: Option<T>,
    error_code: Option<i64>,
    error_status: Option<String>,
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_response(self) -> Result<T, ApiError> {
        match self.error_code {
            Some(code) if code != SUCCESS_CODE => {
                return Err(ApiError::Upstream {
                    code,
                    status: self.error_status.unwrap_or_default(),
                    message: self.message.unwrap_or_default(),
                });
            }
            _ => {}
        }
        self.response
            .ok_or_else(|| ApiError::InvalidResponse("missing Response".to_string()))
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
    envelope.into_response()
}

fn parse_envelope_error(body: &str) -> Option<ApiError> {
    serde_json::from_str::<Envelope<Value>>(body)
        .ok()
        .and_then(|envelope| envelope.into_response().err())
}

fn parse_manifest_index(body: &str) -> Result<String, ApiError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ManifestIndex {
        #[serde(default)]
        mobile_world_content_paths: BTreeMap<String, String>,
    }

    let index: ManifestIndex = parse_envelope(body)?;
    index
        .mobile_world_content_paths
        .get(MANIFEST_LOCALE)
        .cloned()
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!("no manifest for locale {MANIFEST_LOCALE}"))
        })
}

/// Parses a saved milestone feed, either as the full response envelope or
/// as the bare milestone map.
pub fn parse_milestones(body: &str) -> Result<Milestones, ApiError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
    let is_envelope = value
        .as_object()
        .is_some_and(|object| object.contains_key("Response") || object.contains_key("ErrorCode"));
    if is_envelope {
        let envelope: Envelope<Milestones> = serde_json::from_value(value)
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        return envelope.into_response();
    }
    serde_json::from_value(value).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}
