//! HTTP access to the stream service: status polling, the one-shot API
//! capability probe, and the command facade over both API variants.

pub mod commands;
pub mod probe;

pub use commands::{CommandFacade, Route, StreamCommand, StreamControl};
pub use probe::{probe_api_variant, ApiVariant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {path}")]
    Status { status: u16, path: String },
    #[error("response from {path} is not JSON: {reason}")]
    Decode { path: String, reason: String },
}

/// Thin wrapper over `reqwest::Client` rooted at the service base URL.
#[derive(Debug, Clone)]
pub struct StreamApiClient {
    http: reqwest::Client,
    base: Url,
}

impl StreamApiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim()).map_err(|err| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("multiscreen-dashboard"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout.max(Duration::from_millis(1)))
            .build()?;

        Ok(Self { http, base })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments.iter().map(|segment| segment.as_ref()));
        }
        url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Cache-bypassing GET, as used by the probe and the poller.
    pub(crate) fn get_uncached(&self, segments: &[&str]) -> reqwest::RequestBuilder {
        self.http
            .get(self.endpoint(segments))
            .header(CACHE_CONTROL, "no-store")
    }

    /// Fetches the raw `GET /api/streams` body.
    ///
    /// Transport errors, non-success statuses and non-JSON bodies are errors;
    /// whether the JSON is actually a stream list is left to the caller.
    pub async fn fetch_streams(&self) -> Result<Value, ClientError> {
        let path = "/api/streams";
        let response = self.get_uncached(&["api", "streams"]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }
}
