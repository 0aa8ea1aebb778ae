use crate::StreamApiClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Shape of the control API exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVariant {
    /// Fixed `/api/stream/<verb>` paths with the name in a JSON body.
    Current,
    /// Per-resource `/api/streams/<name>[/<verb>]` paths.
    Legacy,
}

impl ApiVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVariant::Current => "current",
            ApiVariant::Legacy => "legacy",
        }
    }
}

impl fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVariant {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "current" | "new" => Ok(ApiVariant::Current),
            "legacy" | "old" => Ok(ApiVariant::Legacy),
            other => Err(format!("Unknown api variant: {other}")),
        }
    }
}

/// Decides once which API variant the service speaks.
///
/// A successful `GET /api/settings` means the current API; any failure,
/// including a transport error, falls back to legacy. The answer is meant to
/// be kept for the whole session.
pub async fn probe_api_variant(client: &StreamApiClient) -> ApiVariant {
    match client.get_uncached(&["api", "settings"]).send().await {
        Ok(response) if response.status().is_success() => {
            info!(event = "api_probe", variant = "current", status = response.status().as_u16());
            ApiVariant::Current
        }
        Ok(response) => {
            info!(event = "api_probe", variant = "legacy", status = response.status().as_u16());
            ApiVariant::Legacy
        }
        Err(err) => {
            warn!(event = "api_probe", variant = "legacy", error = %err);
            ApiVariant::Legacy
        }
    }
}
