use clap::Parser;
use ms_client::ApiVariant;
use ms_core::{PollOrdering, ThresholdError, Thresholds};
use serde::Deserialize;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("base_url must not be empty")]
    EmptyBaseUrl,
    #[error("poll_interval_ms must be at least 100, got {0}")]
    PollInterval(u64),
    #[error("request_timeout_ms must be positive")]
    RequestTimeout,
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
}

/// Which control API to talk to. `Auto` defers to the startup probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Auto,
    Current,
    Legacy,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Auto => "auto",
            ApiMode::Current => "current",
            ApiMode::Legacy => "legacy",
        }
    }

    /// The forced variant, or `None` when the probe should decide.
    pub fn forced(&self) -> Option<ApiVariant> {
        match self {
            ApiMode::Auto => None,
            ApiMode::Current => Some(ApiVariant::Current),
            ApiMode::Legacy => Some(ApiVariant::Legacy),
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "auto" | "probe" => Ok(ApiMode::Auto),
            other => other
                .parse::<ApiVariant>()
                .map(|variant| match variant {
                    ApiVariant::Current => ApiMode::Current,
                    ApiVariant::Legacy => ApiMode::Legacy,
                })
                .map_err(|_| format!("Unknown api mode: {other} (expected auto, current or legacy)")),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "ms-dashboard",
    about = "Terminal dashboard for monitoring and controlling multiscreen streams"
)]
pub struct Args {
    /// Base URL of the stream service.
    #[arg(long, env = "MS_BASE_URL")]
    pub base_url: Option<String>,
    #[arg(long, env = "MS_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,
    #[arg(long, env = "MS_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
    /// auto, current or legacy.
    #[arg(long, env = "MS_API")]
    pub api: Option<ApiMode>,
    /// Ignore poll responses that complete after a newer one.
    #[arg(
        long,
        env = "MS_DROP_STALE_POLLS",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_bool_arg
    )]
    pub drop_stale_polls: Option<bool>,
    #[arg(long, env = "MS_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "MS_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Optional TOML settings, below flags and environment in precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub api: Option<ApiMode>,
    pub drop_stale_polls: Option<bool>,
    pub thresholds: Thresholds,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub api: ApiMode,
    pub ordering: PollOrdering,
    pub thresholds: Thresholds,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn resolve(args: Args) -> Result<Self, ConfigError> {
        let file = match args.config.as_deref() {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let base_url = args
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .to_string();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let poll_interval_ms = args
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::PollInterval(poll_interval_ms));
        }

        let request_timeout_ms = args
            .request_timeout_ms
            .or(file.request_timeout_ms)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        if request_timeout_ms == 0 {
            return Err(ConfigError::RequestTimeout);
        }

        let drop_stale = args
            .drop_stale_polls
            .or(file.drop_stale_polls)
            .unwrap_or(false);

        file.thresholds.validate()?;

        Ok(Self {
            base_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            api: args.api.or(file.api).unwrap_or_default(),
            ordering: if drop_stale {
                PollOrdering::DropStale
            } else {
                PollOrdering::CompletionOrder
            },
            thresholds: file.thresholds,
            log_file: args.log_file,
        })
    }
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool_flag(value).ok_or_else(|| format!("expected a boolean, got {value:?}"))
}
