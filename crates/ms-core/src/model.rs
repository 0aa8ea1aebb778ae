use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One remote channel as reported by `GET /api/streams`.
///
/// The service is loose about types (numbers may be null, strings, or reals
/// where integers are expected), so every field except `name` tolerates
/// missing or oddly typed input and falls back to zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub running: bool,
    #[serde(default, deserialize_with = "deserialize_lenient_fps")]
    pub input_fps: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_fps")]
    pub decode_fps: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_fps")]
    pub render_fps: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub bitrate_kbps: u64,
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub video_kbps: u64,
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub audio_kbps: u64,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub rate_mode: String,
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub cc_errors: u64,
    /// Raw watchdog hint as sent; see [`StreamStatus::status_hint`].
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub decoder: String,
    #[serde(default, deserialize_with = "deserialize_lenient_pid")]
    pub sid: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_pid")]
    pub pmt_pid: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_pid")]
    pub pcr_pid: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_pid")]
    pub video_pid: i64,
    #[serde(default, deserialize_with = "deserialize_audio_pids")]
    pub audio_pids: Vec<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub service_name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub last_error: String,
}

/// Health hint computed by the service's own watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusHint {
    Ok,
    Warn,
    Crit,
}

impl StatusHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusHint::Ok => "ok",
            StatusHint::Warn => "warn",
            StatusHint::Crit => "crit",
        }
    }
}

impl fmt::Display for StatusHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusHint {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "ok" => Ok(StatusHint::Ok),
            "warn" => Ok(StatusHint::Warn),
            "crit" => Ok(StatusHint::Crit),
            other => Err(format!("Unknown status hint: {other}")),
        }
    }
}

impl StreamStatus {
    /// The watchdog hint, matched exactly; any other value carries no hint.
    pub fn status_hint(&self) -> Option<StatusHint> {
        self.status.parse().ok()
    }

    /// Decode-to-input frame rate ratio; 1.0 when the input rate is unknown.
    pub fn fps_ratio(&self) -> f64 {
        if self.input_fps > 0.0 {
            self.decode_fps / self.input_fps
        } else {
            1.0
        }
    }

    pub fn audio_pids_label(&self) -> String {
        self.audio_pids
            .iter()
            .map(|pid| pid.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Frame rates render with one decimal, like the rest of the dashboard.
pub fn format_fps(value: f64) -> String {
    format!("{value:.1}")
}

pub fn running_label(running: bool) -> &'static str {
    if running {
        "true"
    } else {
        "false"
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn deserialize_lenient_fps<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).unwrap_or(0.0).max(0.0))
}

fn deserialize_lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let v = value_as_f64(&value).unwrap_or(0.0).trunc();
    Ok(if v <= 0.0 { 0 } else { v as u64 })
}

fn deserialize_lenient_pid<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    Ok(value_as_f64(&value).map(|v| v.trunc() as i64).unwrap_or(0))
}

fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    // Only a literal `true` counts as running.
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn deserialize_audio_pids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let pids = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_i64().or_else(|| value_as_f64(item).map(|v| v as i64)))
            .collect(),
        Value::String(s) => s
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect(),
        Value::Number(n) => n.as_i64().into_iter().collect(),
        _ => Vec::new(),
    };
    Ok(pids)
}
