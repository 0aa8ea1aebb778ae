use crate::model::{StatusHint, StreamStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("thresholds.fps.{field} must be in (0, 1], got {value}")]
    RatioOutOfRange { field: &'static str, value: f64 },
    #[error("thresholds.fps.crit_ratio ({crit}) must not exceed warn_ratio ({warn})")]
    RatioOrder { crit: f64, warn: f64 },
    #[error("thresholds.bitrate.{field} must be positive")]
    ZeroBitrate { field: &'static str },
    #[error("thresholds.bitrate.crit_kbps ({crit}) must not exceed warn_kbps ({warn})")]
    BitrateOrder { crit: u64, warn: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FpsThresholds {
    pub warn_ratio: f64,
    pub crit_ratio: f64,
}

impl Default for FpsThresholds {
    fn default() -> Self {
        Self {
            warn_ratio: 0.70,
            crit_ratio: 0.40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitrateThresholds {
    pub warn_kbps: u64,
    pub crit_kbps: u64,
}

impl Default for BitrateThresholds {
    fn default() -> Self {
        Self {
            warn_kbps: 300,
            crit_kbps: 100,
        }
    }
}

/// Process-wide classification limits. Fixed once the dashboard starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub fps: FpsThresholds,
    pub bitrate: BitrateThresholds,
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (field, value) in [
            ("warn_ratio", self.fps.warn_ratio),
            ("crit_ratio", self.fps.crit_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ThresholdError::RatioOutOfRange { field, value });
            }
        }
        if self.fps.crit_ratio > self.fps.warn_ratio {
            return Err(ThresholdError::RatioOrder {
                crit: self.fps.crit_ratio,
                warn: self.fps.warn_ratio,
            });
        }
        if self.bitrate.warn_kbps == 0 {
            return Err(ThresholdError::ZeroBitrate { field: "warn_kbps" });
        }
        if self.bitrate.crit_kbps == 0 {
            return Err(ThresholdError::ZeroBitrate { field: "crit_kbps" });
        }
        if self.bitrate.crit_kbps > self.bitrate.warn_kbps {
            return Err(ThresholdError::BitrateOrder {
                crit: self.bitrate.crit_kbps,
                warn: self.bitrate.warn_kbps,
            });
        }
        Ok(())
    }
}

/// Visual state of one row. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthClass {
    Dead,
    Restarting,
    Critical,
    Warning,
    Running,
    #[default]
    Idle,
}

impl HealthClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthClass::Dead => "dead",
            HealthClass::Restarting => "restarting",
            HealthClass::Critical => "crit",
            HealthClass::Warning => "warn",
            HealthClass::Running => "running",
            HealthClass::Idle => "idle",
        }
    }
}

impl fmt::Display for HealthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies one stream. Priority: dead, restarting, critical, warning,
/// running, idle.
///
/// `restart_until` is the stream's restart grace expiry, if one was ever armed.
pub fn classify(
    status: &StreamStatus,
    thresholds: &Thresholds,
    restart_until: Option<Instant>,
    now: Instant,
) -> HealthClass {
    let bitrate = status.bitrate_kbps;
    let dead = status.running
        && status.input_fps <= 0.0
        && status.decode_fps <= 0.0
        && bitrate == 0;
    if dead {
        return HealthClass::Dead;
    }

    if restart_until.is_some_and(|until| now < until) {
        return HealthClass::Restarting;
    }

    let ratio = status.fps_ratio();
    let hint = status.status_hint();
    let critical = ratio <= thresholds.fps.crit_ratio
        || bitrate <= thresholds.bitrate.crit_kbps
        || hint == Some(StatusHint::Crit);
    if critical {
        return HealthClass::Critical;
    }

    let warning = ratio <= thresholds.fps.warn_ratio
        || bitrate <= thresholds.bitrate.warn_kbps
        || hint == Some(StatusHint::Warn);
    if warning {
        return HealthClass::Warning;
    }

    if status.running {
        HealthClass::Running
    } else {
        HealthClass::Idle
    }
}
