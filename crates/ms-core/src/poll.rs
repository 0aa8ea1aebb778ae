use crate::model::StreamStatus;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("poll response is not a JSON array (got {0})")]
    NotAnArray(&'static str),
}

/// How overlapping poll responses are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollOrdering {
    /// Apply every response in completion order, even a late older one.
    #[default]
    CompletionOrder,
    /// Drop a response unless it is newer than the last one applied.
    DropStale,
}

/// Tracks the sequence numbers of applied poll responses.
#[derive(Debug, Clone, Default)]
pub struct PollSequencer {
    ordering: PollOrdering,
    last_applied: Option<u64>,
}

impl PollSequencer {
    pub fn new(ordering: PollOrdering) -> Self {
        Self {
            ordering,
            last_applied: None,
        }
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Returns whether the response tagged `seq` may be applied, and records
    /// it as applied when it may.
    pub fn admit(&mut self, seq: u64) -> bool {
        if self.ordering == PollOrdering::DropStale
            && self.last_applied.is_some_and(|last| seq <= last)
        {
            return false;
        }
        self.last_applied = Some(match self.last_applied {
            Some(last) => last.max(seq),
            None => seq,
        });
        true
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Turns a `GET /api/streams` body into records, keeping response order.
///
/// A non-array body is an error. Individual entries that cannot be decoded
/// (no usable `name`) are skipped with a warning so one bad record does not
/// hide the rest of the table.
pub fn parse_poll_body(body: Value) -> Result<Vec<StreamStatus>, PollError> {
    let Value::Array(items) = body else {
        return Err(PollError::NotAnArray(value_kind(&body)));
    };
    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<StreamStatus>(item) {
            Ok(status) if !status.name.trim().is_empty() => records.push(status),
            Ok(_) => {
                warn!(event = "poll_record_skipped", position, reason = "empty name");
            }
            Err(err) => {
                warn!(event = "poll_record_skipped", position, error = %err);
            }
        }
    }
    Ok(records)
}
