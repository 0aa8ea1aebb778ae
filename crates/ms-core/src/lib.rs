//! Client-side state for the multiscreen stream dashboard: the stream status
//! model, health classification, restart grace tracking, detail snapshots and
//! the reconciliation of poll responses into a stable row table.

pub mod detail;
pub mod grace;
pub mod health;
pub mod model;
pub mod poll;
pub mod reconcile;

pub use detail::{DetailSnapshots, DetailView};
pub use grace::{RestartGrace, RESTART_GRACE};
pub use health::{classify, BitrateThresholds, FpsThresholds, HealthClass, ThresholdError, Thresholds};
pub use model::{StatusHint, StreamStatus};
pub use poll::{parse_poll_body, PollError, PollOrdering, PollSequencer};
pub use reconcile::{
    Dashboard, PollReport, RowActions, RowEntry, RowTable, RowView, ToggleAction,
    BAD_JSON_PLACEHOLDER, ROW_COLUMNS,
};
