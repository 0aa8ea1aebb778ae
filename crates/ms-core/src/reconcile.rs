use crate::detail::{DetailSnapshots, DetailView};
use crate::grace::RestartGrace;
use crate::health::{classify, HealthClass, Thresholds};
use crate::model::{format_fps, running_label, StreamStatus};
use crate::poll::{PollError, PollOrdering, PollSequencer};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const ROW_COLUMNS: [&str; 13] = [
    "#", "Name", "Running", "In FPS", "Dec FPS", "Rnd FPS", "kbps", "V kbps", "A kbps", "Rate",
    "CC", "Decoder", "Last error",
];

pub const BAD_JSON_PLACEHOLDER: &str = "Bad JSON";

/// Which run-state command the row's start/stop action issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Start,
    Stop,
}

impl ToggleAction {
    pub fn for_running(running: bool) -> Self {
        if running {
            ToggleAction::Stop
        } else {
            ToggleAction::Start
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToggleAction::Start => "Start",
            ToggleAction::Stop => "Stop",
        }
    }
}

/// Action bindings for one row, re-wired from the newest status every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowActions {
    pub toggle: ToggleAction,
    pub edit_url: String,
    pub edit_decoder: String,
}

impl RowActions {
    fn wire(status: &StreamStatus) -> Self {
        Self {
            toggle: ToggleAction::for_running(status.running),
            edit_url: status.url.clone(),
            edit_decoder: status.decoder.clone(),
        }
    }
}

/// Rendered cells of one row, in `ROW_COLUMNS` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub cells: [String; 13],
    pub cc_alert: bool,
}

impl RowView {
    fn render(index: usize, status: &StreamStatus) -> Self {
        let mut view = Self {
            cells: Default::default(),
            cc_alert: false,
        };
        view.refresh(index, status);
        view
    }

    fn refresh(&mut self, index: usize, s: &StreamStatus) {
        let values = [
            index.to_string(),
            s.name.clone(),
            running_label(s.running).to_string(),
            format_fps(s.input_fps),
            format_fps(s.decode_fps),
            format_fps(s.render_fps),
            s.bitrate_kbps.to_string(),
            s.video_kbps.to_string(),
            s.audio_kbps.to_string(),
            s.rate_mode.clone(),
            s.cc_errors.to_string(),
            s.decoder.clone(),
            s.last_error.clone(),
        ];
        for (cell, value) in self.cells.iter_mut().zip(values) {
            if *cell != value {
                *cell = value;
            }
        }
        self.cc_alert = s.cc_errors > 0;
    }
}

#[derive(Debug, Clone)]
pub struct RowEntry {
    pub index: usize,
    pub status: StreamStatus,
    pub health: HealthClass,
    pub view: RowView,
    pub actions: RowActions,
}

impl RowEntry {
    pub fn name(&self) -> &str {
        &self.status.name
    }
}

/// Rows in first-seen order. Never reordered, never pruned on absence.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    order: Vec<String>,
    entries: HashMap<String, RowEntry>,
}

impl RowTable {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RowEntry> {
        self.entries.get(name)
    }

    pub fn at(&self, position: usize) -> Option<&RowEntry> {
        self.order
            .get(position)
            .and_then(|name| self.entries.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    fn remove(&mut self, name: &str) -> Option<RowEntry> {
        let entry = self.entries.remove(name)?;
        self.order.retain(|n| n != name);
        Some(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    pub applied: bool,
    pub created: usize,
    pub updated: usize,
}

/// Session state for the dashboard: row table, restart grace and detail
/// snapshots, plus the fixed thresholds used to classify rows.
///
/// The owner is expected to serialize every call; nothing here is shared.
#[derive(Debug, Clone)]
pub struct Dashboard {
    thresholds: Thresholds,
    rows: RowTable,
    grace: RestartGrace,
    details: DetailSnapshots,
    sequencer: PollSequencer,
    placeholder: Option<String>,
    polls_applied: u64,
}

impl Dashboard {
    pub fn new(thresholds: Thresholds, ordering: PollOrdering) -> Self {
        Self {
            thresholds,
            rows: RowTable::default(),
            grace: RestartGrace::new(),
            details: DetailSnapshots::new(),
            sequencer: PollSequencer::new(ordering),
            placeholder: None,
            polls_applied: 0,
        }
    }

    pub fn rows(&self) -> &RowTable {
        &self.rows
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn polls_applied(&self) -> u64 {
        self.polls_applied
    }

    /// Merges one well-formed poll response into the table.
    ///
    /// Each record either creates a row at the end of the table or updates
    /// its existing row in place. Rows missing from `records` are untouched.
    pub fn apply_poll(&mut self, seq: u64, records: Vec<StreamStatus>, now: Instant) -> PollReport {
        if !self.sequencer.admit(seq) {
            debug!(event = "poll_dropped_stale", seq);
            return PollReport::default();
        }
        self.placeholder = None;
        self.polls_applied = self.polls_applied.saturating_add(1);

        let mut report = PollReport {
            applied: true,
            ..PollReport::default()
        };
        for (offset, status) in records.into_iter().enumerate() {
            let index = offset + 1;
            self.details.record(&status);
            let restart_until = self.grace.expiry(&status.name);
            let health = classify(&status, &self.thresholds, restart_until, now);

            match self.rows.entries.get_mut(&status.name) {
                Some(entry) => {
                    entry.view.refresh(index, &status);
                    entry.actions = RowActions::wire(&status);
                    entry.index = index;
                    entry.health = health;
                    entry.status = status;
                    report.updated += 1;
                }
                None => {
                    let name = status.name.clone();
                    let entry = RowEntry {
                        index,
                        view: RowView::render(index, &status),
                        actions: RowActions::wire(&status),
                        health,
                        status,
                    };
                    info!(event = "row_created", name = %name, index);
                    self.rows.order.push(name.clone());
                    self.rows.entries.insert(name, entry);
                    report.created += 1;
                }
            }
        }
        report
    }

    /// Handles a response whose body was not a stream list. Returns `true`
    /// when this is the first such response and the placeholder was shown.
    pub fn apply_malformed(&mut self, seq: u64, err: &PollError) -> bool {
        if !self.sequencer.admit(seq) {
            debug!(event = "poll_dropped_stale", seq);
            return false;
        }
        warn!(event = "poll_malformed", seq, error = %err);
        if self.placeholder.is_some() {
            return false;
        }
        self.placeholder = Some(BAD_JSON_PLACEHOLDER.to_string());
        true
    }

    /// Arms the restart grace window after a successful restart command.
    pub fn arm_restart(&mut self, name: &str, now: Instant) {
        let until = self.grace.arm(name, now);
        debug!(
            event = "restart_grace_armed",
            name,
            remaining_ms = until.saturating_duration_since(now).as_millis() as u64
        );
    }

    /// Drops a row after its delete command succeeded.
    pub fn remove_row(&mut self, name: &str) -> bool {
        self.details.remove(name);
        let removed = self.rows.remove(name).is_some();
        if removed {
            info!(event = "row_removed", name);
        }
        removed
    }

    pub fn detail(&self, name: &str) -> Option<DetailView> {
        self.details.view(name)
    }
}
