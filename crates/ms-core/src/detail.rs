use crate::model::{format_fps, running_label, StreamStatus};
use std::collections::HashMap;

/// Latest full record per stream, read by the detail view.
///
/// Independent of the row table: every poll overwrites the record for each
/// name it contains, and the detail view never fetches on its own.
#[derive(Debug, Clone, Default)]
pub struct DetailSnapshots {
    latest: HashMap<String, StreamStatus>,
}

impl DetailSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: &StreamStatus) {
        self.latest.insert(status.name.clone(), status.clone());
    }

    pub fn get(&self, name: &str) -> Option<&StreamStatus> {
        self.latest.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<StreamStatus> {
        self.latest.remove(name)
    }

    /// Label/value pairs for the detail view, or `None` when the stream has
    /// never been observed.
    pub fn view(&self, name: &str) -> Option<DetailView> {
        self.get(name).map(DetailView::from_status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub fields: Vec<(&'static str, String)>,
}

impl DetailView {
    pub fn from_status(s: &StreamStatus) -> Self {
        let status = if s.status.is_empty() {
            "ok".to_string()
        } else {
            s.status.clone()
        };
        let raw = vec![
            ("Name", s.name.clone()),
            ("Service", s.service_name.clone()),
            ("URL", s.url.clone()),
            ("Running", running_label(s.running).to_string()),
            ("Decoder", s.decoder.clone()),
            ("Input FPS", format_fps(s.input_fps)),
            ("Decode FPS", format_fps(s.decode_fps)),
            ("FPS ratio", format!("{:.2}", s.fps_ratio())),
            ("Render FPS", format_fps(s.render_fps)),
            ("Bitrate kbps", s.bitrate_kbps.to_string()),
            ("Video kbps", s.video_kbps.to_string()),
            ("Audio kbps", s.audio_kbps.to_string()),
            ("Rate mode", s.rate_mode.clone()),
            ("CC errors", s.cc_errors.to_string()),
            ("SID", s.sid.to_string()),
            ("PMT", s.pmt_pid.to_string()),
            ("PCR", s.pcr_pid.to_string()),
            ("Video PID", s.video_pid.to_string()),
            ("Audio PIDs", s.audio_pids_label()),
            ("Status", status),
            ("Last error", s.last_error.clone()),
        ];
        let fields = raw
            .into_iter()
            .map(|(label, value)| {
                if value.trim().is_empty() {
                    (label, "-".to_string())
                } else {
                    (label, value)
                }
            })
            .collect();
        Self {
            title: format!("Stream: {}", s.name),
            fields,
        }
    }

    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, value)| value.as_str())
    }
}
