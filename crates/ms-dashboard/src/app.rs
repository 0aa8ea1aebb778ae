use crate::actions::{ActionOutcome, PendingAction, RowTarget};
use crate::interaction::{InteractionRequest, Modal};
use crate::poller::{PollEvent, PollOutcome};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ms_client::ApiVariant;
use ms_core::{Dashboard, RowEntry};
use ratatui::widgets::TableState;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

/// What the terminal loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    None,
    Quit,
    Refresh,
    Run(PendingAction),
}

pub struct App {
    pub dashboard: Dashboard,
    pub variant: ApiVariant,
    pub base_url: String,
    pub table_state: TableState,
    pub modal: Option<Modal>,
    queued: VecDeque<InteractionRequest>,
    /// Stream whose detail view is open.
    pub detail: Option<String>,
    pub help_open: bool,
    pub status_note: Option<String>,
    pub last_poll_error: Option<String>,
    pub polls_received: u64,
}

impl App {
    pub fn new(dashboard: Dashboard, variant: ApiVariant, base_url: String) -> Self {
        Self {
            dashboard,
            variant,
            base_url,
            table_state: TableState::default(),
            modal: None,
            queued: VecDeque::new(),
            detail: None,
            help_open: false,
            status_note: None,
            last_poll_error: None,
            polls_received: 0,
        }
    }

    pub fn apply_poll_event(&mut self, event: PollEvent, now: Instant) {
        self.polls_received = self.polls_received.saturating_add(1);
        match event.outcome {
            PollOutcome::Records(records) => {
                let report = self.dashboard.apply_poll(event.seq, records, now);
                if report.applied {
                    self.last_poll_error = None;
                    debug!(
                        event = "poll_applied",
                        seq = event.seq,
                        created = report.created,
                        updated = report.updated
                    );
                }
            }
            PollOutcome::Malformed(err) => {
                self.dashboard.apply_malformed(event.seq, &err);
                self.last_poll_error = Some(err.to_string());
            }
            PollOutcome::Failed(message) => {
                self.last_poll_error = Some(message);
            }
        }
        self.clamp_selection();
    }

    /// Returns `true` when the outcome asks for an immediate poll.
    pub fn apply_outcome(&mut self, outcome: ActionOutcome, now: Instant) -> bool {
        match outcome {
            ActionOutcome::Nothing => false,
            ActionOutcome::RefreshRequested => true,
            ActionOutcome::RowDeleted(name) => {
                self.dashboard.remove_row(&name);
                if self.detail.as_deref() == Some(name.as_str()) {
                    self.detail = None;
                }
                self.status_note = Some(format!("deleted {name}"));
                self.clamp_selection();
                false
            }
            ActionOutcome::RestartArmed(name) => {
                self.dashboard.arm_restart(&name, now);
                self.status_note = Some(format!("restart sent to {name}"));
                false
            }
        }
    }

    /// Shows a dialogue request, or queues it behind the open one.
    pub fn open_request(&mut self, request: InteractionRequest) {
        if self.modal.is_some() {
            self.queued.push_back(request);
        } else {
            self.modal = Some(Modal::open(request));
        }
    }

    fn close_modal(&mut self, accept: bool) {
        if let Some(modal) = self.modal.take() {
            if accept {
                modal.accept();
            } else {
                modal.cancel();
            }
        }
        self.modal = self.queued.pop_front().map(Modal::open);
    }

    pub fn selected_row(&self) -> Option<&RowEntry> {
        if self.dashboard.placeholder().is_some() {
            return None;
        }
        self.table_state
            .selected()
            .and_then(|index| self.dashboard.rows().at(index))
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.dashboard.rows().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn clamp_selection(&mut self) {
        let len = self.dashboard.rows().len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            None => self.table_state.select(Some(0)),
            Some(index) if index >= len => self.table_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    fn selected_target(&self) -> Option<RowTarget> {
        self.selected_row().map(|row| RowTarget {
            name: row.name().to_string(),
            toggle: row.actions.toggle,
            url: row.actions.edit_url.clone(),
            decoder: row.actions.edit_decoder.clone(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyCommand {
        if key.kind != KeyEventKind::Press {
            return KeyCommand::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyCommand::Quit;
        }
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return KeyCommand::None;
        }
        if self.detail.is_some() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('q')
            ) {
                self.detail = None;
            }
            return KeyCommand::None;
        }
        if matches!(key.code, KeyCode::Char('?') | KeyCode::F(1)) {
            self.help_open = !self.help_open;
            return KeyCommand::None;
        }
        if self.help_open {
            if key.code == KeyCode::Esc {
                self.help_open = false;
            }
            return KeyCommand::None;
        }

        match key.code {
            KeyCode::Char('q') => KeyCommand::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                KeyCommand::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                KeyCommand::None
            }
            KeyCode::Char('R') => KeyCommand::Refresh,
            KeyCode::Char('a') => KeyCommand::Run(PendingAction::Add),
            KeyCode::Enter | KeyCode::Char('i') => {
                if let Some(name) = self.selected_row().map(|row| row.name().to_string()) {
                    if self.dashboard.detail(&name).is_some() {
                        self.detail = Some(name);
                    }
                }
                KeyCommand::None
            }
            KeyCode::Char('s') => self.row_command(|target| {
                PendingAction::Toggle(target.name, target.toggle)
            }),
            KeyCode::Char('r') => self.row_command(|target| PendingAction::Restart(target.name)),
            KeyCode::Char('e') => self.row_command(PendingAction::Edit),
            KeyCode::Char('d') => self.row_command(|target| PendingAction::Delete(target.name)),
            _ => KeyCommand::None,
        }
    }

    fn row_command(&mut self, build: impl FnOnce(RowTarget) -> PendingAction) -> KeyCommand {
        match self.selected_target() {
            Some(target) => {
                let action = build(target);
                info!(event = "action_requested", action = action.label());
                KeyCommand::Run(action)
            }
            None => {
                self.status_note = Some("no stream selected".to_string());
                KeyCommand::None
            }
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let is_prompt = matches!(self.modal, Some(Modal::Prompt { .. }));
        let is_confirm = matches!(self.modal, Some(Modal::Confirm { .. }));
        match key.code {
            KeyCode::Esc => self.close_modal(false),
            KeyCode::Enter => self.close_modal(true),
            KeyCode::Char('y') | KeyCode::Char('Y') if is_confirm => self.close_modal(true),
            KeyCode::Char('n') | KeyCode::Char('N') if is_confirm => self.close_modal(false),
            KeyCode::Backspace if is_prompt => {
                if let Some(modal) = self.modal.as_mut() {
                    modal.backspace();
                }
            }
            KeyCode::Char(c) if is_prompt => {
                if let Some(modal) = self.modal.as_mut() {
                    modal.push_char(c);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::{HealthClass, PollError, PollOrdering, StreamStatus, Thresholds, ToggleAction};
    use tokio::sync::oneshot;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn status(name: &str, running: bool) -> StreamStatus {
        StreamStatus {
            name: name.to_string(),
            running,
            input_fps: 25.0,
            decode_fps: 25.0,
            bitrate_kbps: 4000,
            url: format!("udp://{name}"),
            ..StreamStatus::default()
        }
    }

    fn app_with_rows(names: &[&str]) -> App {
        let mut app = App::new(
            Dashboard::new(Thresholds::default(), PollOrdering::CompletionOrder),
            ApiVariant::Current,
            "http://127.0.0.1:8080".to_string(),
        );
        app.apply_poll_event(
            PollEvent {
                seq: 1,
                outcome: PollOutcome::Records(names.iter().map(|n| status(n, true)).collect()),
            },
            Instant::now(),
        );
        app
    }

    #[test]
    fn first_poll_selects_first_row() {
        let app = app_with_rows(&["a", "b"]);
        assert_eq!(app.selected_row().map(|r| r.name()), Some("a"));
        assert_eq!(app.polls_received, 1);
    }

    #[test]
    fn navigation_clamps_at_edges() {
        let mut app = app_with_rows(&["a", "b"]);
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.table_state.selected(), Some(0));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.table_state.selected(), Some(1));
    }

    #[test]
    fn row_keys_capture_latest_bindings() {
        let mut app = app_with_rows(&["a"]);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('s'))),
            KeyCommand::Run(PendingAction::Toggle("a".to_string(), ToggleAction::Stop))
        );

        app.apply_poll_event(
            PollEvent {
                seq: 2,
                outcome: PollOutcome::Records(vec![status("a", false)]),
            },
            Instant::now(),
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Char('s'))),
            KeyCommand::Run(PendingAction::Toggle("a".to_string(), ToggleAction::Start))
        );
        match app.handle_key(key(KeyCode::Char('e'))) {
            KeyCommand::Run(PendingAction::Edit(target)) => assert_eq!(target.url, "udp://a"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn row_keys_without_rows_set_note() {
        let mut app = app_with_rows(&[]);
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), KeyCommand::None);
        assert_eq!(app.status_note.as_deref(), Some("no stream selected"));
        assert_eq!(
            app.handle_key(key(KeyCode::Char('a'))),
            KeyCommand::Run(PendingAction::Add)
        );
    }

    #[test]
    fn info_opens_detail_and_escape_closes_it() {
        let mut app = app_with_rows(&["a"]);
        app.handle_key(key(KeyCode::Char('i')));
        assert_eq!(app.detail.as_deref(), Some("a"));
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), KeyCommand::None);
        assert!(app.detail.is_none());
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), KeyCommand::Quit);
    }

    #[test]
    fn modal_swallows_row_keys_and_answers_prompt() {
        let mut app = app_with_rows(&["a"]);
        let (reply, mut answer) = oneshot::channel();
        app.open_request(InteractionRequest::Prompt {
            message: "Channel name:".to_string(),
            default: None,
            reply,
        });

        for c in ['d', 'q'] {
            assert_eq!(app.handle_key(key(KeyCode::Char(c))), KeyCommand::None);
        }
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Enter));

        assert!(app.modal.is_none());
        assert_eq!(answer.try_recv().expect("answered"), Some("dx".to_string()));
    }

    #[test]
    fn queued_requests_open_in_order() {
        let mut app = app_with_rows(&[]);
        let (confirm_tx, mut confirm_rx) = oneshot::channel();
        let (notify_tx, mut notify_rx) = oneshot::channel();
        app.open_request(InteractionRequest::Confirm {
            message: "Delete \"a\"?".to_string(),
            reply: confirm_tx,
        });
        app.open_request(InteractionRequest::Notify {
            message: "Add failed".to_string(),
            reply: notify_tx,
        });

        app.handle_key(key(KeyCode::Char('y')));
        assert!(confirm_rx.try_recv().expect("confirmed"));
        assert_eq!(app.modal.as_ref().map(Modal::message), Some("Add failed"));
        app.handle_key(key(KeyCode::Esc));
        assert!(notify_rx.try_recv().is_ok());
        assert!(app.modal.is_none());
    }

    #[test]
    fn outcomes_update_dashboard() {
        let mut app = app_with_rows(&["a", "b"]);
        let now = Instant::now();
        app.table_state.select(Some(1));

        assert!(app.apply_outcome(ActionOutcome::RefreshRequested, now));
        assert!(!app.apply_outcome(ActionOutcome::RowDeleted("b".to_string()), now));
        assert_eq!(app.dashboard.rows().len(), 1);
        assert_eq!(app.table_state.selected(), Some(0));

        app.apply_outcome(ActionOutcome::RestartArmed("a".to_string()), now);
        app.apply_poll_event(
            PollEvent {
                seq: 2,
                outcome: PollOutcome::Records(vec![status("a", true)]),
            },
            now,
        );
        assert_eq!(
            app.dashboard.rows().get("a").map(|r| r.health),
            Some(HealthClass::Restarting)
        );
    }

    #[test]
    fn poll_errors_are_recorded_without_touching_rows() {
        let mut app = app_with_rows(&["a"]);
        app.apply_poll_event(
            PollEvent {
                seq: 2,
                outcome: PollOutcome::Failed("unexpected status 503".to_string()),
            },
            Instant::now(),
        );
        assert_eq!(app.last_poll_error.as_deref(), Some("unexpected status 503"));
        assert!(app.dashboard.placeholder().is_none());

        app.apply_poll_event(
            PollEvent {
                seq: 3,
                outcome: PollOutcome::Malformed(PollError::NotAnArray("object")),
            },
            Instant::now(),
        );
        assert!(app.dashboard.placeholder().is_some());
        assert!(app.selected_row().is_none());
        assert_eq!(app.dashboard.rows().len(), 1);
    }
}
