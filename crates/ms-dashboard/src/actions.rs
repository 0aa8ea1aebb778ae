use crate::interaction::Interaction;
use ms_client::StreamControl;
use ms_core::ToggleAction;
use tracing::info;

pub const DECODER_PROMPT: &str = "Decoder (auto/cpu/cuda/dxva2):";
pub const DEFAULT_DECODER: &str = "auto";

/// What the terminal loop should do once a flow finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Nothing,
    RefreshRequested,
    RowDeleted(String),
    RestartArmed(String),
}

/// Row bindings captured when the operator triggered the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTarget {
    pub name: String,
    pub toggle: ToggleAction,
    pub url: String,
    pub decoder: String,
}

/// A flow requested from the keyboard, run off the terminal loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Add,
    Edit(RowTarget),
    Delete(String),
    Toggle(String, ToggleAction),
    Restart(String),
}

impl PendingAction {
    pub fn label(&self) -> &'static str {
        match self {
            PendingAction::Add => "add",
            PendingAction::Edit(_) => "edit",
            PendingAction::Delete(_) => "delete",
            PendingAction::Toggle(_, ToggleAction::Start) => "start",
            PendingAction::Toggle(_, ToggleAction::Stop) => "stop",
            PendingAction::Restart(_) => "restart",
        }
    }
}

pub async fn run_action<I, C>(action: PendingAction, ui: &I, control: &C) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    match action {
        PendingAction::Add => add_stream(ui, control).await,
        PendingAction::Edit(target) => edit_stream(ui, control, &target).await,
        PendingAction::Delete(name) => delete_stream(ui, control, &name).await,
        PendingAction::Toggle(name, toggle) => toggle_stream(ui, control, &name, toggle).await,
        PendingAction::Restart(name) => restart_stream(ui, control, &name).await,
    }
}

fn non_empty(answer: Option<String>) -> Option<String> {
    answer.filter(|value| !value.trim().is_empty())
}

async fn ask_decoder<I: Interaction + ?Sized>(ui: &I, current: &str) -> String {
    let default = if current.is_empty() {
        DEFAULT_DECODER
    } else {
        current
    };
    match non_empty(ui.prompt(DECODER_PROMPT, Some(default)).await) {
        Some(decoder) => decoder.trim().to_string(),
        None => DEFAULT_DECODER.to_string(),
    }
}

pub async fn add_stream<I, C>(ui: &I, control: &C) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    let Some(name) = non_empty(ui.prompt("Channel name:", None).await) else {
        return ActionOutcome::Nothing;
    };
    let Some(url) = non_empty(ui.prompt("Channel URL:", None).await) else {
        return ActionOutcome::Nothing;
    };
    let decoder = ask_decoder(ui, DEFAULT_DECODER).await;
    let name = name.trim();
    if control.add(name, url.trim(), &decoder).await {
        info!(event = "stream_added", name, decoder = %decoder);
    } else {
        ui.notify("Add failed").await;
    }
    ActionOutcome::RefreshRequested
}

pub async fn edit_stream<I, C>(ui: &I, control: &C, target: &RowTarget) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    let message = format!("New URL for \"{}\":", target.name);
    let Some(url) = non_empty(ui.prompt(&message, Some(&target.url)).await) else {
        return ActionOutcome::Nothing;
    };
    let decoder = ask_decoder(ui, &target.decoder).await;
    if control.add(&target.name, url.trim(), &decoder).await {
        info!(event = "stream_edited", name = %target.name, decoder = %decoder);
    } else {
        ui.notify("Edit failed").await;
    }
    ActionOutcome::RefreshRequested
}

pub async fn delete_stream<I, C>(ui: &I, control: &C, name: &str) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    if !ui.confirm(&format!("Delete \"{name}\"?")).await {
        return ActionOutcome::Nothing;
    }
    if control.delete(name).await {
        ActionOutcome::RowDeleted(name.to_string())
    } else {
        ui.notify("Delete failed").await;
        ActionOutcome::Nothing
    }
}

pub async fn toggle_stream<I, C>(ui: &I, control: &C, name: &str, toggle: ToggleAction) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    let ok = match toggle {
        ToggleAction::Stop => control.stop(name).await,
        ToggleAction::Start => control.start(name).await,
    };
    if !ok {
        ui.notify(&format!("{} failed", toggle.label())).await;
    }
    ActionOutcome::Nothing
}

pub async fn restart_stream<I, C>(ui: &I, control: &C, name: &str) -> ActionOutcome
where
    I: Interaction + ?Sized,
    C: StreamControl + ?Sized,
{
    if control.restart(name).await {
        ActionOutcome::RestartArmed(name.to_string())
    } else {
        ui.notify("Restart failed").await;
        ActionOutcome::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedUi {
        answers: Mutex<VecDeque<Option<String>>>,
        confirm: bool,
        prompts: Mutex<Vec<(String, Option<String>)>>,
        notices: Mutex<Vec<String>>,
    }

    impl ScriptedUi {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
                ..Self::default()
            }
        }

        fn notices(&self) -> Vec<String> {
            self.notices.lock().expect("lock").clone()
        }

        fn prompts(&self) -> Vec<(String, Option<String>)> {
            self.prompts.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Interaction for ScriptedUi {
        async fn prompt(&self, message: &str, default: Option<&str>) -> Option<String> {
            self.prompts
                .lock()
                .expect("lock")
                .push((message.to_string(), default.map(str::to_string)));
            self.answers.lock().expect("lock").pop_front().flatten()
        }

        async fn confirm(&self, _message: &str) -> bool {
            self.confirm
        }

        async fn notify(&self, message: &str) {
            self.notices.lock().expect("lock").push(message.to_string());
        }
    }

    #[derive(Default)]
    struct FakeControl {
        succeed: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeControl {
        fn ok() -> Self {
            Self {
                succeed: true,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn record(&self, call: String) -> bool {
            self.calls.lock().expect("lock").push(call);
            self.succeed
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl StreamControl for FakeControl {
        async fn add(&self, name: &str, url: &str, decoder: &str) -> bool {
            self.record(format!("add {name} {url} {decoder}"))
        }

        async fn delete(&self, name: &str) -> bool {
            self.record(format!("delete {name}"))
        }

        async fn start(&self, name: &str) -> bool {
            self.record(format!("start {name}"))
        }

        async fn stop(&self, name: &str) -> bool {
            self.record(format!("stop {name}"))
        }

        async fn restart(&self, name: &str) -> bool {
            self.record(format!("restart {name}"))
        }
    }

    fn target() -> RowTarget {
        RowTarget {
            name: "ch1".to_string(),
            toggle: ToggleAction::Stop,
            url: "udp://239.0.0.1:1234".to_string(),
            decoder: String::new(),
        }
    }

    #[tokio::test]
    async fn add_trims_inputs_and_requests_refresh() {
        let ui = ScriptedUi::answering(&[Some("  ch9 "), Some(" udp://x "), Some("cuda")]);
        let control = FakeControl::ok();

        let outcome = add_stream(&ui, &control).await;
        assert_eq!(outcome, ActionOutcome::RefreshRequested);
        assert_eq!(control.calls(), vec!["add ch9 udp://x cuda"]);
        assert_eq!(
            ui.prompts()[2],
            (DECODER_PROMPT.to_string(), Some("auto".to_string()))
        );
        assert!(ui.notices().is_empty());
    }

    #[tokio::test]
    async fn add_cancelled_at_url_sends_nothing() {
        let ui = ScriptedUi::answering(&[Some("ch9"), None]);
        let control = FakeControl::ok();

        assert_eq!(add_stream(&ui, &control).await, ActionOutcome::Nothing);
        assert!(control.calls().is_empty());
    }

    #[tokio::test]
    async fn add_with_cancelled_decoder_uses_auto_and_reports_failure() {
        let ui = ScriptedUi::answering(&[Some("ch9"), Some("udp://x"), None]);
        let control = FakeControl::failing();

        assert_eq!(add_stream(&ui, &control).await, ActionOutcome::RefreshRequested);
        assert_eq!(control.calls(), vec!["add ch9 udp://x auto"]);
        assert_eq!(ui.notices(), vec!["Add failed"]);
    }

    #[tokio::test]
    async fn edit_prefills_current_url_and_decoder_default() {
        let ui = ScriptedUi::answering(&[Some("udp://new "), Some("")]);
        let control = FakeControl::ok();

        let outcome = edit_stream(&ui, &control, &target()).await;
        assert_eq!(outcome, ActionOutcome::RefreshRequested);
        assert_eq!(control.calls(), vec!["add ch1 udp://new auto"]);
        assert_eq!(
            ui.prompts()[0],
            (
                "New URL for \"ch1\":".to_string(),
                Some("udp://239.0.0.1:1234".to_string())
            )
        );
    }

    #[tokio::test]
    async fn edit_failure_notifies() {
        let ui = ScriptedUi::answering(&[Some("udp://new"), Some("cpu")]);
        let control = FakeControl::failing();

        edit_stream(&ui, &control, &target()).await;
        assert_eq!(ui.notices(), vec!["Edit failed"]);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let ui = ScriptedUi::default();
        let control = FakeControl::ok();

        assert_eq!(delete_stream(&ui, &control, "ch1").await, ActionOutcome::Nothing);
        assert!(control.calls().is_empty());

        let ui = ScriptedUi {
            confirm: true,
            ..ScriptedUi::default()
        };
        assert_eq!(
            delete_stream(&ui, &control, "ch1").await,
            ActionOutcome::RowDeleted("ch1".to_string())
        );
    }

    #[tokio::test]
    async fn failed_delete_keeps_row() {
        let ui = ScriptedUi {
            confirm: true,
            ..ScriptedUi::default()
        };
        let control = FakeControl::failing();

        assert_eq!(delete_stream(&ui, &control, "ch1").await, ActionOutcome::Nothing);
        assert_eq!(ui.notices(), vec!["Delete failed"]);
    }

    #[tokio::test]
    async fn toggle_follows_running_state() {
        let ui = ScriptedUi::default();
        let control = FakeControl::failing();

        toggle_stream(&ui, &control, "ch1", ToggleAction::Stop).await;
        toggle_stream(&ui, &control, "ch2", ToggleAction::Start).await;
        assert_eq!(control.calls(), vec!["stop ch1", "start ch2"]);
        assert_eq!(ui.notices(), vec!["Stop failed", "Start failed"]);
    }

    #[tokio::test]
    async fn run_action_dispatches_by_kind() {
        let ui = ScriptedUi::default();
        let control = FakeControl::ok();

        let outcome = run_action(PendingAction::Restart("ch3".to_string()), &ui, &control).await;
        assert_eq!(outcome, ActionOutcome::RestartArmed("ch3".to_string()));
        run_action(
            PendingAction::Toggle("ch3".to_string(), ToggleAction::Start),
            &ui,
            &control,
        )
        .await;
        assert_eq!(control.calls(), vec!["restart ch3", "start ch3"]);
    }

    #[tokio::test]
    async fn restart_arms_grace_only_on_success() {
        let ui = ScriptedUi::default();
        assert_eq!(
            restart_stream(&ui, &FakeControl::ok(), "ch1").await,
            ActionOutcome::RestartArmed("ch1".to_string())
        );
        assert_eq!(
            restart_stream(&ui, &FakeControl::failing(), "ch1").await,
            ActionOutcome::Nothing
        );
        assert_eq!(ui.notices(), vec!["Restart failed"]);
    }
}
