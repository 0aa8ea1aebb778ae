use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Operator dialogue used by the action flows.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Asks for a line of text. `None` means the operator cancelled.
    async fn prompt(&self, message: &str, default: Option<&str>) -> Option<String>;
    async fn confirm(&self, message: &str) -> bool;
    /// Shows a message and waits until it is dismissed.
    async fn notify(&self, message: &str);
}

/// A dialogue request waiting for the UI loop to answer it.
#[derive(Debug)]
pub enum InteractionRequest {
    Prompt {
        message: String,
        default: Option<String>,
        reply: oneshot::Sender<Option<String>>,
    },
    Confirm {
        message: String,
        reply: oneshot::Sender<bool>,
    },
    Notify {
        message: String,
        reply: oneshot::Sender<()>,
    },
}

/// Forwards dialogue to the terminal loop, which renders it as a modal.
///
/// If the loop has gone away, prompts read as cancelled and confirms as no.
#[derive(Clone, Debug)]
pub struct TuiInteraction {
    tx: mpsc::Sender<InteractionRequest>,
}

impl TuiInteraction {
    pub fn new(tx: mpsc::Sender<InteractionRequest>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Interaction for TuiInteraction {
    async fn prompt(&self, message: &str, default: Option<&str>) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        let request = InteractionRequest::Prompt {
            message: message.to_string(),
            default: default.map(str::to_string),
            reply,
        };
        if self.tx.send(request).await.is_err() {
            return None;
        }
        answer.await.ok().flatten()
    }

    async fn confirm(&self, message: &str) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = InteractionRequest::Confirm {
            message: message.to_string(),
            reply,
        };
        if self.tx.send(request).await.is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }

    async fn notify(&self, message: &str) {
        let (reply, answer) = oneshot::channel();
        let request = InteractionRequest::Notify {
            message: message.to_string(),
            reply,
        };
        if self.tx.send(request).await.is_ok() {
            let _ = answer.await;
        }
    }
}

/// Modal state owned by the terminal loop while a request is open.
#[derive(Debug)]
pub enum Modal {
    Prompt {
        message: String,
        input: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Confirm {
        message: String,
        reply: oneshot::Sender<bool>,
    },
    Notify {
        message: String,
        reply: oneshot::Sender<()>,
    },
}

impl Modal {
    pub fn open(request: InteractionRequest) -> Self {
        match request {
            InteractionRequest::Prompt {
                message,
                default,
                reply,
            } => Modal::Prompt {
                message,
                input: default.unwrap_or_default(),
                reply,
            },
            InteractionRequest::Confirm { message, reply } => Modal::Confirm { message, reply },
            InteractionRequest::Notify { message, reply } => Modal::Notify { message, reply },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Modal::Prompt { message, .. }
            | Modal::Confirm { message, .. }
            | Modal::Notify { message, .. } => message,
        }
    }

    /// Enter on a prompt, `y` on a confirm, Enter on a notification.
    pub fn accept(self) {
        match self {
            Modal::Prompt { input, reply, .. } => {
                let _ = reply.send(Some(input));
            }
            Modal::Confirm { reply, .. } => {
                let _ = reply.send(true);
            }
            Modal::Notify { reply, .. } => {
                let _ = reply.send(());
            }
        }
    }

    /// Esc everywhere, `n` on a confirm.
    pub fn cancel(self) {
        match self {
            Modal::Prompt { reply, .. } => {
                let _ = reply.send(None);
            }
            Modal::Confirm { reply, .. } => {
                let _ = reply.send(false);
            }
            Modal::Notify { reply, .. } => {
                let _ = reply.send(());
            }
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Modal::Prompt { input, .. } = self {
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Modal::Prompt { input, .. } = self {
            input.pop();
        }
    }
}
