use crate::probe::ApiVariant;
use crate::{ClientError, StreamApiClient};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Control operations on remote streams. Every call resolves to a plain
/// success flag; failures carry no further detail for the caller.
#[async_trait]
pub trait StreamControl: Send + Sync {
    /// Creates the stream or replaces its configuration.
    async fn add(&self, name: &str, url: &str, decoder: &str) -> bool;
    async fn delete(&self, name: &str) -> bool;
    async fn start(&self, name: &str) -> bool;
    async fn stop(&self, name: &str) -> bool;
    async fn restart(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand<'a> {
    Add {
        name: &'a str,
        url: &'a str,
        decoder: &'a str,
    },
    Delete {
        name: &'a str,
    },
    Start {
        name: &'a str,
    },
    Stop {
        name: &'a str,
    },
    Restart {
        name: &'a str,
    },
}

/// Method, path segments and optional JSON body for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Option<Value>,
}

impl<'a> StreamCommand<'a> {
    pub fn verb(&self) -> &'static str {
        match self {
            StreamCommand::Add { .. } => "add",
            StreamCommand::Delete { .. } => "delete",
            StreamCommand::Start { .. } => "start",
            StreamCommand::Stop { .. } => "stop",
            StreamCommand::Restart { .. } => "restart",
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            StreamCommand::Add { name, .. }
            | StreamCommand::Delete { name }
            | StreamCommand::Start { name }
            | StreamCommand::Stop { name }
            | StreamCommand::Restart { name } => name,
        }
    }

    pub fn route(&self, variant: ApiVariant) -> Route {
        let segments = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        match variant {
            ApiVariant::Legacy => match *self {
                StreamCommand::Add { name, url, decoder } => Route {
                    method: Method::POST,
                    segments: segments(&["api", "streams"]),
                    body: Some(json!({"name": name, "url": url, "decoder": decoder})),
                },
                StreamCommand::Delete { name } => Route {
                    method: Method::DELETE,
                    segments: segments(&["api", "streams", name]),
                    body: None,
                },
                StreamCommand::Start { name }
                | StreamCommand::Stop { name }
                | StreamCommand::Restart { name } => Route {
                    method: Method::POST,
                    segments: segments(&["api", "streams", name, self.verb()]),
                    body: None,
                },
            },
            ApiVariant::Current => {
                // The current API takes no decoder; the service ignores it anyway.
                let body = match *self {
                    StreamCommand::Add { name, url, .. } => json!({"name": name, "url": url}),
                    _ => json!({"name": self.name()}),
                };
                Route {
                    method: Method::POST,
                    segments: segments(&["api", "stream", self.verb()]),
                    body: Some(body),
                }
            }
        }
    }
}

/// Routes the five stream commands to whichever API variant was probed.
#[derive(Debug, Clone)]
pub struct CommandFacade {
    client: StreamApiClient,
    variant: ApiVariant,
}

impl CommandFacade {
    pub fn new(client: StreamApiClient, variant: ApiVariant) -> Self {
        Self { client, variant }
    }

    pub fn variant(&self) -> ApiVariant {
        self.variant
    }

    /// Sends `command` and reports the response's `ok` flag. Transport and
    /// decoding failures are logged and read as `false`.
    pub async fn execute(&self, command: StreamCommand<'_>) -> bool {
        match self.try_execute(command).await {
            Ok(ok) => {
                debug!(
                    event = "stream_command",
                    verb = command.verb(),
                    name = command.name(),
                    variant = %self.variant,
                    ok
                );
                ok
            }
            Err(err) => {
                warn!(
                    event = "stream_command_failed",
                    verb = command.verb(),
                    name = command.name(),
                    variant = %self.variant,
                    error = %err
                );
                false
            }
        }
    }

    async fn try_execute(&self, command: StreamCommand<'_>) -> Result<bool, ClientError> {
        let route = command.route(self.variant);
        let url = self.client.endpoint(&route.segments);
        let path = url.path().to_string();
        let mut request = self.client.http().request(route.method, url);
        if let Some(body) = route.body.as_ref() {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(event = "stream_command_status", path = %path, status = status.as_u16());
        }
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
            path,
            reason: err.to_string(),
        })?;
        Ok(body.get("ok").is_some_and(is_truthy))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[async_trait]
impl StreamControl for CommandFacade {
    async fn add(&self, name: &str, url: &str, decoder: &str) -> bool {
        self.execute(StreamCommand::Add { name, url, decoder }).await
    }

    async fn delete(&self, name: &str) -> bool {
        self.execute(StreamCommand::Delete { name }).await
    }

    async fn start(&self, name: &str) -> bool {
        self.execute(StreamCommand::Start { name }).await
    }

    async fn stop(&self, name: &str) -> bool {
        self.execute(StreamCommand::Stop { name }).await
    }

    async fn restart(&self, name: &str) -> bool {
        self.execute(StreamCommand::Restart { name }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::probe_api_variant;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn client(base: &str) -> StreamApiClient {
        StreamApiClient::new(base, Duration::from_secs(2)).expect("client")
    }

    #[test]
    fn legacy_routes_embed_name_in_path() {
        let start = StreamCommand::Start { name: "ch1" }.route(ApiVariant::Legacy);
        assert_eq!(start.method, Method::POST);
        assert_eq!(start.segments, vec!["api", "streams", "ch1", "start"]);
        assert!(start.body.is_none());

        let delete = StreamCommand::Delete { name: "ch1" }.route(ApiVariant::Legacy);
        assert_eq!(delete.method, Method::DELETE);
        assert_eq!(delete.segments, vec!["api", "streams", "ch1"]);

        let add = StreamCommand::Add {
            name: "ch1",
            url: "udp://x",
            decoder: "cuda",
        }
        .route(ApiVariant::Legacy);
        assert_eq!(add.segments, vec!["api", "streams"]);
        assert_eq!(
            add.body,
            Some(json!({"name": "ch1", "url": "udp://x", "decoder": "cuda"}))
        );
    }

    #[test]
    fn current_routes_use_fixed_paths_with_body() {
        for (command, verb) in [
            (StreamCommand::Delete { name: "ch1" }, "delete"),
            (StreamCommand::Start { name: "ch1" }, "start"),
            (StreamCommand::Stop { name: "ch1" }, "stop"),
            (StreamCommand::Restart { name: "ch1" }, "restart"),
        ] {
            let route = command.route(ApiVariant::Current);
            assert_eq!(route.method, Method::POST);
            assert_eq!(route.segments, vec!["api", "stream", verb]);
            assert_eq!(route.body, Some(json!({"name": "ch1"})));
        }

        let add = StreamCommand::Add {
            name: "ch1",
            url: "udp://x",
            decoder: "auto",
        }
        .route(ApiVariant::Current);
        assert_eq!(add.segments, vec!["api", "stream", "add"]);
        assert_eq!(add.body, Some(json!({"name": "ch1", "url": "udp://x"})));
    }

    #[test]
    fn truthiness_matches_loose_ok_flags() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[tokio::test]
    async fn current_variant_posts_json_body() {
        let server = MockServer::start();
        let restart = server.mock(|when, then| {
            when.method(POST)
                .path("/api/stream/restart")
                .json_body(json!({"name": "ch1"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        let facade = CommandFacade::new(client(&server.base_url()), ApiVariant::Current);
        assert!(facade.restart("ch1").await);
        restart.assert();
    }

    #[tokio::test]
    async fn ok_false_or_missing_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/stream/start");
            then.status(200).json_body(json!({"ok": false}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/stream/stop");
            then.status(200).json_body(json!({"result": "done"}));
        });

        let facade = CommandFacade::new(client(&server.base_url()), ApiVariant::Current);
        assert!(!facade.start("ch1").await);
        assert!(!facade.stop("ch1").await);
    }

    #[tokio::test]
    async fn non_json_response_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/stream/delete");
            then.status(500).body("internal error");
        });

        let facade = CommandFacade::new(client(&server.base_url()), ApiVariant::Current);
        assert!(!facade.delete("ch1").await);
    }

    #[tokio::test]
    async fn transport_error_is_failure() {
        let facade = CommandFacade::new(client("http://127.0.0.1:9"), ApiVariant::Legacy);
        assert!(!facade.restart("ch1").await);
    }

    #[tokio::test]
    async fn failed_probe_routes_all_commands_to_legacy_paths() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/settings");
            then.status(500);
        });
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/api/streams")
                .json_body(json!({"name": "ch1", "url": "udp://x", "decoder": "auto"}));
            then.status(200).json_body(json!({"ok": true}));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/streams/ch1");
            then.status(200).json_body(json!({"ok": true}));
        });
        let start = server.mock(|when, then| {
            when.method(POST).path("/api/streams/ch1/start");
            then.status(200).json_body(json!({"ok": true}));
        });
        let stop = server.mock(|when, then| {
            when.method(POST).path("/api/streams/ch1/stop");
            then.status(200).json_body(json!({"ok": true}));
        });
        let restart = server.mock(|when, then| {
            when.method(POST).path("/api/streams/ch1/restart");
            then.status(200).json_body(json!({"ok": true}));
        });

        let api = client(&server.base_url());
        let variant = probe_api_variant(&api).await;
        assert_eq!(variant, ApiVariant::Legacy);
        let facade = CommandFacade::new(api, variant);

        assert!(facade.add("ch1", "udp://x", "auto").await);
        assert!(facade.delete("ch1").await);
        assert!(facade.start("ch1").await);
        assert!(facade.stop("ch1").await);
        assert!(facade.restart("ch1").await);

        add.assert();
        delete.assert();
        start.assert();
        stop.assert();
        restart.assert();
    }
}
