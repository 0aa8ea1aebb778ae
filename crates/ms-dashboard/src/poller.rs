use ms_client::StreamApiClient;
use ms_core::{parse_poll_body, PollError, StreamStatus};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

/// One completed poll, tagged with the sequence number it was issued with.
#[derive(Debug)]
pub struct PollEvent {
    pub seq: u64,
    pub outcome: PollOutcome,
}

#[derive(Debug)]
pub enum PollOutcome {
    Records(Vec<StreamStatus>),
    /// JSON arrived but was not a stream list.
    Malformed(PollError),
    /// Transport error, error status or non-JSON body. Logged, never shown
    /// in the table.
    Failed(String),
}

pub async fn poll_once(client: &StreamApiClient, seq: u64) -> PollEvent {
    let outcome = match client.fetch_streams().await {
        Ok(body) => match parse_poll_body(body) {
            Ok(records) => {
                debug!(event = "poll_ok", seq, records = records.len());
                PollOutcome::Records(records)
            }
            Err(err) => PollOutcome::Malformed(err),
        },
        Err(err) => {
            warn!(event = "poll_failed", seq, error = %err);
            PollOutcome::Failed(err.to_string())
        }
    };
    PollEvent { seq, outcome }
}

/// Issues a poll on every tick and on every refresh request, without
/// waiting for earlier polls to finish. Completions are forwarded in
/// whatever order they land.
///
/// Ends when either the event receiver or the refresh sender is dropped.
pub async fn run_poller(
    client: StreamApiClient,
    interval: Duration,
    events: mpsc::Sender<PollEvent>,
    mut refresh_rx: mpsc::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut next_seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            request = refresh_rx.recv() => {
                if request.is_none() {
                    break;
                }
                debug!(event = "poll_refresh_requested");
            }
            _ = events.closed() => break,
        }

        next_seq += 1;
        let seq = next_seq;
        let client = client.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let event = poll_once(&client, seq).await;
            let _ = events.send(event).await;
        });
    }
    debug!(event = "poller_stopped", issued = next_seq);
}
