//! Background match-list refresh.
//!
//! Fetches the match list immediately and then on every tick. Failures are
//! logged and skipped; the next attempt is the next tick.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::types::MatchList;

/// Default refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Handle to a running poller.
#[derive(Debug)]
pub struct MatchListPoller {
    /// Latest successfully fetched match list.
    pub updates: watch::Receiver<MatchList>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MatchListPoller {
    /// Spawns the poller on the current tokio runtime.
    pub fn spawn(client: ApiClient, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (tx, updates) = watch::channel(MatchList::default());
        let task = tokio::spawn(run_poller(
            client,
            interval.max(Duration::from_millis(1)),
            tx,
            cancel.clone(),
        ));
        Self {
            updates,
            cancel,
            task,
        }
    }

    /// Snapshot of the latest match list.
    pub fn latest(&self) -> MatchList {
        self.updates.borrow().clone()
    }

    /// Stops the poller and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "Match-list poller task failed");
        }
    }
}

async fn run_poller(
    client: ApiClient,
    interval: Duration,
    tx: watch::Sender<MatchList>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match client.fetch_match_list().await {
                    Ok(list) => {
                        tracing::debug!(
                            live = list.live.len(),
                            upcoming = list.upcoming.len(),
                            recent = list.recent.len(),
                            "Match list refreshed"
                        );
                        tx.send_replace(list);
                    }
                    Err(err) => tracing::warn!(error = %err, "Match list refresh failed"),
                }
                if tx.is_closed() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Match-list poller stopped");
}
