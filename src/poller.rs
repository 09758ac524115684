use crate::disruption::{AlertSnapshot, Disruption};
use crate::source::AlertSource;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodically refreshes the alert list from an [`AlertSource`].
pub struct AlertPoller<S> {
    source: Arc<S>,
    period: Duration,
    operator: String,
}

impl<S: AlertSource> AlertPoller<S> {
    pub fn new(source: S, period: Duration, operator: impl Into<String>) -> Self {
        Self {
            source: Arc::new(source),
            period,
            operator: operator.into(),
        }
    }

    /// Fetches once right away, then once per period until the returned
    /// handle is shut down or dropped.
    pub fn start(self) -> PollerHandle {
        let (tx, rx) = watch::channel(AlertSnapshot::Loading);
        info!(period_secs = self.period.as_secs(), "Starting alert poller");
        let task = tokio::spawn(poll_loop(self.source, self.period, self.operator, tx));
        PollerHandle {
            snapshot: rx,
            task: Some(task),
        }
    }
}

// Fetches run as separate tasks so a slow one never delays the next tick.
// They live in the JoinSet owned by this future, so cancelling the loop
// cancels them too. Results are stored in completion order.
async fn poll_loop<S: AlertSource>(
    source: Arc<S>,
    period: Duration,
    operator: String,
    tx: watch::Sender<AlertSnapshot>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cycle += 1;
                let source = source.clone();
                in_flight.spawn(async move { (cycle, source.fetch_alerts().await) });
                debug!(cycle, in_flight = in_flight.len(), "Poll cycle started");
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let snapshot = match joined {
                    Ok((cycle, Ok(alerts))) => {
                        debug!(cycle, count = alerts.len(), "Alerts refreshed");
                        AlertSnapshot::Ready {
                            alerts,
                            fetched_at: Utc::now(),
                            failed: false,
                        }
                    }
                    Ok((cycle, Err(e))) => {
                        warn!(cycle, "Failed to fetch alerts: {}", e);
                        failed_snapshot(&operator)
                    }
                    Err(e) => {
                        warn!("Alert fetch task aborted: {}", e);
                        failed_snapshot(&operator)
                    }
                };
                debug!(stored = snapshot.alerts().len(), "Alert snapshot replaced");
                tx.send_replace(snapshot);
            }
        }
    }
}

fn failed_snapshot(operator: &str) -> AlertSnapshot {
    AlertSnapshot::Ready {
        alerts: vec![Disruption::fetch_failed(operator)],
        fetched_at: Utc::now(),
        failed: true,
    }
}

/// Owns the running poll task. Dropping it stops polling.
pub struct PollerHandle {
    snapshot: watch::Receiver<AlertSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Latest stored snapshot. Still readable after teardown.
    pub fn snapshot(&self) -> AlertSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancels polling. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Alert poller stopped");
        }
    }

    /// Cancels polling and waits until the poll task can no longer store
    /// anything.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("Alert poller shut down");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
