use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::models::PollOutcome;
use super::source::StatusSource;

/// Periodic status check: once at start, then every `interval`, plus on demand.
pub struct LivePoller {
    source: Arc<dyn StatusSource>,
    interval: Duration,
}

impl LivePoller {
    pub fn new(source: Arc<dyn StatusSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Starts polling on its own task; outcomes are delivered in order on
    /// `outcomes`. The task ends when the receiver is dropped or the handle
    /// is aborted.
    pub fn spawn(self, outcomes: mpsc::Sender<PollOutcome>) -> PollerHandle {
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(run(self.source, self.interval, outcomes, trigger.clone()));
        PollerHandle { task, trigger }
    }
}

async fn run(
    source: Arc<dyn StatusSource>,
    period: Duration,
    outcomes: mpsc::Sender<PollOutcome>,
    trigger: Arc<Notify>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(target: "status.poller", interval_secs = period.as_secs(), "live poller started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = trigger.notified() => {
                debug!(target: "status.poller", "poll requested");
                ticker.reset();
            }
        }
        let outcome = source.poll().await;
        match &outcome {
            PollOutcome::Degraded(reason) | PollOutcome::Unreachable(reason) => {
                warn!(target: "status.poller", outcome = outcome.label(), %reason, "status poll failed");
            }
            _ => debug!(target: "status.poller", outcome = outcome.label(), "status polled"),
        }
        if outcomes.send(outcome).await.is_err() {
            break;
        }
    }
    debug!(target: "status.poller", "live poller stopped");
}

/// Owner of the poller task. Dropping it stops polling.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl PollerHandle {
    pub fn poll_now(&self) {
        self.trigger.notify_one();
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{StatusResult, StreamStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for Counting {
        async fn fetch(&self) -> StatusResult<StreamStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StreamStatus::prerecorded(None))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval_and_on_demand() {
        let source = Arc::new(Counting::default());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = LivePoller::new(source.clone(), Duration::from_secs(30)).spawn(tx);

        assert_eq!(rx.recv().await, Some(PollOutcome::Offline));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(PollOutcome::Offline));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        handle.poll_now();
        assert_eq!(rx.recv().await, Some(PollOutcome::Offline));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        handle.abort();
        tokio::task::yield_now().await;
        assert!(rx.recv().await.is_none());
    }
}
