//! Fixed-interval background tasks with manual triggers and cooperative cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Scheduler {
    shutdown: CancellationToken,
}

pub struct TaskHandle {
    name: String,
    cancel: CancellationToken,
    wake: Arc<Notify>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the task now instead of waiting for the next tick. The interval is not reset.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawns `task` to run every `interval`, first run one interval from now.
    /// Runs never overlap; a run in progress is abandoned on cancellation.
    pub fn schedule_every<F, Fut>(&self, name: &str, interval: Duration, task: F) -> TaskHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.shutdown.child_token();
        let wake = Arc::new(Notify::new());

        let join = tokio::spawn({
            let cancel = cancel.clone();
            let wake = wake.clone();
            let name = name.to_string();

            async move {
                info!(task = %name, ?interval, "Scheduled task started");
                let mut ticker = time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = wake.notified() => debug!(task = %name, "Triggered manually"),
                        _ = ticker.tick() => debug!(task = %name, "Interval elapsed"),
                    }

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = task() => {}
                    }
                }

                info!(task = %name, "Scheduled task stopped");
            }
        });

        TaskHandle {
            name: name.to_string(),
            cancel,
            wake,
            join,
        }
    }

    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }

    /// Stops every task spawned by this scheduler.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_once_per_interval() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let _handle = scheduler.schedule_every(
            "count",
            Duration::from_secs(60),
            counting_task(&runs),
        );

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_runs_without_waiting_for_the_tick() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_every(
            "reconcile",
            Duration::from_secs(6 * 60 * 60),
            counting_task(&runs),
        );

        handle.trigger();
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(handle.name(), "reconcile");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_runs_again() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_every(
            "count",
            Duration::from_secs(10),
            counting_task(&runs),
        );

        time::sleep(Duration::from_secs(15)).await;
        scheduler.cancel(&handle);
        time::sleep(Duration::from_secs(100)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_task() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let first = scheduler.schedule_every("a", Duration::from_secs(10), counting_task(&runs));
        let second = scheduler.schedule_every("b", Duration::from_secs(20), counting_task(&runs));

        scheduler.shutdown();
        time::sleep(Duration::from_secs(60)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(first.is_finished());
        assert!(second.is_finished());
    }
}
