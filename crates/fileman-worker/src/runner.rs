//! Worker runner: one consumer loop per queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{error, info, trace};

use fileman_core::config::WorkerConfig;
use fileman_database::Store;
use fileman_mail::MailSender;
use fileman_queue::{JobQueue, QueueManager};
use fileman_storage::ThumbnailGenerator;

use crate::executor::JobExecutor;
use crate::jobs::{ThumbnailJobHandler, WelcomeEmailJobHandler};

/// Default delay between scans for expired claims.
const DEFAULT_STALLED_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Runs every registered executor in its own consumer loop.
///
/// Each loop takes one job at a time from its queue, so jobs of one queue
/// are processed in FIFO order while the queues progress independently.
/// A separate loop hands out jobs whose claim expired because their
/// consumer died.
#[derive(Debug)]
pub struct WorkerRunner {
    executors: Vec<Arc<JobExecutor>>,
    poll_interval: Duration,
    stalled_check_interval: Duration,
}

impl WorkerRunner {
    /// Create a runner over explicit executors.
    pub fn new(executors: Vec<Arc<JobExecutor>>, poll_interval: Duration) -> Self {
        Self {
            executors,
            poll_interval,
            stalled_check_interval: DEFAULT_STALLED_CHECK_INTERVAL,
        }
    }

    /// Set the delay between scans for expired claims.
    pub fn with_stalled_check_interval(mut self, interval: Duration) -> Self {
        self.stalled_check_interval = interval;
        self
    }

    /// Wire the thumbnail and welcome email consumers to their queues.
    pub fn with_default_handlers(
        queues: &QueueManager,
        store: Arc<dyn Store>,
        generator: ThumbnailGenerator,
        thumbnail_widths: Vec<u32>,
        mailer: Arc<dyn MailSender>,
        config: &WorkerConfig,
    ) -> Self {
        let backoff = Duration::from_millis(config.retry_backoff_ms);
        let thumbnails = JobExecutor::new(
            queues.thumbnail(),
            Arc::new(ThumbnailJobHandler::new(
                store.clone(),
                generator,
                thumbnail_widths,
            )),
            backoff,
        );
        let emails = JobExecutor::new(
            queues.email(),
            Arc::new(WelcomeEmailJobHandler::new(store, mailer)),
            backoff,
        );

        Self::new(
            vec![Arc::new(thumbnails), Arc::new(emails)],
            Duration::from_millis(config.poll_interval_ms),
        )
        .with_stalled_check_interval(Duration::from_millis(config.stalled_check_interval_ms))
    }

    /// Run until the cancel signal turns true or its sender is dropped.
    ///
    /// On cancellation each loop finishes its current job, then returns.
    pub async fn run(&self, cancel: watch::Receiver<bool>) {
        info!(
            queues = ?self.executors.iter().map(|e| e.queue().name().to_string()).collect::<Vec<_>>(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker started"
        );

        let mut loops = JoinSet::new();
        loops.spawn(recover_stalled(
            self.executors.iter().map(|e| Arc::clone(e.queue())).collect(),
            self.stalled_check_interval,
            cancel.clone(),
        ));
        for executor in &self.executors {
            loops.spawn(consume(
                Arc::clone(executor),
                self.poll_interval,
                cancel.clone(),
            ));
        }

        while let Some(result) = loops.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Consumer loop terminated abnormally");
            }
        }

        info!("Worker shut down complete");
    }
}

/// Requeue expired claims of every queue, once per `interval`.
async fn recover_stalled(
    queues: Vec<Arc<dyn JobQueue>>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }

        for queue in &queues {
            match queue.recover_stalled().await {
                Ok(0) => {}
                Ok(n) => info!(queue = %queue.name(), count = n, "Requeued stalled jobs"),
                Err(e) => error!(queue = %queue.name(), error = %e, "Failed to recover stalled jobs"),
            }
        }

        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = time::sleep(interval) => {}
        }
    }
}

/// Consumer loop of one queue.
async fn consume(executor: Arc<JobExecutor>, poll_interval: Duration, mut cancel: watch::Receiver<bool>) {
    let name = executor.queue().name().to_string();
    loop {
        if *cancel.borrow() {
            break;
        }

        match executor.run_next().await {
            Ok(Some(_)) => continue,
            Ok(None) => trace!(queue = %name, "No jobs available"),
            Err(e) => error!(queue = %name, error = %e, "Failed to process job"),
        }

        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = time::sleep(poll_interval) => {}
        }
    }
    info!(queue = %name, "Consumer stopped");
}
