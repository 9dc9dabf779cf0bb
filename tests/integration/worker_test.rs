//! End-to-end tests for the background worker.

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;
use uuid::Uuid;

use fileman_core::config::WorkerConfig;
use fileman_core::result::AppResult;
use fileman_database::MemoryStore;
use fileman_entity::file::FileType;
use fileman_entity::job::{EmailJob, Job, JobStatus, ThumbnailJob};
use fileman_mail::template::WELCOME_SUBJECT;
use fileman_mail::{MailMessage, MailSender};
use fileman_queue::{JobQueue, QueueManager};
use fileman_storage::{LocalStorageProvider, ThumbnailGenerator, thumbnail_path};
use fileman_worker::WorkerRunner;

/// Mailer that keeps every message instead of sending it.
#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct Harness {
    dir: tempfile::TempDir,
    store: MemoryStore,
    queues: QueueManager,
    mailer: Arc<RecordingMailer>,
    runner: WorkerRunner,
}

async fn harness(max_attempts: u32) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let (_, _, queues) = helpers::memory_queues(max_attempts);
    let mailer = Arc::new(RecordingMailer::default());

    let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
        .await
        .unwrap();
    let config = WorkerConfig {
        poll_interval_ms: 10,
        max_attempts,
        retry_backoff_ms: 0,
        ..WorkerConfig::default()
    };
    let runner = WorkerRunner::with_default_handlers(
        &queues,
        Arc::new(store.clone()),
        ThumbnailGenerator::new(Arc::new(provider)),
        vec![500, 250, 100],
        mailer.clone(),
        &config,
    );

    Harness {
        dir,
        store,
        queues,
        mailer,
        runner,
    }
}

/// Run the worker until every queue has `finished` jobs in a terminal
/// state, then shut it down.
async fn run_until_finished(runner: WorkerRunner, queues: &QueueManager, finished: u64) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    let wait = async {
        loop {
            let mut done = 0;
            for queue in queues.all() {
                let stats = queue.stats().await.unwrap();
                done += stats.completed + stats.failed;
            }
            if done >= finished {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(30), wait)
        .await
        .expect("jobs did not finish in time");

    cancel_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(30), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}

async fn job(queue: &Arc<dyn JobQueue>, id: Uuid) -> Job {
    queue.get(id).await.unwrap().expect("job exists")
}

#[tokio::test]
async fn test_thumbnails_generated_for_each_width() {
    let h = harness(1).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;
    let source = helpers::write_png(h.dir.path(), "photo", 800, 600);
    let file = helpers::create_file(&h.store, user.id, "photo.png", FileType::Image, Some(&source)).await;

    let payload = serde_json::to_value(ThumbnailJob::new(file.id.to_string(), user.id.to_string())).unwrap();
    let queued = h.queues.thumbnail().enqueue(payload).await.unwrap();

    run_until_finished(h.runner, &h.queues, 1).await;

    assert_eq!(job(&h.queues.thumbnail(), queued.id).await.status, JobStatus::Completed);

    let source = source.to_str().unwrap();
    for (width, height) in [(500, 375), (250, 188), (100, 75)] {
        let thumb = image::open(thumbnail_path(source, width)).expect("thumbnail written");
        assert_eq!(thumb.width(), width);
        assert!(thumb.height().abs_diff(height) <= 1);
    }
    let original = image::open(source).unwrap();
    assert_eq!((original.width(), original.height()), (800, 600));
}

#[tokio::test]
async fn test_thumbnail_job_is_idempotent() {
    let h = harness(1).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;
    let source = helpers::write_png(h.dir.path(), "photo", 300, 300);
    let file = helpers::create_file(&h.store, user.id, "photo.png", FileType::Image, Some(&source)).await;

    let payload = serde_json::to_value(ThumbnailJob::new(file.id.to_string(), user.id.to_string())).unwrap();
    let first = h.queues.thumbnail().enqueue(payload.clone()).await.unwrap();
    let second = h.queues.thumbnail().enqueue(payload).await.unwrap();

    run_until_finished(h.runner, &h.queues, 2).await;

    let queue = h.queues.thumbnail();
    assert_eq!(job(&queue, first.id).await.status, JobStatus::Completed);
    assert_eq!(job(&queue, second.id).await.status, JobStatus::Completed);
    let thumb = image::open(thumbnail_path(source.to_str().unwrap(), 250)).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (250, 250));
}

#[tokio::test]
async fn test_thumbnail_job_missing_file_id() {
    let h = harness(1).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;

    let queued = h
        .queues
        .thumbnail()
        .enqueue(json!({"userId": user.id.to_string()}))
        .await
        .unwrap();

    run_until_finished(h.runner, &h.queues, 1).await;

    let failed = job(&h.queues.thumbnail(), queued.id).await;
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("Missing fileId"));
}

#[tokio::test]
async fn test_thumbnail_queue_continues_after_failed_job() {
    let h = harness(1).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;
    let source = helpers::write_png(h.dir.path(), "photo", 400, 200);
    let file = helpers::create_file(&h.store, user.id, "photo.png", FileType::Image, Some(&source)).await;

    let queue = h.queues.thumbnail();
    let broken = queue.enqueue(json!({"fileId": 42, "userId": user.id.to_string()})).await.unwrap();
    let payload = serde_json::to_value(ThumbnailJob::new(file.id.to_string(), user.id.to_string())).unwrap();
    let valid = queue.enqueue(payload).await.unwrap();

    run_until_finished(h.runner, &h.queues, 2).await;

    let broken = job(&queue, broken.id).await;
    assert_eq!(broken.status, JobStatus::Failed);
    assert_eq!(broken.error_message.as_deref(), Some("Invalid fileId: 42"));
    assert_eq!(job(&queue, valid.id).await.status, JobStatus::Completed);
    assert!(std::path::Path::new(&thumbnail_path(source.to_str().unwrap(), 100)).exists());
}

#[tokio::test]
async fn test_thumbnail_job_wrong_owner_is_not_found() {
    let h = harness(1).await;
    let owner = helpers::create_user(&h.store, "owner@example.com").await;
    let other = helpers::create_user(&h.store, "other@example.com").await;
    let source = helpers::write_png(h.dir.path(), "photo", 200, 100);
    let file = helpers::create_file(&h.store, owner.id, "photo.png", FileType::Image, Some(&source)).await;

    let payload = serde_json::to_value(ThumbnailJob::new(file.id.to_string(), other.id.to_string())).unwrap();
    let queued = h.queues.thumbnail().enqueue(payload).await.unwrap();

    run_until_finished(h.runner, &h.queues, 1).await;

    let failed = job(&h.queues.thumbnail(), queued.id).await;
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("File not found"));
    assert!(!std::path::Path::new(&thumbnail_path(source.to_str().unwrap(), 100)).exists());
}

#[tokio::test]
async fn test_thumbnail_failure_is_retried_then_failed() {
    let h = harness(2).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;
    let missing = h.dir.path().join("gone");
    let file = helpers::create_file(&h.store, user.id, "gone.png", FileType::Image, Some(&missing)).await;

    let payload = serde_json::to_value(ThumbnailJob::new(file.id.to_string(), user.id.to_string())).unwrap();
    let queued = h.queues.thumbnail().enqueue(payload).await.unwrap();

    run_until_finished(h.runner, &h.queues, 1).await;

    let failed = job(&h.queues.thumbnail(), queued.id).await;
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.attempts, 2);
}

#[tokio::test]
async fn test_welcome_email_sent_once() {
    let h = harness(1).await;
    let user = helpers::create_user(&h.store, "bob@dylan.com").await;

    let payload = serde_json::to_value(EmailJob::new(user.id.to_string())).unwrap();
    let queued = h.queues.email().enqueue(payload).await.unwrap();

    let mailer = h.mailer.clone();
    run_until_finished(h.runner, &h.queues, 1).await;

    assert_eq!(job(&h.queues.email(), queued.id).await.status, JobStatus::Completed);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "bob@dylan.com");
    assert_eq!(sent[0].subject, WELCOME_SUBJECT);
    assert!(sent[0].html_body.contains("Hello bob@dylan.com"));
}

#[tokio::test]
async fn test_welcome_email_missing_user_id() {
    let h = harness(1).await;

    let queued = h.queues.email().enqueue(json!({})).await.unwrap();

    let mailer = h.mailer.clone();
    run_until_finished(h.runner, &h.queues, 1).await;

    let failed = job(&h.queues.email(), queued.id).await;
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("Missing userId"));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_welcome_email_unknown_user() {
    let h = harness(1).await;

    let payload = serde_json::to_value(EmailJob::new(Uuid::new_v4().to_string())).unwrap();
    let queued = h.queues.email().enqueue(payload).await.unwrap();

    let mailer = h.mailer.clone();
    run_until_finished(h.runner, &h.queues, 1).await;

    let failed = job(&h.queues.email(), queued.id).await;
    assert_eq!(failed.error_message.as_deref(), Some("User not found"));
    assert!(mailer.sent().is_empty());
}
