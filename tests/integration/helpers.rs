//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use fileman_auth::PasswordHasher;
use fileman_core::config::AppConfig;
use fileman_database::{MemoryStore, Store};
use fileman_entity::file::{CreateFile, File, FileType};
use fileman_entity::user::{CreateUser, User};
use fileman_queue::memory::MemoryJobQueue;
use fileman_queue::{EMAIL_QUEUE, QueueManager, THUMBNAIL_QUEUE};

/// Test application context backed by the in-memory store and queues.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Store shared with the router
    pub store: MemoryStore,
    /// Queues shared with the router
    pub queues: QueueManager,
    /// Thumbnail queue handle, for outage simulation
    pub thumbnail_queue: MemoryJobQueue,
    /// Email queue handle, for outage simulation
    pub email_queue: MemoryJobQueue,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let (thumbnail_queue, email_queue, queues) = memory_queues(1);

        let state = fileman_api::AppState::new(
            Arc::new(AppConfig::default()),
            Arc::new(store.clone()),
            queues.clone(),
        );
        let router = fileman_api::build_app(state);

        Self {
            router,
            store,
            queues,
            thumbnail_queue,
            email_queue,
        }
    }

    /// Make an HTTP request to the test app with a JSON body
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.request_raw(method, path, body_str).await
    }

    /// Make an HTTP request with an arbitrary body string
    pub async fn request_raw(&self, method: &str, path: &str, body: String) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Both memory queues plus a manager sharing them.
pub fn memory_queues(max_attempts: u32) -> (MemoryJobQueue, MemoryJobQueue, QueueManager) {
    let thumbnail = MemoryJobQueue::new(THUMBNAIL_QUEUE, max_attempts);
    let email = MemoryJobQueue::new(EMAIL_QUEUE, max_attempts);
    let manager = QueueManager::from_queues(Arc::new(thumbnail.clone()), Arc::new(email.clone()));
    (thumbnail, email, manager)
}

/// Insert a user directly into the store
pub async fn create_user(store: &MemoryStore, email: &str) -> User {
    let password_hash = PasswordHasher::new()
        .hash_password("secret")
        .expect("Failed to hash password");
    store
        .users()
        .insert_one(&CreateUser {
            email: email.to_string(),
            password_hash,
        })
        .await
        .expect("Failed to create test user")
}

/// Insert a file entry directly into the store
pub async fn create_file(
    store: &MemoryStore,
    owner: Uuid,
    name: &str,
    file_type: FileType,
    local_path: Option<&Path>,
) -> File {
    store
        .files()
        .insert_one(&CreateFile {
            user_id: owner,
            name: name.to_string(),
            file_type,
            is_public: false,
            parent_id: None,
            local_path: local_path.map(|p| p.to_string_lossy().into_owned()),
        })
        .await
        .expect("Failed to create test file")
}

/// Write a PNG of the given size and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode PNG");

    let path = dir.join(name);
    std::fs::write(&path, bytes.into_inner()).expect("Failed to write PNG");
    path
}
