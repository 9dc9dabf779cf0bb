//! Integration tests for the HTTP API.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use fileman_database::{Store, UserFilter};
use fileman_entity::file::FileType;
use fileman_entity::job::EmailJob;
use fileman_queue::JobQueue;

#[tokio::test]
async fn test_status_all_alive() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/status", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"redis": true, "db": true}));
}

#[tokio::test]
async fn test_status_store_down() {
    let app = helpers::TestApp::new();
    app.store.set_alive(false);

    let response = app.request("GET", "/status", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!({"redis": true, "db": false}));
}

#[tokio::test]
async fn test_status_broker_down() {
    let app = helpers::TestApp::new();
    app.email_queue.set_alive(false);

    let response = app.request("GET", "/status", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!({"redis": false, "db": true}));
}

#[tokio::test]
async fn test_stats_counts_documents() {
    let app = helpers::TestApp::new();
    let user = helpers::create_user(&app.store, "bob@dylan.com").await;
    helpers::create_file(&app.store, user.id, "images", FileType::Folder, None).await;
    helpers::create_file(&app.store, user.id, "notes.txt", FileType::File, None).await;

    let response = app.request("GET", "/stats", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"users": 1, "files": 2}));
}

#[tokio::test]
async fn test_stats_store_down() {
    let app = helpers::TestApp::new();
    app.store.set_alive(false);

    let response = app.request("GET", "/stats", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.get("error").is_some());
}

#[tokio::test]
async fn test_create_user_success() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"email": "bob@dylan.com", "password": "toto1234!"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "bob@dylan.com");
    let id = response.body["id"].as_str().expect("id is a string").to_string();

    let stored = app
        .store
        .users()
        .find_one(&UserFilter::by_email("bob@dylan.com"))
        .await
        .unwrap()
        .expect("user stored");
    assert_eq!(stored.id.to_string(), id);
    assert_ne!(stored.password, "toto1234!");
    assert!(stored.password.starts_with("$argon2id$"));

    let job = app
        .queues
        .email()
        .dequeue()
        .await
        .unwrap()
        .expect("welcome email queued");
    let payload: EmailJob = serde_json::from_value(job.payload).unwrap();
    assert_eq!(payload.user_id(), Some(id.as_str()));
}

#[tokio::test]
async fn test_create_user_missing_email() {
    let app = helpers::TestApp::new();

    let response = app
        .request("POST", "/users", Some(json!({"password": "toto1234!"})))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Missing email");
}

#[tokio::test]
async fn test_create_user_missing_password() {
    let app = helpers::TestApp::new();

    let response = app
        .request("POST", "/users", Some(json!({"email": "bob@dylan.com"})))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Missing password");
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"email": "not-an-email", "password": "toto1234!"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid email");
}

#[tokio::test]
async fn test_create_user_already_exists() {
    let app = helpers::TestApp::new();
    helpers::create_user(&app.store, "bob@dylan.com").await;

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"email": "bob@dylan.com", "password": "toto1234!"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Already exist");
    assert_eq!(app.store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_user_malformed_body() {
    let app = helpers::TestApp::new();

    let response = app
        .request_raw("POST", "/users", "email=bob".to_string())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Missing email");
}

#[tokio::test]
async fn test_create_user_survives_broker_outage() {
    let app = helpers::TestApp::new();
    app.email_queue.set_alive(false);

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"email": "bob@dylan.com", "password": "toto1234!"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(app.store.count_users().await.unwrap(), 1);
}
