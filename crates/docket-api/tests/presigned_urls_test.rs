//! Credential issuance integration tests.
//!
//! Run with: `cargo test -p docket-api --test presigned_urls_test`

mod helpers;

use chrono::{Duration as ChronoDuration, Utc};
use docket_api::ErrorResponse;
use docket_core::models::UploadCredential;
use docket_storage::GrantError;
use helpers::auth::test_user;
use helpers::setup_test_app;
use serde_json::json;

#[tokio::test]
async fn test_valid_batch_returns_aligned_credentials() {
    let app = setup_test_app().await;
    let user = test_user("amina");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({
            "files": [
                {"fileType": "image/png", "fileSize": 500000},
                {"fileType": "application/pdf", "fileSize": 1200},
                {"fileType": "image/jpeg", "fileSize": 42}
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let credentials: Vec<UploadCredential> = response.json();
    assert_eq!(credentials.len(), 3);
    assert!(credentials[0].storage_key.ends_with("-png"));
    assert!(credentials[1].storage_key.ends_with("-pdf"));
    assert!(credentials[2].storage_key.ends_with("-jpeg"));
    for credential in &credentials {
        assert!(credential.storage_key.starts_with("uploads/amina/"));
        assert!(credential.url.contains("X-Amz-Signature="));
        assert!(credential.expires_at > Utc::now());
    }
    assert_ne!(credentials[0].storage_key, credentials[1].storage_key);
    assert!(app.storage.is_empty().await);
}

#[tokio::test]
async fn test_session_cookies_are_accepted() {
    let app = setup_test_app().await;
    let user = test_user("omar");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Cookie", user.cookie())
        .json(&json!({"files": [{"fileType": "image/webp", "fileSize": 10}]}))
        .await;

    assert_eq!(response.status_code(), 200);
    let credentials: Vec<UploadCredential> = response.json();
    assert!(credentials[0]
        .storage_key
        .starts_with(&format!("uploads/{}/", user.username)));
}

#[tokio::test]
async fn test_unsupported_type_rejects_whole_batch() {
    let app = setup_test_app().await;
    let user = test_user("amina");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({
            "files": [
                {"fileType": "image/png", "fileSize": 10},
                {"fileType": "application/zip", "fileSize": 10}
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "POLICY_REJECTED");
    assert_eq!(body.violations.len(), 1);
    assert_eq!(body.violations[0].index, 1);
    assert_eq!(body.violations[0].content_type, "application/zip");
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let app = setup_test_app().await;
    let user = test_user("amina");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({"files": [{"fileType": "application/pdf", "fileSize": 10485761u64}]}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "POLICY_REJECTED");
}

#[tokio::test]
async fn test_unauthenticated_regardless_of_batch() {
    let app = setup_test_app().await;

    for body in [
        json!({"files": [{"fileType": "image/png", "fileSize": 10}]}),
        json!({"files": [{"fileType": "application/zip", "fileSize": 10}]}),
        json!({"files": []}),
        json!({"nothing": true}),
    ] {
        let response = app.client().post("/presigned-urls").json(&body).await;
        assert_eq!(response.status_code(), 401);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "UNAUTHORIZED");
    }

    // Only one of the two session tokens
    let user = test_user("amina");
    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .json(&json!({"files": [{"fileType": "image/png", "fileSize": 10}]}))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_empty_or_malformed_files_input() {
    let app = setup_test_app().await;
    let user = test_user("amina");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({"files": []}))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Invalid files input");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({"files": [{"fileType": "image/png", "fileSize": -3}]}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_credential_binds_type_and_length() {
    let app = setup_test_app().await;
    let user = test_user("amina");

    let response = app
        .client()
        .post("/presigned-urls")
        .add_header("Authorization", user.bearer())
        .add_header("X-Id-Token", user.id_token.clone())
        .json(&json!({"files": [{"fileType": "image/png", "fileSize": 4}]}))
        .await;
    let credentials: Vec<UploadCredential> = response.json();
    let url = &credentials[0].url;

    let wrong_type = app
        .storage
        .put_object(url, "image/jpeg", 4, bytes::Bytes::from_static(b"abcd"))
        .await;
    assert!(matches!(wrong_type, Err(GrantError::SignatureMismatch)));

    let wrong_length = app
        .storage
        .put_object(url, "image/png", 5, bytes::Bytes::from_static(b"abcde"))
        .await;
    assert!(matches!(wrong_length, Err(GrantError::SignatureMismatch)));

    let late = app
        .storage
        .put_object_at(
            url,
            "image/png",
            4,
            bytes::Bytes::from_static(b"abcd"),
            Utc::now() + ChronoDuration::seconds(301),
        )
        .await;
    assert!(matches!(late, Err(GrantError::Expired { .. })));
    assert!(app.storage.is_empty().await);

    app.upload(&credentials[0], "image/png", b"abcd").await;
    let stored = app
        .storage
        .get(&credentials[0].storage_key)
        .await
        .expect("object stored");
    assert_eq!(stored.content_type, "image/png");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/health")
        .add_header("X-Request-ID", "req-123")
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("X-Request-ID"), "req-123");
}
