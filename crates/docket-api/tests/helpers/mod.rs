//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p docket-api`. Everything runs in-process
//! against the memory storage backend and the in-memory submission store.

pub mod auth;

use axum_test::TestServer;
use bytes::Bytes;
use docket_api::auth::{JwtSessionResolver, SessionResolver};
use docket_api::setup::routes;
use docket_api::state::AppState;
use docket_core::models::UploadCredential;
use docket_core::{BaseConfig, Config, ServiceConfig, StorageBackend};
use docket_db::{MemorySubmissionStore, SubmissionStore};
use docket_storage::{MemoryStorage, StorageHandles};
use std::sync::Arc;

/// Test application: server plus the backends it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
    pub store: Arc<MemorySubmissionStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Play the browser's part: PUT `body` to the credential's URL.
    pub async fn upload(&self, credential: &UploadCredential, content_type: &str, body: &[u8]) {
        self.storage
            .put_object(
                &credential.url,
                content_type,
                body.len() as u64,
                Bytes::copy_from_slice(body),
            )
            .await
            .expect("upload through presigned URL should succeed");
    }
}

pub fn test_config() -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            environment: "test".to_string(),
        },
        database_url: None,
        storage_backend: StorageBackend::Memory,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        aws_access_key_id: None,
        aws_secret_access_key: None,
        aws_session_token: None,
        upload_allowed_types: docket_core::validation::policy::DEFAULT_ALLOWED_TYPES
            .iter()
            .map(|t| t.to_string())
            .collect(),
        upload_max_bytes: docket_core::validation::policy::AUTHORITATIVE_MAX_BYTES,
        upload_max_files: docket_core::validation::policy::DEFAULT_MAX_FILES,
        upload_expiry_seconds: 300,
        verify_uploaded_objects: true,
        session_jwt_secret: auth::TEST_JWT_SECRET.to_string(),
        session_jwt_issuer: None,
        session_jwt_audience: None,
    }))
}

/// Setup test app with memory storage and an in-memory submission store.
pub async fn setup_test_app() -> TestApp {
    let config = test_config();
    let storage = Arc::new(MemoryStorage::new().expect("Failed to create memory storage"));
    let store = Arc::new(MemorySubmissionStore::new());
    let resolver: Arc<dyn SessionResolver> = Arc::new(JwtSessionResolver::new(
        config.session_jwt_secret(),
        None,
        None,
    ));

    let state = Arc::new(AppState::new(
        config.clone(),
        resolver,
        StorageHandles::from_backend(storage.clone()),
        store.clone() as Arc<dyn SubmissionStore>,
        None,
    ));
    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        storage,
        store,
    }
}
