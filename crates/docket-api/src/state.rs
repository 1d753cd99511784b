//! Application state shared by all handlers.
//!
//! Everything here is immutable after startup; handlers take `State<Arc<AppState>>`.

use crate::auth::SessionResolver;
use crate::services::{CredentialIssuer, MetadataRecorder};
use docket_core::Config;
use docket_db::SubmissionStore;
use docket_storage::{Storage, StorageHandles};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resolver: Arc<dyn SessionResolver>,
    pub issuer: Arc<CredentialIssuer>,
    pub recorder: Arc<MetadataRecorder>,
    pub storage: Arc<dyn Storage>,
    /// Present when submissions are stored in Postgres
    pub pool: Option<PgPool>,
    pub is_production: bool,
}

impl AppState {
    /// Wire the upload services from configuration and their collaborators.
    pub fn new(
        config: Config,
        resolver: Arc<dyn SessionResolver>,
        storage: StorageHandles,
        store: Arc<dyn SubmissionStore>,
        pool: Option<PgPool>,
    ) -> Self {
        let issuer = CredentialIssuer::new(
            resolver.clone(),
            storage.signer.clone(),
            config.upload_policy(),
            Duration::from_secs(config.upload_expiry_seconds()),
        );
        let recorder = MetadataRecorder::new(
            storage.storage.clone(),
            store,
            config.verify_uploaded_objects(),
        );

        Self {
            is_production: config.is_production(),
            config,
            resolver,
            issuer: Arc::new(issuer),
            recorder: Arc::new(recorder),
            storage: storage.storage,
            pool,
        }
    }
}
