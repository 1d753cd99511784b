//! Service wiring

use crate::auth::{JwtSessionResolver, SessionResolver};
use crate::state::AppState;
use docket_core::Config;
use docket_db::create_submission_store;
use docket_storage::StorageHandles;
use sqlx::PgPool;
use std::sync::Arc;

/// Build the session resolver, submission store and upload services.
pub fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    storage: StorageHandles,
) -> Arc<AppState> {
    let resolver: Arc<dyn SessionResolver> = Arc::new(JwtSessionResolver::new(
        config.session_jwt_secret(),
        config.session_jwt_issuer(),
        config.session_jwt_audience(),
    ));
    let store = create_submission_store(pool.clone());

    let policy = config.upload_policy();
    tracing::info!(
        allowed_types = %policy.allowed_types.join(","),
        max_bytes = policy.max_bytes,
        max_files = policy.max_files,
        expiry_secs = config.upload_expiry_seconds(),
        verify_uploaded_objects = config.verify_uploaded_objects(),
        "Upload services initialized"
    );

    Arc::new(AppState::new(
        config.clone(),
        resolver,
        storage,
        store,
        pool,
    ))
}
