//! Storage setup and initialization

use anyhow::Result;
use docket_core::{Config, StorageBackend};
use docket_storage::{create_storage, StorageHandles};

pub fn setup_storage(config: &Config) -> Result<StorageHandles> {
    tracing::info!("Initializing storage...");
    let handles = create_storage(config)?;
    let backend_type = handles.storage.backend_type();

    if backend_type == StorageBackend::Memory {
        tracing::warn!("Memory storage backend selected, uploaded objects live in this process only");
    }

    tracing::info!(
        backend = %backend_type,
        bucket = config.s3_bucket().unwrap_or("-"),
        endpoint = config.s3_endpoint().unwrap_or("aws"),
        "Storage initialized successfully"
    );

    Ok(handles)
}
