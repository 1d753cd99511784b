//! Submission recording
//!
//! Runs after the client has uploaded every file of a batch. Fields are sanitized,
//! the referenced keys are checked against the caller's prefix and (optionally)
//! against storage, and the record is written once.

use crate::auth::Identity;
use chrono::Utc;
use docket_core::models::{SubmissionFields, SubmissionRecord};
use docket_core::validation::{parse_positive, sanitize_text, FieldError, MAX_NOTE_LENGTH};
use docket_core::AppError;
use docket_db::SubmissionStore;
use docket_storage::{is_owned_by, Storage, StorageError};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error(transparent)]
    InvalidField(#[from] FieldError),

    #[error("no uploaded files referenced")]
    NoFiles,

    #[error("file key referenced more than once: {0}")]
    DuplicateKey(String),

    #[error("file key does not belong to the caller: {0}")]
    ForeignKey(String),

    #[error("uploaded file not found: {0}")]
    MissingObject(String),

    #[error("failed to check uploaded files: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to persist submission: {0}")]
    Persistence(AppError),
}

impl From<RecorderError> for AppError {
    fn from(err: RecorderError) -> Self {
        match err {
            RecorderError::Storage(e) => AppError::Storage(e.to_string()),
            RecorderError::Persistence(e) => e,
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

pub struct MetadataRecorder {
    storage: Arc<dyn Storage>,
    store: Arc<dyn SubmissionStore>,
    verify_objects: bool,
}

impl MetadataRecorder {
    pub fn new(
        storage: Arc<dyn Storage>,
        store: Arc<dyn SubmissionStore>,
        verify_objects: bool,
    ) -> Self {
        Self {
            storage,
            store,
            verify_objects,
        }
    }

    pub async fn record(
        &self,
        owner: &Identity,
        fields: SubmissionFields,
        storage_keys: Vec<String>,
    ) -> Result<SubmissionRecord, RecorderError> {
        let year = parse_positive("year", &fields.year)?;
        let code = parse_positive("code", &fields.code)?;
        let file_number = parse_positive("fileNumber", &fields.file_number)?;
        let note = fields
            .note
            .as_deref()
            .map(|n| sanitize_text(n, MAX_NOTE_LENGTH))
            .filter(|n| !n.is_empty());

        let keys = self.check_keys(owner, storage_keys).await?;

        let record = SubmissionRecord {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            year,
            code,
            file_number,
            tribunal_type: fields.tribunal_type,
            case_type: fields.case_type,
            note,
            storage_keys: keys,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.put(&record).await {
            tracing::error!(
                error = %e,
                identity = %owner,
                storage_keys = ?record.storage_keys,
                "Submission not persisted, uploaded objects are orphaned"
            );
            return Err(RecorderError::Persistence(e));
        }

        tracing::info!(
            submission_id = %record.id,
            identity = %owner,
            file_count = record.storage_keys.len(),
            tribunal_type = %record.tribunal_type,
            case_type = %record.case_type,
            "Submission recorded"
        );

        Ok(record)
    }

    /// A record is only visible to its owner.
    pub async fn fetch(&self, owner: &Identity, id: Uuid) -> Result<SubmissionRecord, AppError> {
        self.store
            .get(id)
            .await?
            .filter(|record| record.owner == owner.as_str())
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    async fn check_keys(
        &self,
        owner: &Identity,
        storage_keys: Vec<String>,
    ) -> Result<BTreeSet<String>, RecorderError> {
        if storage_keys.is_empty() {
            return Err(RecorderError::NoFiles);
        }

        let mut keys = BTreeSet::new();
        for key in storage_keys {
            if !is_owned_by(&key, owner.as_str()) {
                return Err(RecorderError::ForeignKey(key));
            }
            if keys.contains(&key) {
                return Err(RecorderError::DuplicateKey(key));
            }
            keys.insert(key);
        }

        if self.verify_objects {
            let present = try_join_all(keys.iter().map(|key| async move {
                self.storage.exists(key).await.map(|found| (key, found))
            }))
            .await?;

            if let Some((missing, _)) = present.into_iter().find(|(_, found)| !found) {
                return Err(RecorderError::MissingObject(missing.clone()));
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::models::{CaseType, TribunalType};
    use docket_core::ErrorMetadata;
    use docket_db::MemorySubmissionStore;
    use docket_storage::{MemoryStorage, UploadSigner};
    use std::time::Duration;

    fn fields() -> SubmissionFields {
        SubmissionFields {
            year: "2024".to_string(),
            code: "12".to_string(),
            file_number: "345".to_string(),
            tribunal_type: TribunalType::Civil,
            case_type: CaseType::Hearings,
            note: Some("  first <script>hearing</script> ".to_string()),
        }
    }

    async fn stored_key(storage: &MemoryStorage, owner: &str) -> String {
        let key = docket_storage::next_key(owner, "application/pdf").unwrap();
        let grant = storage
            .presign_put(&key, "application/pdf", 3, Duration::from_secs(60))
            .unwrap();
        storage
            .put_object(&grant.url, "application/pdf", 3, bytes::Bytes::from_static(b"pdf"))
            .await
            .unwrap();
        key
    }

    fn recorder(storage: Arc<MemoryStorage>, store: Arc<MemorySubmissionStore>) -> MetadataRecorder {
        MetadataRecorder::new(storage, store, true)
    }

    #[tokio::test]
    async fn records_sanitized_fields_and_keys() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let store = Arc::new(MemorySubmissionStore::new());
        let owner = Identity::new("amina");
        let a = stored_key(&storage, "amina").await;
        let b = stored_key(&storage, "amina").await;

        let record = recorder(storage, store.clone())
            .record(&owner, fields(), vec![a.clone(), b.clone()])
            .await
            .unwrap();

        assert_eq!(record.year, 2024);
        assert_eq!(record.file_number, 345);
        assert_eq!(record.note.as_deref(), Some("first scripthearingscript"));
        assert_eq!(record.storage_keys, BTreeSet::from([a, b]));
        assert_eq!(store.get(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn rejects_bad_key_lists() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let store = Arc::new(MemorySubmissionStore::new());
        let owner = Identity::new("amina");
        let mine = stored_key(&storage, "amina").await;
        let theirs = stored_key(&storage, "omar").await;
        let recorder = recorder(storage, store.clone());

        assert!(matches!(
            recorder.record(&owner, fields(), vec![]).await,
            Err(RecorderError::NoFiles)
        ));
        assert!(matches!(
            recorder
                .record(&owner, fields(), vec![mine.clone(), mine.clone()])
                .await,
            Err(RecorderError::DuplicateKey(_))
        ));
        assert!(matches!(
            recorder.record(&owner, fields(), vec![mine, theirs]).await,
            Err(RecorderError::ForeignKey(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_keys_never_uploaded() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let store = Arc::new(MemorySubmissionStore::new());
        let owner = Identity::new("amina");
        let never_uploaded = docket_storage::next_key("amina", "image/png").unwrap();

        let err = recorder(storage, store)
            .record(&owner, fields(), vec![never_uploaded])
            .await
            .unwrap_err();
        assert!(matches!(err, RecorderError::MissingObject(_)));
    }

    #[tokio::test]
    async fn rejects_unparseable_numbers() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let store = Arc::new(MemorySubmissionStore::new());
        let owner = Identity::new("amina");
        let key = stored_key(&storage, "amina").await;
        let mut bad = fields();
        bad.code = "abc".to_string();

        let err = recorder(storage, store)
            .record(&owner, bad, vec![key])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecorderError::InvalidField(FieldError::NotPositive { field: "code" })
        ));
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl SubmissionStore for FailingStore {
        async fn put(&self, _record: &SubmissionRecord) -> Result<(), AppError> {
            Err(AppError::Internal("connection lost".to_string()))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<SubmissionRecord>, AppError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_uploads_in_storage() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let a = stored_key(&storage, "amina").await;
        let b = stored_key(&storage, "amina").await;
        let recorder = MetadataRecorder::new(storage.clone(), Arc::new(FailingStore), true);

        let err = recorder
            .record(&Identity::new("amina"), fields(), vec![a.clone(), b.clone()])
            .await
            .unwrap_err();

        assert!(matches!(err, RecorderError::Persistence(_)));
        assert_eq!(AppError::from(err).http_status_code(), 500);
        assert!(storage.get(&a).await.is_some());
        assert!(storage.get(&b).await.is_some());
    }

    #[tokio::test]
    async fn fetch_is_scoped_to_owner() {
        let storage = Arc::new(MemoryStorage::new().unwrap());
        let store = Arc::new(MemorySubmissionStore::new());
        let key = stored_key(&storage, "amina").await;
        let recorder = recorder(storage, store);
        let record = recorder
            .record(&Identity::new("amina"), fields(), vec![key])
            .await
            .unwrap();

        assert!(recorder.fetch(&Identity::new("amina"), record.id).await.is_ok());
        assert!(matches!(
            recorder.fetch(&Identity::new("omar"), record.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
