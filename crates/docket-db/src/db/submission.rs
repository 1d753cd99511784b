use chrono::{DateTime, Utc};
use docket_core::models::{CaseType, SubmissionRecord, TribunalType};
use docket_core::AppError;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for submission repository operations
/// This abstracts the database implementation (PostgreSQL or in-memory)
#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new record. Records are immutable once written.
    async fn put(&self, record: &SubmissionRecord) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, AppError>;
}

/// Pick the store for the environment: Postgres when a pool is available.
pub fn create_submission_store(pool: Option<PgPool>) -> Arc<dyn SubmissionStore> {
    match pool {
        Some(pool) => Arc::new(PgSubmissionStore::new(pool)),
        None => {
            tracing::warn!("No database configured, submissions are kept in memory only");
            Arc::new(MemorySubmissionStore::new())
        }
    }
}

/// Repository for case submissions
#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_db_int(field: &str, value: u32) -> Result<i32, AppError> {
    i32::try_from(value)
        .map_err(|_| AppError::InvalidInput(format!("{} is out of range", field)))
}

fn record_from_row(row: PgRow) -> Result<SubmissionRecord, AppError> {
    let positive = |field: &str| -> Result<u32, AppError> {
        let value: i32 = row.try_get(field)?;
        u32::try_from(value)
            .map_err(|_| AppError::Internal(format!("stored {} is negative", field)))
    };
    let tribunal: i16 = row.try_get("tribunal_type")?;
    let case: i16 = row.try_get("case_type")?;
    let keys: Vec<String> = row.try_get("storage_keys")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(SubmissionRecord {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        year: positive("year")?,
        code: positive("code")?,
        file_number: positive("file_number")?,
        tribunal_type: u8::try_from(tribunal)
            .map_err(|e| AppError::Internal(e.to_string()))
            .and_then(|v| TribunalType::try_from(v).map_err(AppError::Internal))?,
        case_type: u8::try_from(case)
            .map_err(|e| AppError::Internal(e.to_string()))
            .and_then(|v| CaseType::try_from(v).map_err(AppError::Internal))?,
        note: row.try_get("note")?,
        storage_keys: keys.into_iter().collect::<BTreeSet<_>>(),
        created_at,
    })
}

#[async_trait::async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn put(&self, record: &SubmissionRecord) -> Result<(), AppError> {
        let keys: Vec<String> = record.storage_keys.iter().cloned().collect();

        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, owner, year, code, file_number,
                tribunal_type, case_type, note, storage_keys, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(&record.owner)
        .bind(to_db_int("year", record.year)?)
        .bind(to_db_int("code", record.code)?)
        .bind(to_db_int("fileNumber", record.file_number)?)
        .bind(u8::from(record.tribunal_type) as i16)
        .bind(u8::from(record.case_type) as i16)
        .bind(&record.note)
        .bind(&keys)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            submission_id = %record.id,
            owner = %record.owner,
            file_count = keys.len(),
            "Submission inserted"
        );

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                id, owner, year, code, file_number,
                tribunal_type, case_type, note, storage_keys, created_at
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(record_from_row).transpose()
    }
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Clone, Default)]
pub struct MemorySubmissionStore {
    records: Arc<RwLock<HashMap<Uuid, SubmissionRecord>>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn put(&self, record: &SubmissionRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(AppError::Internal(format!(
                "submission {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }
}
