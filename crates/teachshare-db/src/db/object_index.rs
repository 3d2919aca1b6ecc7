use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use teachshare_core::models::{ContentFingerprint, StoredObject};
use teachshare_core::AppError;

use super::deadline::with_deadline;

/// Result of trying to register a canonical object.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// This call created the entry.
    Inserted(StoredObject),
    /// Another writer registered the same fingerprint first; carries its entry.
    AlreadyPresent(StoredObject),
}

impl RegisterOutcome {
    pub fn object(&self) -> &StoredObject {
        match self {
            RegisterOutcome::Inserted(object) | RegisterOutcome::AlreadyPresent(object) => object,
        }
    }

    pub fn into_object(self) -> StoredObject {
        match self {
            RegisterOutcome::Inserted(object) | RegisterOutcome::AlreadyPresent(object) => object,
        }
    }
}

/// Deduplication index: fingerprint to the single stored copy of that content.
#[async_trait]
pub trait ObjectIndex: Send + Sync {
    /// Exact fingerprint match. A miss is `Ok(None)`.
    async fn lookup(&self, fingerprint: &ContentFingerprint)
        -> Result<Option<StoredObject>, AppError>;

    /// Insert the entry unless the fingerprint is already registered.
    async fn register(&self, object: StoredObject) -> Result<RegisterOutcome, AppError>;
}

const OBJECT_COLUMNS: &str =
    "fingerprint, storage_key, bucket, byte_length, content_type, created_at";

#[derive(sqlx::FromRow)]
struct StoredObjectRow {
    fingerprint: String,
    storage_key: String,
    bucket: String,
    byte_length: i64,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl StoredObjectRow {
    fn into_stored_object(self) -> Result<StoredObject, AppError> {
        Ok(StoredObject {
            fingerprint: self.fingerprint.parse().map_err(|_| {
                AppError::Internal(format!(
                    "Corrupt fingerprint for stored object {}",
                    self.storage_key
                ))
            })?,
            storage_key: self.storage_key,
            bucket: self.bucket,
            byte_length: self.byte_length,
            content_type: self.content_type,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresObjectIndex {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresObjectIndex {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn select(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<StoredObject>, AppError> {
        let row = sqlx::query_as::<Postgres, StoredObjectRow>(&format!(
            "SELECT {} FROM stored_objects WHERE fingerprint = $1",
            OBJECT_COLUMNS
        ))
        .bind(fingerprint.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredObjectRow::into_stored_object).transpose()
    }

    async fn insert_if_absent(&self, object: StoredObject) -> Result<RegisterOutcome, AppError> {
        let inserted = sqlx::query_as::<Postgres, StoredObjectRow>(&format!(
            r#"
            INSERT INTO stored_objects (fingerprint, storage_key, bucket, byte_length, content_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (fingerprint) DO NOTHING
            RETURNING {}
            "#,
            OBJECT_COLUMNS
        ))
        .bind(object.fingerprint.to_hex())
        .bind(&object.storage_key)
        .bind(&object.bucket)
        .bind(object.byte_length)
        .bind(&object.content_type)
        .bind(object.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(RegisterOutcome::Inserted(row.into_stored_object()?));
        }

        // Entries are never deleted, so the conflicting row is still there.
        let existing = self.select(&object.fingerprint).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "Stored object {} conflicted but could not be read back",
                object.fingerprint
            ))
        })?;
        Ok(RegisterOutcome::AlreadyPresent(existing))
    }
}

#[async_trait]
impl ObjectIndex for PostgresObjectIndex {
    #[tracing::instrument(skip(self), fields(db.table = "stored_objects", db.operation = "select", fingerprint = %fingerprint))]
    async fn lookup(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<StoredObject>, AppError> {
        with_deadline(self.timeout, "stored_objects.select", self.select(fingerprint)).await
    }

    #[tracing::instrument(skip(self, object), fields(db.table = "stored_objects", db.operation = "insert", fingerprint = %object.fingerprint))]
    async fn register(&self, object: StoredObject) -> Result<RegisterOutcome, AppError> {
        with_deadline(
            self.timeout,
            "stored_objects.insert",
            self.insert_if_absent(object),
        )
        .await
    }
}
