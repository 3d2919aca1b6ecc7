use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use teachshare_core::models::{
    DocumentMetadata, ModerationState, NewDocument, SearchFilter, VisibilityScope,
};
use teachshare_core::validation::normalize_grade;
use teachshare_core::AppError;
use uuid::Uuid;

use super::deadline::with_deadline;
use super::transaction::TransactionGuard;

/// Document metadata records.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document together with its zeroed rating aggregate.
    ///
    /// Always creates a record, even when the content was deduplicated.
    async fn create(&self, document: NewDocument) -> Result<DocumentMetadata, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentMetadata>, AppError>;

    /// Matching documents, newest first. No match is an empty list.
    async fn find_by_filter(&self, filter: &SearchFilter)
        -> Result<Vec<DocumentMetadata>, AppError>;

    /// Fails with `NotFound` when no document has this id.
    async fn update_moderation_state(
        &self,
        id: Uuid,
        state: ModerationState,
        comments: Option<String>,
    ) -> Result<DocumentMetadata, AppError>;

    /// Fails with `NotFound` when no document has this id.
    async fn set_reported(&self, id: Uuid) -> Result<(), AppError>;
}

const DOCUMENT_COLUMNS: &str = "id, title, subject, grade, owner_id, storage_key, filename, \
     content_type, byte_length, fingerprint, moderation_state, moderation_comments, reported, \
     rating_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    subject: String,
    grade: String,
    owner_id: String,
    storage_key: String,
    filename: String,
    content_type: String,
    byte_length: i64,
    fingerprint: String,
    moderation_state: ModerationState,
    moderation_comments: Option<String>,
    reported: bool,
    rating_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self) -> Result<DocumentMetadata, AppError> {
        Ok(DocumentMetadata {
            id: self.id,
            title: self.title,
            subject: self.subject,
            grade: self.grade,
            owner_id: self.owner_id,
            storage_key: self.storage_key,
            filename: self.filename,
            content_type: self.content_type,
            byte_length: self.byte_length,
            fingerprint: self.fingerprint.parse().map_err(|_| {
                AppError::Internal(format!("Corrupt fingerprint on document {}", self.id))
            })?,
            moderation_state: self.moderation_state,
            moderation_comments: self.moderation_comments,
            reported: self.reported,
            rating_id: self.rating_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Escape `%`, `_` and `\` so user input matches literally under `LIKE ... ESCAPE '\'`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn insert(&self, document: NewDocument) -> Result<DocumentMetadata, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (
                id, title, subject, grade, grade_normalized, owner_id, storage_key,
                filename, content_type, byte_length, fingerprint, rating_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document.id)
        .bind(&document.title)
        .bind(&document.subject)
        .bind(&document.grade)
        .bind(normalize_grade(&document.grade))
        .bind(&document.owner_id)
        .bind(&document.storage_key)
        .bind(&document.filename)
        .bind(&document.content_type)
        .bind(document.byte_length)
        .bind(document.fingerprint.to_hex())
        .bind(document.rating_id)
        .fetch_one(tx.conn()?)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ratings (id, document_id, times_rated, total_rating, average_rating)
            VALUES ($1, $2, 0, 0, 0)
            "#,
        )
        .bind(document.rating_id)
        .bind(document.id)
        .execute(tx.conn()?)
        .await?;

        tx.commit().await?;
        row.into_document()
    }

    async fn select_by_id(&self, id: Uuid) -> Result<Option<DocumentMetadata>, AppError> {
        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::into_document).transpose()
    }

    async fn select_by_filter(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<DocumentMetadata>, AppError> {
        let rows = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            SELECT {}
            FROM documents
            WHERE ($1::text IS NULL OR title ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR subject ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR grade_normalized = $3 OR grade_normalized ILIKE $4 ESCAPE '\')
              AND (NOT $5 OR (moderation_state = 'approved' AND reported = FALSE))
            ORDER BY created_at DESC, id
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(filter.title.as_deref().map(contains_pattern))
        .bind(filter.subject.as_deref().map(contains_pattern))
        .bind(filter.grade.as_deref())
        .bind(filter.grade.as_deref().map(contains_pattern))
        .bind(filter.scope == VisibilityScope::Public)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    async fn update_state(
        &self,
        id: Uuid,
        state: ModerationState,
        comments: Option<String>,
    ) -> Result<DocumentMetadata, AppError> {
        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            UPDATE documents
            SET moderation_state = $2, moderation_comments = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(state)
        .bind(comments)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        row.into_document()
    }

    async fn mark_reported(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE documents SET reported = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    #[tracing::instrument(skip(self, document), fields(db.table = "documents", db.operation = "insert", db.record_id = %document.id))]
    async fn create(&self, document: NewDocument) -> Result<DocumentMetadata, AppError> {
        with_deadline(self.timeout, "documents.insert", self.insert(document)).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentMetadata>, AppError> {
        with_deadline(self.timeout, "documents.select", self.select_by_id(id)).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn find_by_filter(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<DocumentMetadata>, AppError> {
        with_deadline(self.timeout, "documents.search", self.select_by_filter(filter)).await
    }

    #[tracing::instrument(skip(self, comments), fields(db.table = "documents", db.operation = "update", db.record_id = %id))]
    async fn update_moderation_state(
        &self,
        id: Uuid,
        state: ModerationState,
        comments: Option<String>,
    ) -> Result<DocumentMetadata, AppError> {
        with_deadline(
            self.timeout,
            "documents.update_state",
            self.update_state(id, state, comments),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "update", db.record_id = %id))]
    async fn set_reported(&self, id: Uuid) -> Result<(), AppError> {
        with_deadline(self.timeout, "documents.set_reported", self.mark_reported(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_treats_wildcards_literally() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("photo"), "%photo%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
    }
}
