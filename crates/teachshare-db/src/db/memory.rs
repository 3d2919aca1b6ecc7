//! In-memory implementations of every repository trait.
//!
//! One [`InMemoryDatabase`] plays all five roles over shared state, so the
//! cross-table behavior (document insert creating its rating, public search
//! hiding reported documents) matches the PostgreSQL schema.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use teachshare_core::models::{
    ContentFingerprint, DocumentMetadata, ModerationDecision, ModerationState, NewDocument,
    NewModerationDecision, NewReport, RatingAggregate, ReportRecord, SearchFilter, StoredObject,
    VisibilityScope,
};
use teachshare_core::validation::normalize_grade;
use teachshare_core::AppError;
use uuid::Uuid;

use super::document::DocumentRepository;
use super::moderation::ModerationLog;
use super::object_index::{ObjectIndex, RegisterOutcome};
use super::rating::RatingRepository;
use super::report::ReportRepository;

#[derive(Default)]
struct State {
    /// Insertion order; newest last.
    documents: Vec<DocumentMetadata>,
    objects: HashMap<ContentFingerprint, StoredObject>,
    ratings: HashMap<Uuid, RatingAggregate>,
    decisions: Vec<ModerationDecision>,
    reports: Vec<ReportRecord>,
}

impl State {
    fn document_mut(&mut self, id: Uuid) -> Result<&mut DocumentMetadata, AppError> {
        self.documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<State>>,
    fail_document_inserts: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `DocumentRepository::create` fail with a database error.
    pub fn set_fail_document_inserts(&self, fail: bool) {
        self.fail_document_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn stored_object_count(&self) -> usize {
        self.lock().objects.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn substring_matcher(term: &str) -> Result<Regex, AppError> {
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build matcher: {}", e)))
}

struct CompiledFilter {
    title: Option<Regex>,
    subject: Option<Regex>,
    grade: Option<(String, Regex)>,
    public_only: bool,
}

impl CompiledFilter {
    fn compile(filter: &SearchFilter) -> Result<Self, AppError> {
        Ok(Self {
            title: filter.title.as_deref().map(substring_matcher).transpose()?,
            subject: filter.subject.as_deref().map(substring_matcher).transpose()?,
            grade: filter
                .grade
                .as_deref()
                .map(|g| substring_matcher(g).map(|re| (g.to_string(), re)))
                .transpose()?,
            public_only: filter.scope == VisibilityScope::Public,
        })
    }

    fn matches(&self, doc: &DocumentMetadata) -> bool {
        if self.public_only && !doc.is_publicly_visible() {
            return false;
        }
        if let Some(re) = &self.title {
            if !re.is_match(&doc.title) {
                return false;
            }
        }
        if let Some(re) = &self.subject {
            if !re.is_match(&doc.subject) {
                return false;
            }
        }
        if let Some((exact, re)) = &self.grade {
            let stored = normalize_grade(&doc.grade);
            if stored != *exact && !re.is_match(&stored) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDatabase {
    async fn create(&self, document: NewDocument) -> Result<DocumentMetadata, AppError> {
        if self.fail_document_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::Protocol(
                "in-memory database configured to fail document inserts".to_string(),
            )));
        }

        let mut state = self.lock();
        if state.documents.iter().any(|d| d.id == document.id) {
            return Err(AppError::InvalidInput(format!(
                "Document {} already exists",
                document.id
            )));
        }

        let now = Utc::now();
        let metadata = DocumentMetadata {
            id: document.id,
            title: document.title,
            subject: document.subject,
            grade: document.grade,
            owner_id: document.owner_id,
            storage_key: document.storage_key,
            filename: document.filename,
            content_type: document.content_type,
            byte_length: document.byte_length,
            fingerprint: document.fingerprint,
            moderation_state: ModerationState::Pending,
            moderation_comments: None,
            reported: false,
            rating_id: document.rating_id,
            created_at: now,
            updated_at: now,
        };
        state.ratings.insert(
            metadata.id,
            RatingAggregate::empty(metadata.rating_id, metadata.id),
        );
        state.documents.push(metadata.clone());
        Ok(metadata)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentMetadata>, AppError> {
        Ok(self.lock().documents.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_filter(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<DocumentMetadata>, AppError> {
        let compiled = CompiledFilter::compile(filter)?;
        Ok(self
            .lock()
            .documents
            .iter()
            .rev()
            .filter(|d| compiled.matches(d))
            .cloned()
            .collect())
    }

    async fn update_moderation_state(
        &self,
        id: Uuid,
        state: ModerationState,
        comments: Option<String>,
    ) -> Result<DocumentMetadata, AppError> {
        let mut guard = self.lock();
        let doc = guard.document_mut(id)?;
        doc.moderation_state = state;
        doc.moderation_comments = comments;
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn set_reported(&self, id: Uuid) -> Result<(), AppError> {
        let mut guard = self.lock();
        let doc = guard.document_mut(id)?;
        doc.reported = true;
        doc.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ObjectIndex for InMemoryDatabase {
    async fn lookup(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<StoredObject>, AppError> {
        Ok(self.lock().objects.get(fingerprint).cloned())
    }

    async fn register(&self, object: StoredObject) -> Result<RegisterOutcome, AppError> {
        let mut state = self.lock();
        if let Some(existing) = state.objects.get(&object.fingerprint) {
            return Ok(RegisterOutcome::AlreadyPresent(existing.clone()));
        }
        state.objects.insert(object.fingerprint, object.clone());
        Ok(RegisterOutcome::Inserted(object))
    }
}

#[async_trait]
impl RatingRepository for InMemoryDatabase {
    async fn add_rating(
        &self,
        document_id: Uuid,
        score: i32,
    ) -> Result<RatingAggregate, AppError> {
        let mut state = self.lock();
        let rating = state.ratings.get_mut(&document_id).ok_or_else(|| {
            AppError::NotFound(format!("Rating for document {} not found", document_id))
        })?;
        rating.apply(score);
        Ok(rating.clone())
    }

    async fn get_by_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<RatingAggregate>, AppError> {
        Ok(self.lock().ratings.get(&document_id).cloned())
    }
}

#[async_trait]
impl ModerationLog for InMemoryDatabase {
    async fn record(
        &self,
        decision: NewModerationDecision,
    ) -> Result<ModerationDecision, AppError> {
        let record = ModerationDecision {
            id: Uuid::new_v4(),
            document_id: decision.document_id,
            reviewer_id: decision.reviewer_id,
            decision: decision.decision,
            comments: decision.comments,
            decided_at: Utc::now(),
        };
        self.lock().decisions.push(record.clone());
        Ok(record)
    }

    async fn history(&self, document_id: Uuid) -> Result<Vec<ModerationDecision>, AppError> {
        Ok(self
            .lock()
            .decisions
            .iter()
            .filter(|d| d.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReportRepository for InMemoryDatabase {
    async fn create(&self, report: NewReport) -> Result<ReportRecord, AppError> {
        let record = ReportRecord {
            id: Uuid::new_v4(),
            document_id: report.document_id,
            reporter_id: report.reporter_id,
            reason: report.reason,
            reported_at: Utc::now(),
        };
        self.lock().reports.push(record.clone());
        Ok(record)
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<ReportRecord>, AppError> {
        Ok(self
            .lock()
            .reports
            .iter()
            .rev()
            .filter(|r| r.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_document(title: &str, grade: &str, fingerprint: u8) -> NewDocument {
        NewDocument {
            id: Uuid::new_v4(),
            title: title.to_string(),
            subject: "Science".to_string(),
            grade: grade.to_string(),
            owner_id: "educator-1".to_string(),
            storage_key: format!("documents/{}.pdf", Uuid::new_v4()),
            filename: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            byte_length: 10,
            fingerprint: ContentFingerprint::from_digest([fingerprint; 32]),
            rating_id: Uuid::new_v4(),
        }
    }

    fn stored_object(fingerprint: u8, key: &str) -> StoredObject {
        StoredObject {
            fingerprint: ContentFingerprint::from_digest([fingerprint; 32]),
            storage_key: key.to_string(),
            bucket: "share2teach".to_string(),
            byte_length: 10,
            content_type: "application/pdf".to_string(),
            created_at: Utc::now(),
        }
    }

    fn reviewer_filter(title: Option<&str>, grade: Option<&str>) -> SearchFilter {
        SearchFilter::new(title, None, grade, VisibilityScope::Reviewer)
    }

    #[tokio::test]
    async fn test_create_also_creates_zero_rating() {
        let db = InMemoryDatabase::new();
        let doc = DocumentRepository::create(&db, new_document("Cells", "10", 1))
            .await
            .unwrap();

        assert_eq!(doc.moderation_state, ModerationState::Pending);
        let rating = db.get_by_document(doc.id).await.unwrap().unwrap();
        assert_eq!(rating.id, doc.rating_id);
        assert_eq!(rating.times_rated, 0);
    }

    #[tokio::test]
    async fn test_register_is_insert_if_absent() {
        let db = InMemoryDatabase::new();
        let first = db.register(stored_object(1, "documents/a.pdf")).await.unwrap();
        let second = db.register(stored_object(1, "documents/b.pdf")).await.unwrap();

        assert!(matches!(first, RegisterOutcome::Inserted(_)));
        match second {
            RegisterOutcome::AlreadyPresent(existing) => {
                assert_eq!(existing.storage_key, "documents/a.pdf")
            }
            other => panic!("expected AlreadyPresent, got {:?}", other),
        }
        assert_eq!(db.stored_object_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_miss_is_none() {
        let db = InMemoryDatabase::new();
        let missing = ContentFingerprint::from_digest([9; 32]);
        assert!(db.lookup(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_title_filter_is_literal_and_case_insensitive() {
        let db = InMemoryDatabase::new();
        DocumentRepository::create(&db, new_document("Photosynthesis Basics", "10", 1))
            .await
            .unwrap();
        DocumentRepository::create(&db, new_document("100% Effort", "10", 2))
            .await
            .unwrap();

        let hits = db
            .find_by_filter(&reviewer_filter(Some("PHOTO"), None))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let hits = db
            .find_by_filter(&reviewer_filter(Some("0%"), None))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Effort");

        let hits = db
            .find_by_filter(&reviewer_filter(Some(".*"), None))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_grade_filter_matches_normalized_forms() {
        let db = InMemoryDatabase::new();
        DocumentRepository::create(&db, new_document("Calculus", "Grade 12", 1))
            .await
            .unwrap();

        for term in ["Grade 12", "grade12", "12"] {
            let hits = db
                .find_by_filter(&reviewer_filter(None, Some(term)))
                .await
                .unwrap();
            assert_eq!(hits.len(), 1, "grade term {:?}", term);
        }
    }

    #[tokio::test]
    async fn test_public_scope_hides_pending_and_reported() {
        let db = InMemoryDatabase::new();
        let pending = DocumentRepository::create(&db, new_document("A", "9", 1))
            .await
            .unwrap();
        let approved = DocumentRepository::create(&db, new_document("B", "9", 2))
            .await
            .unwrap();
        db.update_moderation_state(approved.id, ModerationState::Approved, None)
            .await
            .unwrap();

        let public = db.find_by_filter(&SearchFilter::public()).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, approved.id);

        db.set_reported(approved.id).await.unwrap();
        assert!(db.find_by_filter(&SearchFilter::public()).await.unwrap().is_empty());

        let all = db.find_by_filter(&reviewer_filter(None, None)).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].id, approved.id);
        assert_eq!(all[1].id, pending.id);
    }

    #[tokio::test]
    async fn test_updates_on_missing_document_are_not_found() {
        let db = InMemoryDatabase::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            db.update_moderation_state(id, ModerationState::Approved, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(db.set_reported(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(db.add_rating(id, 3).await, Err(AppError::NotFound(_))));
    }
}
