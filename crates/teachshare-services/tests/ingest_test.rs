mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use helpers::{setup_test_app, setup_test_app_with, BUCKET, OWNER};
use teachshare_core::models::{ContentFingerprint, ModerationState, StoredObject, VisibilityScope};
use teachshare_core::AppError;
use teachshare_db::{InMemoryDatabase, ObjectIndex, RegisterOutcome, Repositories};
use teachshare_services::{TeachShare, TeachShareSettings};
use teachshare_storage::MemoryStorage;

/// Index whose lookups always miss, so every upload reaches `register` as
/// if a concurrent writer had won between the lookup and the write.
struct StaleLookupIndex {
    inner: InMemoryDatabase,
}

#[async_trait]
impl ObjectIndex for StaleLookupIndex {
    async fn lookup(
        &self,
        _fingerprint: &ContentFingerprint,
    ) -> Result<Option<StoredObject>, AppError> {
        Ok(None)
    }

    async fn register(&self, object: StoredObject) -> Result<RegisterOutcome, AppError> {
        self.inner.register(object).await
    }
}

#[tokio::test]
async fn test_text_upload_is_normalized_and_stored_once() {
    let t = setup_test_app();
    let input = b"Line1\nLine2".to_vec();

    let doc = t
        .app
        .ingest(input.clone(), "notes.txt", OWNER, "Notes", "English", "10")
        .await
        .unwrap();

    assert_eq!(doc.moderation_state, ModerationState::Pending);
    assert!(!doc.reported);
    assert_eq!(doc.filename, "notes.pdf");
    assert_eq!(doc.content_type, "application/pdf");
    assert!(doc.storage_key.starts_with("documents/"));
    assert!(doc.storage_key.ends_with(".pdf"));
    assert_eq!(t.storage.put_count(), 1);

    let stored = t.app.content(doc.id, VisibilityScope::Reviewer).await.unwrap();
    assert!(stored.starts_with(b"%PDF"));
    assert_ne!(stored, input);
    assert_eq!(stored.len() as i64, doc.byte_length);

    let rating = t.app.rating(doc.id).await.unwrap();
    assert_eq!(rating.id, doc.rating_id);
    assert_eq!(rating.times_rated, 0);
}

#[tokio::test]
async fn test_identical_content_reuses_stored_object() {
    let t = setup_test_app();

    let first = t.ingest_text("Line1\nLine2", "Notes", "English", "10").await;
    let second = t
        .ingest_text("Line1\nLine2", "Same notes, new title", "English", "11")
        .await;

    assert_eq!(t.storage.put_count(), 1);
    assert_eq!(t.storage.object_count(), 1);
    assert_ne!(first.id, second.id);
    assert_ne!(first.rating_id, second.rating_id);
    assert_eq!(first.storage_key, second.storage_key);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(t.db.document_count(), 2);
    assert_eq!(t.db.stored_object_count(), 1);
}

#[tokio::test]
async fn test_canonical_pdf_upload_deduplicates_against_converted_text() {
    let t = setup_test_app();
    let doc = t.ingest_text("Line1\nLine2", "Notes", "English", "10").await;
    let pdf = t.app.content(doc.id, VisibilityScope::Reviewer).await.unwrap();

    let copy = t
        .app
        .ingest(pdf, "copy.pdf", OWNER, "Copy", "English", "10")
        .await
        .unwrap();

    assert_eq!(copy.filename, "copy.pdf");
    assert_eq!(copy.storage_key, doc.storage_key);
    assert_eq!(t.storage.put_count(), 1);
}

#[tokio::test]
async fn test_long_text_spans_multiple_pages() {
    let t = setup_test_app();
    let text: Vec<String> = (1..=60).map(|i| format!("Line {}", i)).collect();
    let doc = t.ingest_text(&text.join("\n"), "Long", "History", "12").await;

    let pdf = t.app.content(doc.id, VisibilityScope::Reviewer).await.unwrap();
    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(parsed.get_pages().len(), 3);
}

#[tokio::test]
async fn test_binary_upload_is_unsupported() {
    let t = setup_test_app();
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    let result = t
        .app
        .ingest(png, "diagram.png", OWNER, "Diagram", "Science", "8")
        .await;

    assert!(matches!(result, Err(AppError::UnsupportedInputKind(_))));
    assert_eq!(t.storage.put_count(), 0);
    assert_eq!(t.db.document_count(), 0);
}

#[tokio::test]
async fn test_invalid_uploads_are_rejected_before_storage() {
    let t = setup_test_app_with(TeachShareSettings {
        max_document_size_bytes: 16,
        presigned_url_expiry: Duration::from_secs(60),
    });

    let empty = t
        .app
        .ingest(Vec::new(), "empty.txt", OWNER, "Empty", "Maths", "9")
        .await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let too_large = t
        .app
        .ingest(vec![b'a'; 17], "big.txt", OWNER, "Big", "Maths", "9")
        .await;
    assert!(matches!(too_large, Err(AppError::PayloadTooLarge(_))));

    let no_owner = t
        .app
        .ingest(b"hello".to_vec(), "a.txt", "  ", "Title", "Maths", "9")
        .await;
    assert!(matches!(no_owner, Err(AppError::InvalidInput(_))));

    let no_title = t
        .app
        .ingest(b"hello".to_vec(), "a.txt", OWNER, "", "Maths", "9")
        .await;
    assert!(matches!(no_title, Err(AppError::InvalidInput(_))));

    assert_eq!(t.storage.put_count(), 0);
}

#[tokio::test]
async fn test_storage_failure_creates_no_records() {
    let t = setup_test_app();
    t.storage.set_fail_writes(true);

    let result = t
        .app
        .ingest(b"Line1".to_vec(), "notes.txt", OWNER, "Notes", "English", "10")
        .await;

    assert!(matches!(result, Err(AppError::StorageWriteFailed(_))));
    assert_eq!(t.db.document_count(), 0);
    assert_eq!(t.db.stored_object_count(), 0);
}

#[tokio::test]
async fn test_registered_object_survives_metadata_failure() {
    let t = setup_test_app();
    t.db.set_fail_document_inserts(true);

    let failed = t
        .app
        .ingest(b"Line1".to_vec(), "notes.txt", OWNER, "Notes", "English", "10")
        .await;
    assert!(matches!(failed, Err(AppError::Database(_))));
    assert_eq!(t.storage.object_count(), 1);
    assert_eq!(t.db.stored_object_count(), 1);

    t.db.set_fail_document_inserts(false);
    let doc = t.ingest_text("Line1", "Notes", "English", "10").await;

    assert_eq!(t.storage.put_count(), 1);
    assert!(t.storage.has_object(&doc.storage_key));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_uploads_keep_one_object() {
    let t = setup_test_app();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = t.app.clone();
            tokio::spawn(async move {
                app.ingest(
                    b"Shared worksheet\nQuestion 1".to_vec(),
                    "worksheet.txt",
                    OWNER,
                    &format!("Worksheet {}", i),
                    "Maths",
                    "7",
                )
                .await
            })
        })
        .collect();

    let docs: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(docs.len(), 8);
    assert_eq!(t.db.document_count(), 8);
    assert_eq!(t.db.stored_object_count(), 1);
    assert_eq!(t.storage.object_count(), 1);
    let key = &docs[0].storage_key;
    assert!(docs.iter().all(|d| &d.storage_key == key));
    assert!(t.storage.has_object(key));
}

#[tokio::test]
async fn test_losing_writer_discards_its_object_and_adopts_winner() {
    let db = InMemoryDatabase::new();
    let storage = MemoryStorage::new(BUCKET);
    let mut repos = Repositories::in_memory(db.clone());
    repos.objects = Arc::new(StaleLookupIndex { inner: db.clone() });
    let app = TeachShare::new(
        repos,
        Arc::new(storage.clone()),
        TeachShareSettings::default(),
    );

    let first = app
        .ingest(b"x\ny".to_vec(), "a.txt", OWNER, "First", "Maths", "7")
        .await
        .unwrap();
    let second = app
        .ingest(b"x\ny".to_vec(), "b.txt", OWNER, "Second", "Maths", "7")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.storage_key, second.storage_key);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(storage.put_count(), 2);
    assert_eq!(storage.object_count(), 1);
    assert!(storage.has_object(&first.storage_key));
    assert_eq!(db.stored_object_count(), 1);
    assert_eq!(db.document_count(), 2);
}
