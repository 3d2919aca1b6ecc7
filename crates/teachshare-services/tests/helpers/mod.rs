//! Test helpers: a `TeachShare` over in-memory repositories and storage.
//!
//! Run from workspace root: `cargo test -p teachshare-services`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use teachshare_core::models::{DocumentMetadata, ModerationState};
use teachshare_db::{InMemoryDatabase, Repositories};
use teachshare_services::{TeachShare, TeachShareSettings};
use teachshare_storage::MemoryStorage;

pub const BUCKET: &str = "share2teach";
pub const OWNER: &str = "educator-1";
pub const REVIEWER: &str = "moderator-1";

/// Test application with direct handles on the backing fakes.
pub struct TestApp {
    pub app: TeachShare,
    pub db: InMemoryDatabase,
    pub storage: MemoryStorage,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(TeachShareSettings {
        max_document_size_bytes: 1024 * 1024,
        presigned_url_expiry: Duration::from_secs(3600),
    })
}

pub fn setup_test_app_with(settings: TeachShareSettings) -> TestApp {
    let db = InMemoryDatabase::new();
    let storage = MemoryStorage::new(BUCKET);
    let app = TeachShare::new(
        Repositories::in_memory(db.clone()),
        Arc::new(storage.clone()),
        settings,
    );
    TestApp { app, db, storage }
}

impl TestApp {
    /// Upload `text` as a `.txt` file.
    pub async fn ingest_text(
        &self,
        text: &str,
        title: &str,
        subject: &str,
        grade: &str,
    ) -> DocumentMetadata {
        self.app
            .ingest(
                text.as_bytes().to_vec(),
                "notes.txt",
                OWNER,
                title,
                subject,
                grade,
            )
            .await
            .expect("ingest text document")
    }

    /// Upload and approve in one step.
    pub async fn ingest_approved(
        &self,
        text: &str,
        title: &str,
        subject: &str,
        grade: &str,
    ) -> DocumentMetadata {
        let doc = self.ingest_text(text, title, subject, grade).await;
        self.app
            .review(doc.id, REVIEWER, ModerationState::Approved, "")
            .await
            .expect("approve document");
        doc
    }
}
