//! In-process manga collection
//!
//! Keeps documents in a map behind a mutex and counts calls per
//! operation, so tests can assert which remote calls were made.

use super::CollectionClient;
use crate::database::{MangaDocument, MangaField, RawCollection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub fetch_all: AtomicUsize,
    pub write_field: AtomicUsize,
    pub write_record: AtomicUsize,
    pub delete_record: AtomicUsize,
    pub query_by_field: AtomicUsize,
}

impl CallCounts {
    /// Calls that change the collection
    pub fn writes(&self) -> usize {
        self.write_field.load(Ordering::SeqCst)
            + self.write_record.load(Ordering::SeqCst)
            + self.delete_record.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct MemoryCollection {
    docs: Arc<Mutex<RawCollection>>,
    calls: Arc<CallCounts>,
    failures: Arc<AtomicU32>,
    /// Calls left before a single failure, plus one; 0 when disarmed
    fail_at: Arc<AtomicU32>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the collection with documents under fixed ids
    pub async fn seed(&self, entries: impl IntoIterator<Item = (String, MangaDocument)>) {
        let mut docs = self.docs.lock().await;
        docs.extend(entries);
    }

    pub async fn snapshot(&self) -> RawCollection {
        self.docs.lock().await.clone()
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Make the next `count` calls fail with a 503
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Let the next `succeed` calls through, then fail exactly one with a 503
    pub fn fail_after(&self, succeed: u32) {
        self.fail_at.store(succeed.saturating_add(1), Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let scheduled = self
            .fail_at
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            == Ok(1);
        if injected || scheduled {
            return Err(AppError::Remote {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionClient for MemoryCollection {
    async fn fetch_all(&self) -> Result<RawCollection> {
        self.calls.fetch_all.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.docs.lock().await.clone())
    }

    async fn write_field(&self, id: &str, field: MangaField, value: Value) -> Result<()> {
        self.calls.write_field.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut docs = self.docs.lock().await;
        // Firebase creates the path on write; mirror that
        docs.entry(id.to_string()).or_default().set(field, &value);
        Ok(())
    }

    async fn write_record(&self, record: &MangaDocument) -> Result<String> {
        self.calls.write_record.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let id = Uuid::new_v4().simple().to_string();
        self.docs.lock().await.insert(id.clone(), record.clone());
        Ok(id)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.calls.delete_record.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        self.docs.lock().await.remove(id);
        Ok(())
    }

    async fn query_by_field(&self, field: MangaField, value: &Value) -> Result<RawCollection> {
        self.calls.query_by_field.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let docs = self.docs.lock().await;
        Ok(docs
            .iter()
            .filter(|(_, doc)| doc.get(field) == *value)
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect())
    }
}
