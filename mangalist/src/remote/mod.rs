//! Remote collection module
//!
//! The keyed document store the manga list is synchronized with.
//! Backends:
//! - `FirebaseCollection`: Firebase Realtime Database over REST
//! - `MemoryCollection`: in-process store for tests and scratch sessions
//! - `database::SqliteCollection`: offline SQLite store

pub mod firebase;
pub mod memory;
pub mod retry;

pub use firebase::FirebaseCollection;
pub use memory::MemoryCollection;
pub use retry::RetryPolicy;

use crate::database::{MangaDocument, MangaField, RawCollection};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Contract every manga collection backend fulfils.
///
/// Each call completes only once the store has confirmed the operation.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Every record in the collection; an empty or absent collection is an empty map
    async fn fetch_all(&self) -> Result<RawCollection>;

    /// Overwrite a single field of one record
    async fn write_field(&self, id: &str, field: MangaField, value: Value) -> Result<()>;

    /// Persist a new record and return the id the store assigned
    async fn write_record(&self, record: &MangaDocument) -> Result<String>;

    async fn delete_record(&self, id: &str) -> Result<()>;

    /// Records whose `field` equals `value` exactly
    async fn query_by_field(&self, field: MangaField, value: &Value) -> Result<RawCollection>;
}
