mod adapter;
mod document;
mod memory;
mod sqlite;

use std::future::Future;

pub use adapter::{PROJECTS_COLLECTION, PersistenceAdapter, from_document, to_document};
pub use document::{CREATED_AT_FIELD, DocValue, Document, Timestamp, created_at};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// A keyed document collection with upsert semantics.
///
/// `list` returns documents ordered by their `createdAt` timestamp, newest
/// first; documents without one come last.
pub trait DocumentStore {
    fn list(
        &self,
        collection: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<(String, Document)>>>;
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Document>>>;
    fn put(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> impl Future<Output = anyhow::Result<()>>;
    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = anyhow::Result<()>>;
}
