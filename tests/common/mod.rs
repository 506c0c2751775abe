#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from linesheet for tests
pub use linesheet::core::db::{
    CREATED_AT_FIELD, DocValue, Document, DocumentStore, MemoryDocumentStore, PersistenceAdapter,
    SqliteDocumentStore, Timestamp, from_document, to_document,
};
pub use linesheet::{
    CatalogError, CatalogEvent, CatalogStore, MoveDirection, Product, ProductUpdate, Project,
    ProjectDetailsUpdate,
};
