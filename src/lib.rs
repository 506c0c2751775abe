pub mod config;
pub mod core;
pub mod imaging;

pub use crate::config::{CatalogConfig, ImageConfig, StoreConfig};
pub use crate::core::catalog::{
    CatalogError, CatalogEvent, CatalogStore, MoveDirection, Product, ProductUpdate, Project,
    ProjectDetailsUpdate,
};
pub use crate::core::db::{
    DocumentStore, MemoryDocumentStore, PersistenceAdapter, SqliteDocumentStore,
};
pub use crate::imaging::{ImageEncoder, JpegDataUriEncoder, is_base64_too_large};
