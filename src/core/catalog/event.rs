use crate::core::catalog::CatalogError;

/// Change notifications broadcast by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Loading(bool),
    ProjectsLoaded { count: usize },
    ProjectCreated(String),
    ProjectSelected(Option<String>),
    ProjectUpdated(String),
    ProjectDeleted(String),
    Error(CatalogError),
}
