use std::path::PathBuf;

/// Failures surfaced through the catalog's error slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to load projects: {message}")]
    LoadFailed { message: String },

    #[error("Failed to save project {project_id}")]
    SaveFailed { project_id: String },

    #[error("Failed to delete project {project_id}")]
    DeleteFailed { project_id: String },

    #[error("Project {project_id} not found")]
    ProjectNotFound { project_id: String },

    #[error(
        "Image {} is too large: about {estimated_bytes} bytes, limit is {limit}",
        path.display()
    )]
    ImageTooLarge {
        path: PathBuf,
        estimated_bytes: u64,
        limit: u64,
    },

    #[error("Failed to encode image {}: {message}", path.display())]
    ImageEncoding { path: PathBuf, message: String },
}
