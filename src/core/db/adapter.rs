use anyhow::Context;
use time::format_description::well_known::Rfc3339;

use crate::core::catalog::Project;
use crate::core::db::{
    DocumentStore,
    document::{CREATED_AT_FIELD, DocValue, Document, Timestamp},
};

pub const PROJECTS_COLLECTION: &str = "projects";

/// Translates projects to and from store documents.
///
/// Remote failures stop here: they are logged and collapsed into an empty
/// listing, `None`, or `false`. Use [`PersistenceAdapter::try_list_all`] when
/// an empty catalog must be told apart from a failed fetch.
#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    store: S,
    collection: String,
}

impl<S> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self::with_collection(store, PROJECTS_COLLECTION)
    }

    pub fn with_collection(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl<S: DocumentStore> PersistenceAdapter<S> {
    /// All projects, newest first, with store errors propagated.
    pub async fn try_list_all(&self) -> anyhow::Result<Vec<Project>> {
        let documents = self
            .store
            .list(&self.collection)
            .await
            .with_context(|| format!("Failed to list collection {}", self.collection))?;
        Ok(documents
            .into_iter()
            .filter_map(|(id, document)| match from_document(&id, document) {
                Ok(project) => Some(project),
                Err(e) => {
                    tracing::warn!(project_id = %id, "Skipping undecodable project document: {e:#}");
                    None
                }
            })
            .collect())
    }

    pub async fn list_all(&self) -> Vec<Project> {
        match self.try_list_all().await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!("Error fetching projects: {e:#}");
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Project> {
        let document = match self.store.get(&self.collection, id).await {
            Ok(document) => document?,
            Err(e) => {
                tracing::error!(project_id = %id, "Error fetching project: {e:#}");
                return None;
            }
        };
        match from_document(id, document) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::error!(project_id = %id, "Error decoding project: {e:#}");
                None
            }
        }
    }

    /// Upserts the whole project document.
    pub async fn put(&self, project: &Project) -> bool {
        let result = match to_document(project) {
            Ok(document) => self.store.put(&self.collection, &project.id, document).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                tracing::debug!(project_id = %project.id, "Saved project");
                true
            }
            Err(e) => {
                tracing::error!(project_id = %project.id, "Error saving project: {e:#}");
                false
            }
        }
    }

    pub async fn delete_by_id(&self, id: &str) -> bool {
        match self.store.delete(&self.collection, id).await {
            Ok(()) => {
                tracing::debug!(project_id = %id, "Deleted project");
                true
            }
            Err(e) => {
                tracing::error!(project_id = %id, "Error deleting project: {e:#}");
                false
            }
        }
    }
}

/// Marshals a project for writing; the creation date becomes a native timestamp.
pub fn to_document(project: &Project) -> anyhow::Result<Document> {
    let serde_json::Value::Object(fields) = serde_json::to_value(project)? else {
        anyhow::bail!("Project {} did not serialize to an object", project.id);
    };
    let mut document: Document = fields
        .into_iter()
        .map(|(key, value)| (key, DocValue::from(value)))
        .collect();
    document.insert(
        CREATED_AT_FIELD.to_string(),
        DocValue::Timestamp(Timestamp::from(project.created_at)),
    );
    Ok(document)
}

/// Unmarshals a stored document; the document key wins over any `id` field.
pub fn from_document(id: &str, mut document: Document) -> anyhow::Result<Project> {
    let timestamp = document.get(CREATED_AT_FIELD).and_then(DocValue::as_timestamp);
    if let Some(ts) = timestamp {
        let created_at = ts.to_datetime()?.format(&Rfc3339)?;
        document.insert(CREATED_AT_FIELD.to_string(), DocValue::String(created_at));
    }
    document.insert("id".to_string(), DocValue::String(id.to_string()));
    let value = serde_json::Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::from(value)))
            .collect(),
    );
    serde_json::from_value(value).with_context(|| format!("Malformed project document {id}"))
}
