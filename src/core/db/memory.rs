use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::core::db::{DocumentStore, document::{Document, created_at}};

type Collections = HashMap<String, HashMap<String, Document>>;

/// In-process document store. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Document)>> {
        let collections = self.collections.read().await;
        let mut documents: Vec<(String, Document)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        // Option orders None first, so reversing puts undated documents last.
        documents.sort_by_key(|(id, doc)| (Reverse(created_at(doc)), id.clone()));
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> anyhow::Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
