use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::catalog::{CatalogError, Project};

#[derive(Debug, Default)]
pub(super) struct CatalogState {
    pub projects: Vec<Project>,
    pub current_project_id: Option<String>,
    pub loading: bool,
    pub last_error: Option<CatalogError>,
}

impl CatalogState {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn current(&self) -> Option<&Project> {
        self.current_project_id
            .as_deref()
            .and_then(|id| self.project(id))
    }

    /// Swaps in a saved project. Returns false if it is no longer cached.
    pub fn replace_project(&mut self, project: Project) -> bool {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => {
                *slot = project;
                true
            }
            None => false,
        }
    }

    /// Replaces the cache, dropping the selection if its project is gone.
    /// Returns true if the selection was dropped.
    pub fn replace_all(&mut self, projects: Vec<Project>) -> bool {
        self.projects = projects;
        if self.current_project_id.is_some() && self.current().is_none() {
            self.current_project_id = None;
            true
        } else {
            false
        }
    }

    /// Removes a project; if it was selected, selection falls back to the
    /// first remaining project. Returns the new selection when it changed.
    pub fn remove_project(&mut self, id: &str) -> Option<Option<String>> {
        self.projects.retain(|p| p.id != id);
        if self.current_project_id.as_deref() == Some(id) {
            self.current_project_id = self.projects.first().map(|p| p.id.clone());
            Some(self.current_project_id.clone())
        } else {
            None
        }
    }
}

/// One async mutex per project id; writers to the same project queue up.
#[derive(Debug, Default)]
pub(super) struct ProjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .await
            .entry(id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub async fn forget(&self, id: &str) {
        self.locks.lock().await.remove(id);
    }
}
