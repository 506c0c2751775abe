mod csv;
mod error;
mod event;
mod model;
mod state;

use std::path::Path;

use state::{CatalogState, ProjectLocks};
use tokio::sync::{RwLock, broadcast};

use crate::core::db::{DocumentStore, PersistenceAdapter};
use crate::imaging::{
    ImageEncoder, MAX_ENCODED_IMAGE_BYTES, estimated_decoded_size, is_base64_too_large,
};

pub use csv::{CSV_FIELD_COUNT, parse_products};
pub use error::CatalogError;
pub use event::CatalogEvent;
pub use model::{
    DEFAULT_PRODUCT_NAME, MoveDirection, Product, ProductUpdate, Project, ProjectDetailsUpdate,
};

const EVENT_CAPACITY: usize = 64;

/// The user's projects, the current selection, and every edit to them.
///
/// Each edit is computed on a copy of the project, written to the store as a
/// whole document, and committed to the local cache only once the write
/// succeeded. Edits to the same project are serialized; a failed write leaves
/// the cache as it was and records a [`CatalogError`].
pub struct CatalogStore<S, E> {
    adapter: PersistenceAdapter<S>,
    encoder: E,
    state: RwLock<CatalogState>,
    locks: ProjectLocks,
    events: broadcast::Sender<CatalogEvent>,
}

impl<S, E> std::fmt::Debug for CatalogStore<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("collection", &self.adapter.collection())
            .field("state", &self.state)
            .finish()
    }
}

impl<S: DocumentStore, E: ImageEncoder> CatalogStore<S, E> {
    pub fn new(adapter: PersistenceAdapter<S>, encoder: E) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            adapter,
            encoder,
            state: RwLock::new(CatalogState::default()),
            locks: ProjectLocks::default(),
            events,
        }
    }

    pub fn adapter(&self) -> &PersistenceAdapter<S> {
        &self.adapter
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    pub async fn current_project_id(&self) -> Option<String> {
        self.state.read().await.current_project_id.clone()
    }

    pub async fn current_project(&self) -> Option<Project> {
        self.state.read().await.current().cloned()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn last_error(&self) -> Option<CatalogError> {
        self.state.read().await.last_error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    async fn record_error(&self, error: CatalogError) {
        tracing::warn!("{error}");
        self.state.write().await.last_error = Some(error.clone());
        self.emit(CatalogEvent::Error(error));
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
        self.emit(CatalogEvent::Loading(loading));
    }

    async fn set_selection(&self, id: Option<String>) {
        self.state.write().await.current_project_id = id.clone();
        self.emit(CatalogEvent::ProjectSelected(id));
    }

    /// Replaces the cache with every stored project, newest first.
    ///
    /// On failure the cache is left untouched and `LoadFailed` is recorded.
    pub async fn load_all(&self) {
        self.set_loading(true).await;
        match self.adapter.try_list_all().await {
            Ok(projects) => {
                let count = projects.len();
                let deselected = self.state.write().await.replace_all(projects);
                tracing::info!("Loaded {count} projects");
                self.emit(CatalogEvent::ProjectsLoaded { count });
                if deselected {
                    self.emit(CatalogEvent::ProjectSelected(None));
                }
            }
            Err(e) => {
                tracing::error!("Error fetching projects: {e:#}");
                self.record_error(CatalogError::LoadFailed {
                    message: format!("{e:#}"),
                })
                .await;
            }
        }
        self.set_loading(false).await;
    }

    /// Creates, persists and selects a new empty project.
    ///
    /// Returns `None` without touching the cache if the project could not be
    /// saved.
    pub async fn create_project(&self, name: impl Into<String>) -> Option<String> {
        let project = Project::new(name);
        let id = project.id.clone();
        let _guard = self.locks.acquire(&id).await;

        if !self.adapter.put(&project).await {
            self.record_error(CatalogError::SaveFailed { project_id: id })
                .await;
            return None;
        }

        {
            let mut state = self.state.write().await;
            state.projects.push(project);
            state.current_project_id = Some(id.clone());
        }
        tracing::info!(project_id = %id, "Created project");
        self.emit(CatalogEvent::ProjectCreated(id.clone()));
        self.emit(CatalogEvent::ProjectSelected(Some(id.clone())));
        Some(id)
    }

    /// Selects a cached project, or fetches it once from the store.
    pub async fn select_project(&self, id: &str) {
        if self.state.read().await.project(id).is_some() {
            self.set_selection(Some(id.to_string())).await;
            return;
        }

        // Fetch and insert under the project lock, serialized with deletes.
        let _guard = self.locks.acquire(id).await;
        match self.adapter.get_by_id(id).await {
            Some(project) => {
                {
                    let mut state = self.state.write().await;
                    if state.project(id).is_none() {
                        state.projects.push(project);
                    }
                    state.current_project_id = Some(id.to_string());
                }
                self.emit(CatalogEvent::ProjectSelected(Some(id.to_string())));
            }
            None => {
                self.set_selection(None).await;
                self.record_error(CatalogError::ProjectNotFound {
                    project_id: id.to_string(),
                })
                .await;
            }
        }
    }

    /// Deletes remotely, then locally. Returns false if the store refused.
    pub async fn delete_project(&self, id: &str) -> bool {
        let guard = self.locks.acquire(id).await;

        if !self.adapter.delete_by_id(id).await {
            self.record_error(CatalogError::DeleteFailed {
                project_id: id.to_string(),
            })
            .await;
            return false;
        }

        let reselected = self.state.write().await.remove_project(id);
        tracing::info!(project_id = %id, "Deleted project");
        self.emit(CatalogEvent::ProjectDeleted(id.to_string()));
        if let Some(selection) = reselected {
            self.emit(CatalogEvent::ProjectSelected(selection));
        }

        drop(guard);
        self.locks.forget(id).await;
        true
    }

    /// Applies `edit` to a copy of the current project and saves it.
    ///
    /// `edit` returns whether it changed anything; unchanged projects are not
    /// written.
    async fn edit_current<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut Project) -> bool,
    {
        let Some(id) = self.current_project_id().await else {
            return false;
        };
        self.edit_project(id, edit).await
    }

    /// Like [`Self::edit_current`], for a project fixed before the edit began.
    async fn edit_project<F>(&self, id: String, edit: F) -> bool
    where
        F: FnOnce(&mut Project) -> bool,
    {
        let _guard = self.locks.acquire(&id).await;

        let Some(mut project) = self.state.read().await.project(&id).cloned() else {
            return false;
        };
        if !edit(&mut project) {
            return false;
        }

        if !self.adapter.put(&project).await {
            self.record_error(CatalogError::SaveFailed { project_id: id })
                .await;
            return false;
        }
        let committed = self.state.write().await.replace_project(project);
        if committed {
            self.emit(CatalogEvent::ProjectUpdated(id));
        }
        committed
    }

    /// Encodes one image, rejecting it if it would overflow a document.
    async fn encode_image(&self, path: &Path) -> Option<String> {
        match self.encoder.encode(path).await {
            Ok(encoded) if is_base64_too_large(&encoded) => {
                self.record_error(CatalogError::ImageTooLarge {
                    path: path.to_path_buf(),
                    estimated_bytes: estimated_decoded_size(&encoded),
                    limit: MAX_ENCODED_IMAGE_BYTES,
                })
                .await;
                None
            }
            Ok(encoded) => Some(encoded),
            Err(e) => {
                self.record_error(CatalogError::ImageEncoding {
                    path: path.to_path_buf(),
                    message: format!("{e:#}"),
                })
                .await;
                None
            }
        }
    }

    pub async fn update_project_details(&self, update: ProjectDetailsUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        self.edit_current(move |project| {
            update.apply(project);
            true
        })
        .await
    }

    /// Sets the project logo from an image file, or clears it with `None`.
    ///
    /// The logo goes to the project selected when the call started, even if
    /// the selection moves while the image is encoding.
    pub async fn update_logo(&self, logo: Option<&Path>) -> bool {
        let Some(project_id) = self.current_project_id().await else {
            return false;
        };
        let logo_url = match logo {
            Some(path) => match self.encode_image(path).await {
                Some(encoded) => Some(encoded),
                None => return false,
            },
            None => None,
        };
        self.edit_project(project_id, move |project| {
            project.logo_url = logo_url;
            true
        })
        .await
    }

    /// Replaces the whole product list with the records parsed from `text`.
    pub async fn import_csv(&self, text: &str) -> bool {
        let products = parse_products(text);
        tracing::debug!("Parsed {} products from CSV", products.len());
        self.edit_current(move |project| {
            project.products = products;
            true
        })
        .await
    }

    /// Appends the images that encode within the size limit, in input order.
    ///
    /// Rejected files record an error but do not stop the others.
    pub async fn add_images_to_product<P: AsRef<Path>>(&self, product_id: &str, files: &[P]) -> bool {
        let project_id = {
            let state = self.state.read().await;
            match state.current() {
                Some(project) if project.product(product_id).is_some() => project.id.clone(),
                _ => return false,
            }
        };

        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            if let Some(encoded) = self.encode_image(file.as_ref()).await {
                accepted.push(encoded);
            }
        }
        if accepted.is_empty() {
            return false;
        }

        self.edit_project(project_id, |project| match project.product_mut(product_id) {
            Some(product) => {
                product.images.extend(accepted);
                true
            }
            None => false,
        })
        .await
    }

    pub async fn remove_image_from_product(&self, product_id: &str, index: usize) -> bool {
        self.edit_current(|project| match project.product_mut(product_id) {
            Some(product) if index < product.images.len() => {
                product.images.remove(index);
                true
            }
            _ => false,
        })
        .await
    }

    /// Appends a blank product and returns its id once saved.
    pub async fn add_product(&self) -> Option<String> {
        let product = Product::blank();
        let id = product.id.clone();
        let saved = self
            .edit_current(move |project| {
                project.products.push(product);
                true
            })
            .await;
        saved.then_some(id)
    }

    pub async fn update_product(&self, product_id: &str, update: ProductUpdate) -> bool {
        self.edit_current(|project| match project.product_mut(product_id) {
            Some(product) => {
                update.apply(product);
                true
            }
            None => false,
        })
        .await
    }

    pub async fn delete_product(&self, product_id: &str) -> bool {
        self.edit_current(|project| {
            let before = project.products.len();
            project.products.retain(|p| p.id != product_id);
            project.products.len() != before
        })
        .await
    }

    /// Replaces the product list with `products`, expected to be a
    /// permutation of the current one.
    pub async fn reorder_products(&self, products: Vec<Product>) -> bool {
        self.edit_current(move |project| {
            project.products = products;
            true
        })
        .await
    }

    /// Swaps the product at `index` with its neighbour. Moves past either end
    /// do nothing.
    pub async fn move_product(&self, index: usize, direction: MoveDirection) -> bool {
        self.edit_current(|project| {
            let len = project.products.len();
            let target = match direction {
                MoveDirection::Up => index.checked_sub(1),
                MoveDirection::Down => index.checked_add(1),
            };
            match target {
                Some(target) if index < len && target < len => {
                    project.products.swap(index, target);
                    true
                }
                _ => false,
            }
        })
        .await
    }
}
