use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use image::{ImageBuffer, Rgb};
use linesheet::core::db::{Document, DocumentStore, MemoryDocumentStore, PersistenceAdapter};
use linesheet::{CatalogStore, ImageEncoder};
use tempfile::NamedTempFile;

pub type TestCatalog = CatalogStore<FaultyStore, FakeEncoder>;

/// Memory store whose reads, writes and deletes can be made to fail.
/// Clones share documents, switches and the write log.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    inner: MemoryDocumentStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    read_delay_ms: Arc<AtomicU64>,
    write_delay_ms: Arc<AtomicU64>,
    writes: Arc<Mutex<Vec<(String, Document)>>>,
}

impl FaultyStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Holds every `get` open for `ms` before it reads.
    pub fn delay_reads(&self, ms: u64) {
        self.read_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Holds every write open for `ms` before it lands.
    pub fn delay_writes(&self, ms: u64) {
        self.write_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Every document handed to `put`, in call order.
    pub fn writes(&self) -> Vec<(String, Document)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }
}

impl DocumentStore for FaultyStore {
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Document)>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        self.inner.list(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: &str, id: &str, document: Document) -> anyhow::Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((id.to_string(), document.clone()));
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("write rejected");
        }
        self.inner.put(collection, id, document).await
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("delete rejected");
        }
        self.inner.delete(collection, id).await
    }
}

/// Encoder keyed on the file name, so tests need no real images:
/// names containing `huge` encode past the size limit, names containing
/// `broken` fail, anything else encodes to `data:image/jpeg;base64,<stem>`.
/// Names containing `slow` take [`SLOW_ENCODE_MS`] to encode.
#[derive(Debug, Clone, Default)]
pub struct FakeEncoder;

pub const OVERSIZED_LEN: usize = 1_400_000;
pub const SLOW_ENCODE_MS: u64 = 50;

impl ImageEncoder for FakeEncoder {
    async fn encode(&self, source: &Path) -> anyhow::Result<String> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if stem.contains("slow") {
            tokio::time::sleep(Duration::from_millis(SLOW_ENCODE_MS)).await;
        }
        if stem.contains("broken") {
            anyhow::bail!("unsupported image format");
        }
        if stem.contains("huge") {
            return Ok(format!("data:image/jpeg;base64,{}", "A".repeat(OVERSIZED_LEN)));
        }
        Ok(fake_encoding(&stem))
    }
}

pub fn fake_encoding(stem: &str) -> String {
    format!("data:image/jpeg;base64,{stem}")
}

/// Creates a catalog over a fresh faulty memory store.
/// Returns the catalog and a handle sharing the store's state.
pub fn create_test_catalog() -> (TestCatalog, FaultyStore) {
    let store = FaultyStore::default();
    let catalog = CatalogStore::new(PersistenceAdapter::new(store.clone()), FakeEncoder);
    (catalog, store)
}

/// Creates a catalog with one selected project holding `count` blank products.
pub async fn create_catalog_with_products(count: usize) -> (TestCatalog, FaultyStore, Vec<String>) {
    let (catalog, store) = create_test_catalog();
    catalog
        .create_project("Test Project")
        .await
        .expect("Failed to create test project");
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(catalog.add_product().await.expect("Failed to add product"));
    }
    (catalog, store, ids)
}

/// Product ids of the current project, in order.
pub async fn product_order(catalog: &TestCatalog) -> Vec<String> {
    catalog
        .current_project()
        .await
        .map(|p| p.products.into_iter().map(|p| p.id).collect())
        .unwrap_or_default()
}

/// Creates a `width`x`height` red PNG and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image(width: u32, height: u32) -> NamedTempFile {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([255u8, 0u8, 0u8]));
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

pub const SAMPLE_CSV: &str = "code,name,content,size,price,tax\n\
A1,Shirt,Cotton,M,100,18\n\
B2,Dress,Silk,S,250,8\n\
bad,line\n\
C3,Coat,Wool,L,400,18\n";
