use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::models::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Whole-collection persistence. Every request reads the full inventory and
/// mutating requests write it back in one piece.
#[async_trait]
pub trait Store: Send + Sync {
    /// Current inventory in insertion order. Never fails: a missing document,
    /// or one that is not a JSON array, is treated as an empty inventory.
    async fn read(&self) -> Vec<Record>;

    /// Replaces the stored inventory with `items`.
    async fn write(&self, items: &[Record]) -> Result<(), StoreError>;
}

// ── JSON file ────────────────────────────────────────────────────────────────

/// Inventory kept as one pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn read(&self) -> Vec<Record> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No inventory file yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read inventory file: {e}");
                return Vec::new();
            }
        };

        // Every array element decodes, as a raw record if need be, so this only
        // fails for invalid JSON or a document that is not an array.
        let items: Vec<Record> = match serde_json::from_str(&data) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to parse inventory file: {e}");
                return Vec::new();
            }
        };

        let raw = items.iter().filter(|r| matches!(r, Record::Raw(_))).count();
        if raw > 0 {
            warn!(path = %self.path.display(), raw, "Inventory holds entries that are not valid products; keeping them as-is");
        }
        items
    }

    async fn write(&self, items: &[Record]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(items)?;

        // Write beside the target then rename over it, so readers never see a
        // half-written document.
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = items.len(), "Inventory saved");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("inventory"));
    name.push(".tmp");
    path.with_file_name(name)
}

// ── In memory ────────────────────────────────────────────────────────────────

/// Non-persistent store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self) -> Vec<Record> {
        self.items.read().await.clone()
    }

    async fn write(&self, items: &[Record]) -> Result<(), StoreError> {
        *self.items.write().await = items.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Extra, Product};
    use crate::validation::ValidProduct;
    use serde_json::{json, Number, Value};

    fn make(id: &str, name: &str) -> Record {
        Product::new(
            id.to_string(),
            ValidProduct {
                name: name.to_string(),
                quantity: Number::from(3),
                price: Number::from_f64(1.5).unwrap(),
            },
            Extra::new(),
        )
        .into()
    }

    fn file_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("inventory.json"));
        (dir, store)
    }

    // ── JsonFileStore ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let (_dir, store) = file_store();
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let (_dir, store) = file_store();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn non_array_document_reads_as_empty() {
        let (_dir, store) = file_store();
        std::fs::write(store.path(), r#"{"id":"1"}"#).unwrap();
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn off_schema_entries_do_not_hide_their_siblings() {
        let (_dir, store) = file_store();
        let doc = json!([
            { "id": "1", "name": "A", "quantity": 5, "price": 1 },
            { "id": "2", "name": "B", "quantity": "7", "price": 1 },
            { "id": "3", "name": "C", "price": 1 },
            { "id": 4, "name": "D", "quantity": 1, "price": 1 },
        ]);
        std::fs::write(store.path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let items = store.read().await;
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], Record::Product(_)));
        assert!(items[1..].iter().all(|r| matches!(r, Record::Raw(_))));
        assert_eq!(serde_json::to_value(&items).unwrap(), doc);
    }

    #[tokio::test]
    async fn off_schema_entries_survive_a_rewrite() {
        let (_dir, store) = file_store();
        let doc = json!([
            { "id": "1", "name": "A", "quantity": 5, "price": 1 },
            { "id": "2", "name": "B", "quantity": "7", "price": 1 },
        ]);
        std::fs::write(store.path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let mut items = store.read().await;
        items.push(make("5", "New"));
        store.write(&items).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let on_disk: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(on_disk[0], doc[0]);
        assert_eq!(on_disk[1], doc[1]);
        assert_eq!(on_disk[2]["name"], "New");
    }

    #[tokio::test]
    async fn write_then_read_preserves_order() {
        let (_dir, store) = file_store();
        let items = vec![make("3", "Zebra"), make("1", "Alpha"), make("2", "Mango")];

        store.write(&items).await.unwrap();

        assert_eq!(store.read().await, items);
    }

    #[tokio::test]
    async fn write_is_pretty_printed_with_two_space_indent() {
        let (_dir, store) = file_store();
        store.write(&[make("1", "Widget")]).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"1\""), "got: {text}");
    }

    #[tokio::test]
    async fn write_overwrites_previous_contents_and_leaves_no_tmp_file() {
        let (dir, store) = file_store();
        store.write(&[make("1", "A"), make("2", "B")]).await.unwrap();
        store.write(&[]).await.unwrap();

        assert!(store.read().await.is_empty());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "only inventory.json should remain");
    }

    #[tokio::test]
    async fn reads_documents_written_by_hand() {
        let (_dir, store) = file_store();
        let doc = json!([
            { "id": "1765841814491", "name": "Widget", "quantity": 5, "price": 2.5, "sku": "W-1" }
        ]);
        std::fs::write(store.path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let items = store.read().await;
        assert_eq!(items.len(), 1);
        let Record::Product(p) = &items[0] else {
            panic!("expected a product, got {:?}", items[0]);
        };
        assert_eq!(p.id, "1765841814491");
        assert_eq!(p.extra["sku"], json!("W-1"));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope").join("inventory.json"));
        assert!(matches!(store.write(&[]).await, Err(StoreError::Io(_))));
    }

    #[test]
    fn tmp_path_is_sibling() {
        assert_eq!(
            tmp_path(Path::new("data/inventory.json")),
            PathBuf::from("data/inventory.json.tmp")
        );
    }

    // ── MemoryStore ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn memory_store_starts_empty_and_replaces_on_write() {
        let store = MemoryStore::new();
        assert!(store.read().await.is_empty());

        store.write(&[make("1", "A"), make("2", "B")]).await.unwrap();
        store.write(&[make("2", "B")]).await.unwrap();

        let ids: Vec<Option<String>> = store
            .read()
            .await
            .iter()
            .map(|r| r.id().map(str::to_string))
            .collect();
        assert_eq!(ids, [Some("2".to_string())]);
    }
}
