use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::origin::Origin;
use crate::page::SelectorList;

/// Stored record for one origin. The wire field name is fixed; existing
/// stores were written with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRecord {
    #[serde(rename = "nodePaths")]
    pub node_paths: Vec<String>,
}

impl SelectorRecord {
    pub fn new(list: &SelectorList) -> Self {
        Self {
            node_paths: list.as_slice().to_vec(),
        }
    }
}

/// Synchronized key-value backend, the shape of a host storage area:
/// get/set/remove plus key enumeration. Values are free-form JSON; shape
/// checking happens a layer up.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete the value stored under `key`. Deleting an absent key is not
    /// an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Persistent selector-list store keyed by origin.
#[async_trait]
pub trait SelectorStore: Send + Sync {
    /// Load the selector list for `origin`. A missing record, or a record
    /// without the expected list field, resolves to an empty list; `Err`
    /// means the backend itself failed and the caller should not act on it.
    async fn load(&self, origin: &Origin) -> Result<SelectorList>;

    /// Overwrite the record for `origin` with `list`.
    async fn save(&self, origin: &Origin, list: &SelectorList) -> Result<()>;

    /// Delete the record for `origin`; completion signals that UI state may
    /// be reset.
    async fn clear(&self, origin: &Origin) -> Result<()>;

    /// All origins with a stored record.
    async fn origins(&self) -> Result<Vec<String>>;
}

/// In-memory backend for tests and ephemeral runs.
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvBackend for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_backend_basic_operations() {
        let backend = MemoryKvStore::new();

        backend
            .set("https://example.com", json!({"nodePaths": ["p.promo"]}))
            .await
            .unwrap();

        let value = backend.get("https://example.com").await.unwrap().unwrap();
        assert_eq!(value["nodePaths"][0], "p.promo");

        let keys = backend.keys().await.unwrap();
        assert_eq!(keys, vec!["https://example.com".to_string()]);

        backend.remove("https://example.com").await.unwrap();
        assert!(backend.get("https://example.com").await.unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_memory_backend_remove_absent_key() {
        let backend = MemoryKvStore::new();
        assert!(backend.remove("never-stored").await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_backend_set_overwrites() {
        let backend = MemoryKvStore::new();

        backend.set("k", json!({"nodePaths": ["a"]})).await.unwrap();
        backend.set("k", json!({"nodePaths": ["b"]})).await.unwrap();

        let value = backend.get("k").await.unwrap().unwrap();
        assert_eq!(value["nodePaths"], json!(["b"]));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_selector_record_wire_shape() {
        let record = SelectorRecord::new(&SelectorList::parse_input("div.ad, #banner"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"nodePaths": ["div.ad", "#banner"]}));
    }
}
