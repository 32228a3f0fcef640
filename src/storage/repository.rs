use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::origin::Origin;
use crate::page::SelectorList;
use crate::storage::{FileKvStore, KvBackend, MemoryKvStore, SelectorRecord, SelectorStore};

/// Selector store over any key-value backend.
pub struct SelectorRepository {
    backend: Arc<dyn KvBackend>,
}

impl SelectorRepository {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }
}

/// Extract the selector list from a raw stored value. A value that is not an
/// object, lacks the list field, or holds a non-array there counts as
/// malformed and resolves to the empty list; one explicit shape check, no
/// error-type matching. Non-string array entries are dropped.
fn list_from_value(origin: &Origin, value: &Value) -> SelectorList {
    match value.get("nodePaths").and_then(Value::as_array) {
        Some(paths) => {
            let selectors: Vec<String> = paths
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            SelectorList::new(selectors)
        }
        None => {
            warn!("Malformed record for {}, treating as empty", origin);
            SelectorList::default()
        }
    }
}

#[async_trait]
impl SelectorStore for SelectorRepository {
    async fn load(&self, origin: &Origin) -> Result<SelectorList> {
        match self.backend.get(origin.as_str()).await? {
            Some(value) => Ok(list_from_value(origin, &value)),
            None => Ok(SelectorList::default()),
        }
    }

    async fn save(&self, origin: &Origin, list: &SelectorList) -> Result<()> {
        let record = SelectorRecord::new(list);
        let value = serde_json::to_value(&record)?;
        debug!("Save {} path(s) for {}", list.len(), origin);
        self.backend.set(origin.as_str(), value).await
    }

    async fn clear(&self, origin: &Origin) -> Result<()> {
        debug!("Clear storage of {}", origin);
        self.backend.remove(origin.as_str()).await
    }

    async fn origins(&self) -> Result<Vec<String>> {
        let mut keys = self.backend.keys().await?;
        keys.sort();
        Ok(keys)
    }
}

/// Constructors for the store configurations the CLI uses.
pub struct StoreFactory;

impl StoreFactory {
    /// Store backed by a JSON file on disk.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<SelectorRepository> {
        let backend = FileKvStore::open(path)?;
        Ok(SelectorRepository::new(Arc::new(backend)))
    }

    /// Ephemeral in-memory store.
    pub fn memory() -> SelectorRepository {
        SelectorRepository::new(Arc::new(MemoryKvStore::new()))
    }
}
