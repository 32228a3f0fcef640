use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::KvBackend;

const STORE_VERSION: u32 = 1;

/// On-disk envelope for the store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFileData {
    version: u32,
    records: HashMap<String, Value>,
}

impl Default for StoreFileData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            records: HashMap::new(),
        }
    }
}

/// File-backed key-value store. The whole record map is held in memory and
/// written through to disk on every mutation, atomically (tmp + rename).
pub struct FileKvStore {
    store_file: PathBuf,
    records: RwLock<HashMap<String, Value>>,
}

impl FileKvStore {
    /// Open the store at `path`, creating parent directories as needed. A
    /// missing file starts empty; an unreadable or unparseable file is an
    /// error rather than silent data loss.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store_file = path.as_ref().to_path_buf();

        if let Some(parent) = store_file.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!(
                        "Failed to create store directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = if store_file.exists() {
            let content = fs::read_to_string(&store_file).map_err(|e| {
                Error::Storage(format!(
                    "Failed to read store file '{}': {}",
                    store_file.display(),
                    e
                ))
            })?;
            let data: StoreFileData = serde_json::from_str(&content)?;
            debug!(
                "Loaded {} record(s) from {}",
                data.records.len(),
                store_file.display()
            );
            data.records
        } else {
            debug!("Store file does not exist yet: {}", store_file.display());
            HashMap::new()
        };

        Ok(Self {
            store_file,
            records: RwLock::new(records),
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_file
    }

    fn persist(&self, records: &HashMap<String, Value>) -> Result<()> {
        let data = StoreFileData {
            version: STORE_VERSION,
            records: records.clone(),
        };

        let json_content = serde_json::to_string_pretty(&data)?;

        let temp_file = self.store_file.with_extension("tmp");
        fs::write(&temp_file, json_content).map_err(|e| {
            Error::Storage(format!(
                "Failed to write store to '{}': {}",
                temp_file.display(),
                e
            ))
        })?;

        fs::rename(&temp_file, &self.store_file).map_err(|e| {
            Error::Storage(format!(
                "Failed to rename store file '{}' to '{}': {}",
                temp_file.display(),
                self.store_file.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl KvBackend for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut records = self.records.write();
        records.insert(key.to_string(), value);
        self.persist(&records)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut records = self.records.write();
        if records.remove(key).is_some() {
            self.persist(&records)?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.records.read().keys().cloned().collect())
    }
}
