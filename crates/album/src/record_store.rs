/// Named-record persistence used by the album store
///
/// Values are opaque strings (the album stores JSON). Every back-end must make
/// a `put` durable before returning.
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait RecordStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// Process-local store, mostly for tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.records
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record in a directory
pub struct JsonDirStore {
    storage_path: PathBuf,
}

impl JsonDirStore {
    pub fn new(storage_path: impl AsRef<Path>) -> Result<Self> {
        let storage_path = storage_path.as_ref().to_path_buf();
        fs::create_dir_all(&storage_path).with_context(|| {
            format!("creating record directory {}", storage_path.display())
        })?;
        Ok(Self { storage_path })
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.storage_path.join(format!("{}.json", name))
    }
}

impl RecordStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key);
        if !file.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        Ok(Some(data))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let file = self.file_for(key);
        // Readers only ever see a complete file.
        let tmp = file.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &file).with_context(|| format!("replacing {}", file.display()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let file = self.file_for(key);
        match fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", file.display())),
        }
    }
}
