use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// String key/value store standing in for browser local storage.
///
/// File-backed stores rewrite `local_storage.json` on every mutation so that
/// separate CLI invocations observe each other's writes.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    pub const FILE_NAME: &'static str = "local_storage.json";

    /// Volatile store, used by tests and one-shot runs.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                path: None,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Open (or lazily create) the store inside `data_dir`.
    pub fn open(data_dir: &Path) -> std::io::Result<Self> {
        Self::open_file(data_dir.join(Self::FILE_NAME))
    }

    /// Open a store backed by an arbitrary JSON file.
    pub fn open_file(path: PathBuf) -> std::io::Result<Self> {
        let entries = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable {}: {}", path.display(), e);
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path: Some(path),
                entries,
            })),
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value.to_string());
        inner.flush()
    }

    pub fn remove(&self, key: &str) -> std::io::Result<()> {
        let mut inner = self.lock();
        if inner.entries.remove(key).is_some() {
            inner.flush()?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned store still holds consistent string pairs.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn flush(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)
    }
}
