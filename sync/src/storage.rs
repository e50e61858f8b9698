//! Key-value storage backends - the local-storage analog.
//!
//! Each key holds one whole serialized value; writes replace the value
//! completely. Backends are deliberately infallible on write: a failed
//! write is logged and dropped, mirroring the availability-over-strictness
//! policy of the store above it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Whole-value key-value storage.
pub trait StorageBackend: Send + Sync {
    /// The stored value, or `None` if absent.
    fn get(&self, key: &str) -> Option<String>;
    /// Replace the stored value.
    fn set(&self, key: &str, value: &str);
    /// Remove the stored value, if any.
    fn remove(&self, key: &str);
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("backend lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("backend lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().expect("backend lock poisoned").remove(key);
    }
}

/// Directory-backed storage: one file per key under a root directory.
#[derive(Debug)]
pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    /// Open (creating if needed) a storage directory.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl StorageBackend for DirBackend {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = std::fs::write(self.key_path(key), value) {
            tracing::error!(key, %err, "storage write failed");
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.key_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k"), None);

        backend.set("k", "v1");
        assert_eq!(backend.get("k"), Some("v1".to_string()));

        backend.set("k", "v2");
        assert_eq!(backend.get("k"), Some("v2".to_string()));

        backend.remove("k");
        assert_eq!(backend.get("k"), None);
    }

    #[test]
    fn remove_missing_key_is_a_noop() {
        let backend = MemoryBackend::new();
        backend.remove("never-set");
        assert_eq!(backend.get("never-set"), None);
    }

    #[test]
    fn dir_backend_persists_across_reopens() {
        let dir = tempfile::tempdir().unwrap();

        let backend = DirBackend::new(dir.path()).unwrap();
        backend.set("turnlog_db", r#"{"inspections":[]}"#);
        assert_eq!(
            backend.get("turnlog_db"),
            Some(r#"{"inspections":[]}"#.to_string())
        );

        // A second backend over the same directory sees the same value.
        let reopened = DirBackend::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("turnlog_db"),
            Some(r#"{"inspections":[]}"#.to_string())
        );

        reopened.remove("turnlog_db");
        assert_eq!(backend.get("turnlog_db"), None);
    }
}
