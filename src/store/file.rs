use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use super::KeyValueStore;

/// File-backed key-value store: one `<key>.json` document per key.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store entry: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write store entry: {}", key))?;
        debug!(key, "Store entry written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            // Absence is success
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete store entry: {}", key)),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list store directory {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileKvStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKvStore::new(dir.path().join("kv")).expect("store");
        (dir, store)
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.get("absent").expect("get").is_none());
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let (_dir, store) = store();
        store.set("module_m1", r#"{"a":1}"#).expect("set");
        assert_eq!(store.get("module_m1").expect("get").as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        store.set("module_m1", "{}").expect("set");
        store.delete("module_m1").expect("first delete");
        store.delete("module_m1").expect("second delete");
        assert!(store.get("module_m1").expect("get").is_none());
    }

    #[test]
    fn test_list_keys_sorted() {
        let (_dir, store) = store();
        store.set("module_b", "{}").expect("set b");
        store.set("module_a", "{}").expect("set a");
        assert_eq!(store.list_keys().expect("list"), vec!["module_a", "module_b"]);
    }
}
