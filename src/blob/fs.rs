use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use super::{AssetRef, BlobBackend};

/// Private-FS backend: one file per logical filename under a private root.
pub struct PrivateFsStore {
    root: PathBuf,
}

impl PrivateFsStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobBackend for PrivateFsStore {
    fn save(&self, asset: AssetRef<'_>, bytes: &[u8]) -> Result<Option<String>> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create blob root {}", self.root.display()))?;
        std::fs::write(self.blob_path(asset.name), bytes)
            .with_context(|| format!("Failed to write blob {}", asset.name))?;
        debug!(name = asset.name, size = bytes.len(), "Blob written");
        Ok(Some(asset.name.to_string()))
    }

    fn load(&self, asset: AssetRef<'_>) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(asset.name);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read blob {}", asset.name))?;
        Ok(Some(bytes))
    }

    fn delete(&self, asset: AssetRef<'_>) -> Result<()> {
        match std::fs::remove_file(self.blob_path(asset.name)) {
            Ok(()) => Ok(()),
            // Absence is success
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete blob {}", asset.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset<'a>(name: &'a str) -> AssetRef<'a> {
        AssetRef {
            module_id: "m1",
            url: "https://x/a.png",
            name,
        }
    }

    #[test]
    fn test_save_returns_map_entry_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PrivateFsStore::new(dir.path().join("blobs"));

        let recorded = store.save(asset("m1_a"), b"one").expect("save");
        assert_eq!(recorded.as_deref(), Some("m1_a"));

        store.save(asset("m1_a"), b"two").expect("overwrite");
        let bytes = store.load(asset("m1_a")).expect("load").expect("present");
        assert_eq!(bytes, b"two");
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PrivateFsStore::new(dir.path().join("blobs"));
        assert!(store.load(asset("never_saved")).expect("load").is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PrivateFsStore::new(dir.path().join("blobs"));
        store.save(asset("m1_a"), b"bytes").expect("save");
        store.delete(asset("m1_a")).expect("first delete");
        store.delete(asset("m1_a")).expect("second delete");
        assert!(store.load(asset("m1_a")).expect("load").is_none());
    }

    #[test]
    fn test_save_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").expect("write file");
        let store = PrivateFsStore::new(file);
        assert!(store.save(asset("m1_a"), b"bytes").is_err());
    }
}
