use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{AssetRef, BlobBackend};

/// Name of the reference ledger inside the cache directory.
const REFS_FILE: &str = "refs.json";

/// URL -> referencing module ids. An entry may only be deleted once no
/// module references it; the same URL can back several cached modules.
type RefLedger = BTreeMap<String, BTreeSet<String>>;

/// Fallback backend: a shared response cache keyed by the original URL.
///
/// Entries are named by a truncated SHA-256 of the URL and shared across
/// modules, so `delete` only drops a module's reference in the ledger and
/// removes the entry when the last reference goes.
pub struct HttpCacheStore {
    dir: PathBuf,
    // Ledger read-modify-write cycles are serialized within the process;
    // per-module locks in the manager do not cover cross-module saves.
    ledger_lock: Mutex<()>,
}

impl HttpCacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            ledger_lock: Mutex::new(()),
        }
    }

    fn url_digest(url: &str) -> String {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        digest[..32].to_string()
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("ent_{}.bin", Self::url_digest(url)))
    }

    fn ledger_path(&self) -> PathBuf {
        self.dir.join(REFS_FILE)
    }

    fn load_ledger(&self) -> Result<RefLedger> {
        let path = self.ledger_path();
        if !path.exists() {
            return Ok(RefLedger::new());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read http-cache reference ledger")?;
        serde_json::from_str(&contents).context("Failed to parse http-cache reference ledger")
    }

    fn save_ledger(&self, ledger: &RefLedger) -> Result<()> {
        let contents = serde_json::to_string_pretty(ledger)?;
        std::fs::write(self.ledger_path(), contents)
            .context("Failed to write http-cache reference ledger")?;
        Ok(())
    }

    /// Resolve a cached response by its original URL. This is the lookup
    /// callers use when a snapshot carries no asset map.
    pub fn lookup(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(url);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read cached response for {}", url))?;
        Ok(Some(bytes))
    }
}

impl BlobBackend for HttpCacheStore {
    fn save(&self, asset: AssetRef<'_>, bytes: &[u8]) -> Result<Option<String>> {
        let _guard = self.ledger_lock.lock().expect("ledger lock poisoned");

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create http cache {}", self.dir.display()))?;
        std::fs::write(self.entry_path(asset.url), bytes)
            .with_context(|| format!("Failed to cache response for {}", asset.url))?;

        let mut ledger = self.load_ledger()?;
        ledger
            .entry(asset.url.to_string())
            .or_default()
            .insert(asset.module_id.to_string());
        self.save_ledger(&ledger)?;

        debug!(url = asset.url, size = bytes.len(), "Response cached by URL");
        // URL-keyed: nothing to record in the asset map
        Ok(None)
    }

    fn load(&self, asset: AssetRef<'_>) -> Result<Option<Vec<u8>>> {
        self.lookup(asset.url)
    }

    fn delete(&self, asset: AssetRef<'_>) -> Result<()> {
        let _guard = self.ledger_lock.lock().expect("ledger lock poisoned");

        let mut ledger = self.load_ledger()?;
        let last_reference = match ledger.get_mut(asset.url) {
            Some(ids) => {
                ids.remove(asset.module_id);
                ids.is_empty()
            }
            // Unknown URL: without ledger evidence the entry may still be
            // referenced elsewhere, so leave it alone.
            None => return Ok(()),
        };

        if last_reference {
            ledger.remove(asset.url);
            match std::fs::remove_file(self.entry_path(asset.url)) {
                Ok(()) => debug!(url = asset.url, "Cached response deleted"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to delete cached response for {}", asset.url))
                }
            }
        }
        self.save_ledger(&ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://x/shared.png";

    fn asset<'a>(module_id: &'a str) -> AssetRef<'a> {
        AssetRef {
            module_id,
            url: URL,
            name: "unused_by_this_backend",
        }
    }

    #[test]
    fn test_save_contributes_no_map_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HttpCacheStore::new(dir.path().join("http"));
        let recorded = store.save(asset("m1"), b"png").expect("save");
        assert!(recorded.is_none());
        assert_eq!(store.lookup(URL).expect("lookup").as_deref(), Some(&b"png"[..]));
    }

    #[test]
    fn test_shared_entry_survives_until_last_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HttpCacheStore::new(dir.path().join("http"));
        store.save(asset("m1"), b"png").expect("save m1");
        store.save(asset("m2"), b"png").expect("save m2");

        store.delete(asset("m1")).expect("delete m1");
        assert!(store.lookup(URL).expect("lookup").is_some());

        store.delete(asset("m2")).expect("delete m2");
        assert!(store.lookup(URL).expect("lookup").is_none());
    }

    #[test]
    fn test_resave_by_same_module_does_not_double_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HttpCacheStore::new(dir.path().join("http"));
        store.save(asset("m1"), b"png").expect("save");
        store.save(asset("m1"), b"png").expect("re-save");

        store.delete(asset("m1")).expect("delete");
        assert!(store.lookup(URL).expect("lookup").is_none());
    }

    #[test]
    fn test_delete_unknown_url_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HttpCacheStore::new(dir.path().join("http"));
        store.delete(asset("m1")).expect("delete unknown");
    }
}
