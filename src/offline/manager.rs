//! Lifecycle orchestration for offline modules.
//!
//! `OfflineStore` owns the snapshot record for each saved module and
//! guarantees that no blob outlives its snapshot: save writes blobs before
//! the snapshot, remove deletes the snapshot entry last.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::ContentSource;
use crate::blob::{
    logical_name, private_root_available, AssetRef, BlobBackend, HttpCacheStore, PrivateFsStore,
};
use crate::config::StoragePaths;
use crate::models::{AssetMap, DownloadState, Module, Page, Snapshot};
use crate::store::KeyValueStore;

use super::error::OfflineError;
use super::harvest::collect_asset_urls;
use super::hydrate::{hydrate, HydratedModule};

/// Upper bound on concurrent asset downloads within one save.
/// Matches what lesson image hosts tolerate without throttling.
const MAX_CONCURRENT_DOWNLOADS: usize = 5;

/// Key prefix for snapshot entries in the key-value store.
const SNAPSHOT_KEY_PREFIX: &str = "module_";

/// Store key for a module id. Ids are flattened the same way asset URLs
/// are, so the key is always filesystem-safe.
fn snapshot_key(module_id: &str) -> String {
    let sanitized: String = module_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", SNAPSHOT_KEY_PREFIX, sanitized)
}

/// Order-preserving dedupe: the same URL may occur in several blocks but
/// is downloaded once per save.
fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// The offline lifecycle manager.
pub struct OfflineStore<C> {
    content: C,
    snapshots: Box<dyn KeyValueStore>,
    private_fs: PrivateFsStore,
    private_root: PathBuf,
    http_cache: HttpCacheStore,
    // One lock per module id: two concurrent saves of the same module
    // would interleave writes with different asset maps.
    save_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<C: ContentSource> OfflineStore<C> {
    pub fn new(content: C, snapshots: Box<dyn KeyValueStore>, paths: &StoragePaths) -> Self {
        Self::with_roots(
            content,
            snapshots,
            paths.private_blob_root(),
            paths.http_cache_dir(),
        )
    }

    /// Construct with explicit backend roots.
    pub fn with_roots(
        content: C,
        snapshots: Box<dyn KeyValueStore>,
        private_root: PathBuf,
        http_cache_dir: PathBuf,
    ) -> Self {
        Self {
            content,
            snapshots,
            private_fs: PrivateFsStore::new(private_root.clone()),
            private_root,
            http_cache: HttpCacheStore::new(http_cache_dir),
            save_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Persist a module for offline use: fetch its content, download every
    /// referenced image, and write the snapshot.
    ///
    /// Individual asset failures are logged and skipped; once this
    /// resolves a snapshot exists and hydration degrades gracefully for
    /// whatever is missing.
    pub async fn save_module_offline(&self, module: &Module) -> Result<()> {
        if !module.has_required_metadata() {
            return Err(OfflineError::IncompleteModule.into());
        }

        let lock = self.save_lock(&module.id).await;
        let _guard = lock.lock().await;

        let pages = self.resolve_pages(module).await?;
        let urls = dedupe(collect_asset_urls(&pages, module.cover_image_url.as_deref()));

        let use_private_fs = private_root_available(&self.private_root);
        let backend: &dyn BlobBackend = if use_private_fs {
            &self.private_fs
        } else {
            &self.http_cache
        };
        debug!(
            module_id = %module.id,
            assets = urls.len(),
            private_fs = use_private_fs,
            "Saving module offline"
        );

        let mut asset_map = AssetMap::new();
        for chunk in urls.chunks(MAX_CONCURRENT_DOWNLOADS) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|url| async move {
                    let outcome = self.store_asset(&module.id, url, backend).await;
                    (url.as_str(), outcome)
                })
                .collect();

            for (url, outcome) in join_all(futures).await {
                match outcome {
                    Ok(Some(name)) => {
                        asset_map.insert(url.to_string(), name);
                    }
                    // URL-keyed backend: nothing to record
                    Ok(None) => {}
                    // Partial success: the snapshot still gets written
                    Err(e) => warn!(url, error = %e, "Asset skipped"),
                }
            }
        }

        let mut saved = module.clone();
        saved.download_state = Some(DownloadState::Downloaded);
        // Pages are persisted on the snapshot itself
        saved.pages = None;

        let asset_map = if use_private_fs && !asset_map.is_empty() {
            Some(asset_map)
        } else {
            None
        };
        let snapshot = Snapshot::new(saved, pages, asset_map);
        let contents =
            serde_json::to_string_pretty(&snapshot).map_err(|e| OfflineError::KeyValue(e.into()))?;
        self.snapshots
            .set(&snapshot_key(&module.id), &contents)
            .map_err(OfflineError::KeyValue)?;

        info!(module_id = %module.id, "Module saved offline");
        Ok(())
    }

    /// Read a saved module, hydrated where possible. `None` means the
    /// module was never saved - not an error.
    pub async fn get_offline_module(&self, module_id: &str) -> Result<Option<HydratedModule>> {
        let Some(raw) = self
            .snapshots
            .get(&snapshot_key(module_id))
            .map_err(OfflineError::KeyValue)?
        else {
            return Ok(None);
        };
        let snapshot: Snapshot =
            serde_json::from_str(&raw).map_err(|e| OfflineError::KeyValue(e.into()))?;
        Ok(Some(hydrate(&snapshot, &self.private_fs)))
    }

    /// Delete a module's snapshot and every blob it referenced.
    /// Idempotent: removing a module that was never saved succeeds.
    pub async fn remove_module_offline(&self, module_id: &str) -> Result<()> {
        let key = snapshot_key(module_id);
        let Some(raw) = self.snapshots.get(&key).map_err(OfflineError::KeyValue)? else {
            return Ok(());
        };
        let snapshot: Snapshot =
            serde_json::from_str(&raw).map_err(|e| OfflineError::KeyValue(e.into()))?;

        // Blobs first, snapshot entry last: a crash mid-removal leaves
        // orphaned blobs at worst, never a snapshot pointing at nothing.
        match snapshot.asset_map.as_ref() {
            Some(map) => {
                for (url, name) in map {
                    let asset = AssetRef {
                        module_id,
                        url,
                        name,
                    };
                    if let Err(e) = self.private_fs.delete(asset) {
                        warn!(name = %name, error = %e, "Blob delete failed");
                    }
                }
            }
            None => {
                // Fallback backend, or nothing was stored: drop this
                // module's references against the shared ledger.
                let urls = dedupe(collect_asset_urls(
                    &snapshot.pages,
                    snapshot.module.cover_image_url.as_deref(),
                ));
                for url in urls {
                    let name = logical_name(module_id, &url);
                    let asset = AssetRef {
                        module_id,
                        url: &url,
                        name: &name,
                    };
                    if let Err(e) = self.http_cache.delete(asset) {
                        warn!(url = %url, error = %e, "Cached response release failed");
                    }
                }
            }
        }

        self.snapshots.delete(&key).map_err(OfflineError::KeyValue)?;
        info!(module_id, "Module removed from offline storage");
        Ok(())
    }

    /// Whether a snapshot exists for this module id.
    pub async fn is_module_offline(&self, module_id: &str) -> Result<bool> {
        let keys = self.snapshots.list_keys().map_err(OfflineError::KeyValue)?;
        Ok(keys.contains(&snapshot_key(module_id)))
    }

    /// The module metadata of every saved snapshot, for catalog browsing.
    pub async fn list_offline_modules(&self) -> Result<Vec<Module>> {
        let mut modules = Vec::new();
        for key in self.snapshots.list_keys().map_err(OfflineError::KeyValue)? {
            if !key.starts_with(SNAPSHOT_KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.snapshots.get(&key).map_err(OfflineError::KeyValue)? else {
                continue;
            };
            match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) => modules.push(snapshot.module),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable snapshot"),
            }
        }
        Ok(modules)
    }

    /// Resolve a cached asset by its original URL - the lookup path for
    /// snapshots saved through the fallback backend (no asset map).
    pub fn cached_asset_by_url(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.http_cache.lookup(url)
    }

    async fn save_lock(&self, module_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.save_locks.lock().await;
        locks
            .entry(module_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Pages for a save: prefer fresh content, fall back to pages embedded
    /// on the module value.
    async fn resolve_pages(&self, module: &Module) -> Result<Vec<Page>> {
        match self.content.fetch_pages(&module.id).await {
            Ok(pages) if !pages.is_empty() => return Ok(pages),
            Ok(_) => debug!(module_id = %module.id, "Content service returned no pages"),
            Err(e) => {
                warn!(module_id = %module.id, error = %e, "Content fetch failed; trying embedded pages")
            }
        }
        match &module.pages {
            Some(pages) if !pages.is_empty() => Ok(pages.clone()),
            _ => Err(OfflineError::ContentUnavailable(module.id.clone()).into()),
        }
    }

    async fn store_asset(
        &self,
        module_id: &str,
        url: &str,
        backend: &dyn BlobBackend,
    ) -> Result<Option<String>> {
        let bytes = self
            .content
            .fetch_asset(url)
            .await
            .map_err(|e| OfflineError::AssetDownload {
                url: url.to_string(),
                source: e,
            })?;
        let name = logical_name(module_id, url);
        let asset = AssetRef {
            module_id,
            url,
            name: &name,
        };
        let recorded = backend.save(asset, &bytes).map_err(|e| OfflineError::StorageWrite {
            name: name.clone(),
            source: e,
        })?;
        Ok(recorded)
    }
}
