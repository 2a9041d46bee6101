//! Hydration: substituting stored blobs for external URLs on read.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::blob::{AssetRef, BlobBackend};
use crate::models::Snapshot;

use super::error::OfflineError;

/// Scheme prefix for minted handles.
const HANDLE_SCHEME: &str = "blob:";

/// Caller-scoped set of hydrated handles.
///
/// Handles resolve only through the set that minted them and are released
/// when it drops; they are recreated on every read and never survive a
/// program run.
#[derive(Debug, Default)]
pub struct HandleSet {
    handles: HashMap<String, Vec<u8>>,
}

impl HandleSet {
    fn mint(&mut self, bytes: Vec<u8>) -> String {
        let uri = format!("{}{}", HANDLE_SCHEME, Uuid::new_v4());
        self.handles.insert(uri.clone(), bytes);
        uri
    }

    /// Resolve a minted handle to its bytes.
    pub fn open(&self, uri: &str) -> Option<&[u8]> {
        self.handles.get(uri).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// A snapshot prepared for rendering: cover and image blocks rewritten to
/// freshly minted handles wherever a stored blob exists.
#[derive(Debug)]
pub struct HydratedModule {
    pub snapshot: Snapshot,
    pub handles: HandleSet,
}

/// Rewrite external URLs in a copy of `snapshot` into local handles.
///
/// The persisted record is never mutated. A map miss or blob read failure
/// leaves the original URL in place so a renderer can still try the
/// network; only structural failures surface, and there are none here.
pub fn hydrate(snapshot: &Snapshot, blobs: &dyn BlobBackend) -> HydratedModule {
    let mut copy = snapshot.clone();
    let mut handles = HandleSet::default();

    let Some(asset_map) = snapshot.asset_map.as_ref() else {
        // Fallback backend or no assets: callers resolve by original URL.
        return HydratedModule {
            snapshot: copy,
            handles,
        };
    };

    let module_id = copy.module.id.clone();
    let mut replace = |slot: &mut String| {
        let Some(name) = asset_map.get(slot.as_str()) else {
            debug!(url = %slot, "No asset-map entry; keeping original URL");
            return;
        };
        let asset = AssetRef {
            module_id: &module_id,
            url: slot.as_str(),
            name: name.as_str(),
        };
        match blobs.load(asset) {
            Ok(Some(bytes)) => *slot = handles.mint(bytes),
            Ok(None) => debug!(url = %slot, "Asset never stored; keeping original URL"),
            Err(e) => {
                let e = OfflineError::StorageRead {
                    name: name.clone(),
                    source: e,
                };
                warn!(url = %slot, error = %e, "Asset read failed; keeping original URL");
            }
        }
    };

    if let Some(cover) = copy.module.cover_image_url.as_mut() {
        replace(cover);
    }
    for page in &mut copy.pages {
        for block in &mut page.content {
            if block.is_image() {
                replace(&mut block.content);
            }
        }
    }

    HydratedModule {
        snapshot: copy,
        handles,
    }
}
