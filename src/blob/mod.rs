//! Binary asset storage.
//!
//! Assets are persisted through the `BlobBackend` strategy trait with two
//! implementations, selected once per operation by the capability probe:
//!
//! - `PrivateFsStore`: files under a private root, keyed by logical
//!   filename. The backend recorded in a snapshot's asset map.
//! - `HttpCacheStore`: a shared response cache keyed by the original URL,
//!   used when the private root is unavailable. Contributes no asset-map
//!   entries; deletion is guarded by a reference ledger.

mod fs;
mod http_cache;
mod probe;

use anyhow::Result;

pub use fs::PrivateFsStore;
pub use http_cache::HttpCacheStore;
pub use probe::private_root_available;

/// Identity of one stored asset as both backends see it.
///
/// The private-FS backend keys by `name`, the fallback cache by `url`.
/// Blobs are never addressed by raw URL on the filesystem side, which
/// avoids backend-specific escaping issues.
#[derive(Debug, Clone, Copy)]
pub struct AssetRef<'a> {
    pub module_id: &'a str,
    pub url: &'a str,
    pub name: &'a str,
}

/// Strategy interface over the two binary-asset backends.
pub trait BlobBackend: Send + Sync {
    /// Persist the full blob, overwriting any prior content. Returns the
    /// logical name to record in the module's asset map, or `None` when
    /// this backend keys by URL directly.
    fn save(&self, asset: AssetRef<'_>, bytes: &[u8]) -> Result<Option<String>>;

    /// Load a stored blob. `None` means never downloaded - distinguished
    /// from a hard failure.
    fn load(&self, asset: AssetRef<'_>) -> Result<Option<Vec<u8>>>;

    /// Delete a stored blob. Idempotent; absence is success.
    fn delete(&self, asset: AssetRef<'_>) -> Result<()>;
}

/// Deterministic logical filename for an asset: the module id followed by
/// the URL with every non-alphanumeric byte flattened to `_`.
pub fn logical_name(module_id: &str, url: &str) -> String {
    let sanitized: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}", module_id, sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_name_flattens_url() {
        assert_eq!(
            logical_name("m1", "https://x/cover.png"),
            "m1_https___x_cover_png"
        );
        assert_eq!(logical_name("m1", "https://x/a.png"), "m1_https___x_a_png");
    }

    #[test]
    fn test_logical_name_is_deterministic() {
        let a = logical_name("m2", "https://cdn.example/img/1.jpg?v=2");
        let b = logical_name("m2", "https://cdn.example/img/1.jpg?v=2");
        assert_eq!(a, b);
        assert!(a.starts_with("m2_"));
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
