//! Capability probe for the private blob root.

use std::fs;
use std::path::Path;

/// Whether the private-FS backend can operate under `root`.
///
/// Side-effect free: walks up to the nearest existing ancestor and checks
/// that it is a writable directory. Queried per operation; the answer can
/// change between calls (e.g. a root on removable storage).
pub fn private_root_available(root: &Path) -> bool {
    let mut probe = root;
    loop {
        match fs::metadata(probe) {
            Ok(meta) => return meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => match probe.parent() {
                Some(parent) => probe = parent,
                None => return false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_under_existing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(private_root_available(&dir.path().join("blobs")));
        assert!(private_root_available(&dir.path().join("a/b/c")));
    }

    #[test]
    fn test_unavailable_under_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").expect("write file");
        assert!(!private_root_available(&file));
        assert!(!private_root_available(&file.join("blobs")));
    }
}
