//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the content-service base URL and an optional override
//! for where offline data lives.
//!
//! Configuration is stored at `~/.config/lessoncache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "lessoncache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub storage_root: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn storage_paths(&self) -> Result<StoragePaths> {
        if let Some(ref root) = self.storage_root {
            return Ok(StoragePaths::new(root.clone()));
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(StoragePaths::new(data_dir.join(APP_NAME)))
    }
}

/// Directory layout for the offline stores, all under one root.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Private root for the logical-filename blob backend.
    pub fn private_blob_root(&self) -> PathBuf {
        self.root.join("blobs")
    }

    /// Shared URL-keyed response cache for the fallback backend.
    pub fn http_cache_dir(&self) -> PathBuf {
        self.root.join("http_cache")
    }

    /// Snapshot key-value store.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_paths_share_one_root() {
        let paths = StoragePaths::new(PathBuf::from("/tmp/lessoncache-test"));
        assert!(paths.private_blob_root().starts_with("/tmp/lessoncache-test"));
        assert!(paths.http_cache_dir().starts_with("/tmp/lessoncache-test"));
        assert!(paths.snapshot_dir().starts_with("/tmp/lessoncache-test"));
    }

    #[test]
    fn test_storage_root_override() {
        let config = Config {
            api_base_url: None,
            storage_root: Some(PathBuf::from("/opt/lessons")),
        };
        let paths = config.storage_paths().expect("paths");
        assert_eq!(paths.private_blob_root(), PathBuf::from("/opt/lessons/blobs"));
    }
}
