//! The persisted offline record for one module.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Module, Page};

/// Consider an offline copy stale after a week.
/// Lesson content changes rarely; the marker only nudges a re-save.
const SNAPSHOT_STALE_MINUTES: i64 = 7 * 24 * 60;

/// Mapping from original external URL to the logical filename the
/// private-FS blob backend stored it under. Built once per save.
pub type AssetMap = BTreeMap<String, String>;

/// Structural record of a saved module: metadata, page tree, asset-name
/// map, and save timestamp. Owned exclusively by the lifecycle manager;
/// lives from `save()` until `remove()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub module: Module,
    pub pages: Vec<Page>,
    /// Present only when the private-FS backend stored at least one asset.
    /// The URL-keyed fallback backend contributes no entries.
    #[serde(rename = "assetMap", default, skip_serializing_if = "Option::is_none")]
    pub asset_map: Option<AssetMap>,
    /// Epoch milliseconds at save time.
    #[serde(rename = "savedAt")]
    pub saved_at: i64,
}

impl Snapshot {
    pub fn new(module: Module, pages: Vec<Page>, asset_map: Option<AssetMap>) -> Self {
        Self {
            module,
            pages,
            asset_map,
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.saved_at) / 60_000
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > SNAPSHOT_STALE_MINUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn module() -> Module {
        Module {
            id: "m1".to_string(),
            title: "Revolução Francesa".to_string(),
            cover_image_url: None,
            description: None,
            author: None,
            page_count: None,
            download_state: None,
            pages: None,
        }
    }

    #[test]
    fn test_age_display_just_now() {
        let snapshot = Snapshot::new(module(), vec![], None);
        assert_eq!(snapshot.age_display(), "just now");
    }

    #[test]
    fn test_age_display_rounds_up() {
        let mut snapshot = Snapshot::new(module(), vec![], None);
        snapshot.saved_at = (Utc::now() - Duration::minutes(95)).timestamp_millis();
        assert_eq!(snapshot.age_display(), "2h ago");
    }

    #[test]
    fn test_is_stale() {
        let fresh = Snapshot::new(module(), vec![], None);
        assert!(!fresh.is_stale());

        let mut old = Snapshot::new(module(), vec![], None);
        old.saved_at = (Utc::now() - Duration::days(8)).timestamp_millis();
        assert!(old.is_stale());
    }

    #[test]
    fn test_asset_map_omitted_when_absent() {
        let snapshot = Snapshot::new(module(), vec![], None);
        let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
        assert!(json.get("assetMap").is_none());
        assert!(json["savedAt"].is_i64());
    }
}
