//! Domain model for a learning module.
//!
//! These types represent module data in a clean domain format,
//! decoupled from the document-store response structures.

use serde::{Deserialize, Serialize};

use super::Page;

/// A learning module: metadata plus an optional embedded page tree.
///
/// The offline subsystem owns exactly one field here: `download_state`,
/// set when the module is saved for offline use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(rename = "coverImageUrl", default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "pageCount", default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(rename = "downloadState", default, skip_serializing_if = "Option::is_none")]
    pub download_state: Option<DownloadState>,
    /// Pages sometimes arrive embedded on the module value; save() uses
    /// them when the content service has nothing fresher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Page>>,
}

impl Module {
    /// A module can only be snapshotted when id and title are non-empty.
    pub fn has_required_metadata(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty()
    }
}

/// Offline availability marker persisted on the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Downloaded,
}
