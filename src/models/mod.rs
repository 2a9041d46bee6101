//! Data models for offline lesson content.
//!
//! This module contains the data structures the caching subsystem
//! persists and serves:
//!
//! - `Module`: lesson metadata plus the `downloadState` marker
//! - `Page`, `ContentBlock`: the ordered page tree
//! - `Snapshot`, `AssetMap`: the persisted offline record

pub mod module;
pub mod page;
pub mod snapshot;

pub use module::{DownloadState, Module};
pub use page::{ContentBlock, Page, IMAGE_BLOCK};
pub use snapshot::{AssetMap, Snapshot};
