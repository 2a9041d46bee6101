//! lessoncache - offline cache for learning modules.
//!
//! Saving a module fetches its page tree, downloads every externally
//! hosted image into a capability-selected blob backend, and persists a
//! structural snapshot. Reading it back re-hydrates stored images into
//! caller-scoped `blob:` handles; removing it deletes blobs first and the
//! snapshot last, so no blob ever outlives its snapshot.

pub mod api;
pub mod blob;
pub mod config;
pub mod models;
pub mod offline;
pub mod store;

pub use api::{ContentClient, ContentSource};
pub use config::{Config, StoragePaths};
pub use models::{Module, Page, Snapshot};
pub use offline::{HydratedModule, OfflineStore};
pub use store::FileKvStore;
