use thiserror::Error;

/// Failure taxonomy for the offline subsystem.
///
/// Only `IncompleteModule`, `ContentUnavailable` and `KeyValue` are fatal
/// to an operation; the per-asset classes are logged and skipped so one
/// broken URL never blocks offline availability of the rest.
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Module id and title are required before saving offline")]
    IncompleteModule,

    #[error("No content available for module {0}")]
    ContentUnavailable(String),

    #[error("Asset download failed for {url}")]
    AssetDownload {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Asset write failed for {name}")]
    StorageWrite {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Asset read failed for {name}")]
    StorageRead {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Snapshot store failure")]
    KeyValue(#[source] anyhow::Error),
}
