use camino::Utf8PathBuf;
use thiserror::Error;

/// Error raised by a [`super::PoiRepository`] when reading or writing the
/// collection fails.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Location of the backing file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Creating the parent directory of the backing file failed.
    #[error("failed to create parent directory for {path}: {source}")]
    CreateParent {
        /// Location of the backing file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Taking the advisory write lock beside the backing file failed.
    #[error("failed to lock {path} for writing: {source}")]
    Lock {
        /// Location of the lock file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The collection could not be encoded.
    #[cfg(feature = "serde")]
    #[error("failed to encode points of interest for {path}: {source}")]
    Encode {
        /// Destination of the document.
        path: Utf8PathBuf,
        /// Encoder failure from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The stored document was not a valid collection.
    #[cfg(feature = "serde")]
    #[error("failed to decode points of interest from {path}: {source}")]
    Decode {
        /// Location of the document.
        path: Utf8PathBuf,
        /// Decoder failure from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A SQLite statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}: {source}")]
    Database {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// An identifier cannot be represented by the backing store.
    #[error("point of interest id {id} is outside the supported range")]
    IdOutOfRange {
        /// Identifier as seen by the backing store.
        id: i128,
    },
    /// The backend refused the operation.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Why the backend refused.
        reason: String,
    },
}
