//! Error types for the SQLKV store.
//!
//! All public APIs return `KvResult<T>`; library code does not panic.

use thiserror::Error;

/// Unified error type for all SQLKV operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// Bucket name rejected by the backend's table-name grammar
    #[error("invalid bucket name: {0:?}")]
    InvalidBucketName(String),

    /// Query text could not be produced for a valid bucket
    #[error("query generation error: {0}")]
    Generation(String),

    /// No query generator registered under the driver name
    #[error("no query generator registered for driver '{0}'")]
    GeneratorNotFound(String),

    /// Failure reported by the SQL collaborator (driver, connection, transaction)
    #[error("backend error: {0}")]
    Backend(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// Requested key does not exist
    #[error("key not found")]
    KeyNotFound,

    /// The caller cancelled the context
    #[error("operation cancelled")]
    Cancelled,

    /// The context deadline passed before the collaborator ran
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Receiving side of a channel went away
    #[error("channel closed")]
    ChannelClosed,

    /// Invalid or unreadable configuration
    #[error("config error: {0}")]
    Config(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for all SQLKV operations.
pub type KvResult<T> = Result<T, KvError>;

impl From<serde_json::Error> for KvError {
    fn from(err: serde_json::Error) -> Self {
        KvError::Serialization(err.to_string())
    }
}

/// Turns a boolean check into a result, building the error lazily.
pub fn bool_to_error<F>(ok: bool, make_err: F) -> KvResult<()>
where
    F: FnOnce() -> KvError,
{
    if ok { Ok(()) } else { Err(make_err()) }
}
