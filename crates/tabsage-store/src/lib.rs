pub mod cache;
pub mod query_log;
pub mod session;
pub mod workspace;

pub use cache::{CacheArtifacts, CacheEntry, ProducerResult, Store};
pub use query_log::append_query_log;
pub use session::Session;
pub use workspace::resolve_workspace_path;

use std::fmt;
use std::path::PathBuf;

/// Result type for tabsage-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// Artifact serialization/deserialization failed
    Json(serde_json::Error),

    /// A cache artifact required for projection does not exist
    MissingArtifact(PathBuf),

    /// A copy into a session directory completed without error but left no
    /// usable file behind
    CopyFailed(PathBuf),

    /// The supplied artifact producer failed
    Producer(Box<dyn std::error::Error + Send + Sync>),

    /// Workspace path could not be resolved
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "Artifact JSON error: {}", err),
            Error::MissingArtifact(path) => {
                write!(f, "source artifact not found: {}", path.display())
            }
            Error::CopyFailed(path) => {
                write!(f, "copy produced no usable file: {}", path.display())
            }
            Error::Producer(err) => write!(f, "Producer error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Producer(err) => Some(&**err),
            Error::MissingArtifact(_) | Error::CopyFailed(_) | Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
