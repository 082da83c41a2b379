pub mod agent;
pub mod classify;
pub mod guard;
pub mod history;
pub mod retry;
pub mod schema_derive;
pub mod source;
pub mod sql;

pub use agent::{CodeExecutor, FrameAgent, FrameAgentOptions, SqlAgent, SqlAgentOptions};
pub use classify::{Classification, ErrorSignatures, classify, is_empty_markdown, looks_like_table};
pub use guard::{GuardPolicy, cap_limit, is_select_only, strip_noise};
pub use history::{HeuristicEstimator, HistoryWindow, TokenEstimator};
pub use retry::{AttemptOutput, QueryOutcome, RetryPolicy, run_with_retry};
pub use schema_derive::{derive_schema, render_preview};
pub use source::read_csv;
pub use sql::{
    SqlExecution, SqlOutcome, execute_guarded, ingest_frame, introspect_table, list_tables,
    table_preview,
};

use std::fmt;

/// Result type for tabsage-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the engine layer
#[derive(Debug)]
pub enum Error {
    /// Cache/session layer error
    Store(tabsage_store::Error),

    /// Tabular value error
    Frame(tabsage_frame::Error),

    /// Generator backend error
    Generator(tabsage_providers::Error),

    /// Relational engine error
    Sql(rusqlite::Error),

    /// CSV ingestion error
    Csv(csv::Error),

    /// External executor failed to run generated code
    Execution(String),

    /// A data source precondition does not hold (missing table, empty file)
    Source(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(err) => write!(f, "Store error: {}", err),
            Error::Frame(err) => write!(f, "Frame error: {}", err),
            Error::Generator(err) => write!(f, "Generator error: {}", err),
            Error::Sql(err) => write!(f, "SQL error: {}", err),
            Error::Csv(err) => write!(f, "CSV error: {}", err),
            Error::Execution(msg) => write!(f, "Execution error: {}", msg),
            Error::Source(msg) => write!(f, "Source error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Frame(err) => Some(err),
            Error::Generator(err) => Some(err),
            Error::Sql(err) => Some(err),
            Error::Csv(err) => Some(err),
            Error::Execution(_) | Error::Source(_) => None,
        }
    }
}

impl From<tabsage_store::Error> for Error {
    fn from(err: tabsage_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<tabsage_frame::Error> for Error {
    fn from(err: tabsage_frame::Error) -> Self {
        Error::Frame(err)
    }
}

impl From<tabsage_providers::Error> for Error {
    fn from(err: tabsage_providers::Error) -> Self {
        Error::Generator(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sql(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}
