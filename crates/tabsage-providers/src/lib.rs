pub mod extract;
pub mod openai;
pub mod traits;

pub use extract::{Parsed, parse_or_fallback, strip_code_fence};
pub use openai::{OpenAiConfig, OpenAiGenerator};
pub use traits::{
    GeneratedStatement, GenerationKind, GenerationRequest, GenerationResult, Generator,
    RewriteResult, SelectionResult,
};

use std::fmt;

/// Result type for tabsage-providers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur when talking to a generator backend
#[derive(Debug)]
pub enum Error {
    /// Transport-level failure reaching the backend
    Http(reqwest::Error),

    /// Backend answered with a non-success status
    Api { status: u16, body: String },

    /// Backend answered but the payload carried no usable content
    EmptyResponse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "generator HTTP error: {}", err),
            Error::Api { status, body } => {
                write!(f, "generator API error (status {}): {}", status, body)
            }
            Error::EmptyResponse(what) => write!(f, "generator returned no content for {}", what),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Api { .. } | Error::EmptyResponse(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}
