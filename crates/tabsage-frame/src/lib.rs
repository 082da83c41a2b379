pub mod frame;
pub mod markdown;
pub mod normalize;

pub use frame::{Frame, Value};
pub use markdown::{EMPTY_SENTINEL, parse_markdown, subset_markdown, to_markdown};
pub use normalize::{
    DEFAULT_EXPANSION_CEILING, coerce_numeric, expand_to_full_rows, inject_row_identity,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// No pipe-delimited table block was found in the given text.
    NoTable,
    /// A row's cell count does not match the frame header.
    RowWidth { expected: usize, got: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoTable => write!(f, "no markdown table found in text"),
            Error::RowWidth { expected, got } => {
                write!(f, "row width mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for Error {}
