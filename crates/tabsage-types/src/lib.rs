pub mod identity;
pub mod schema;
pub mod turn;

pub use identity::{IdentityDigest, SourceIdentity, normalize_path};
pub use schema::{FieldSchema, FieldSummary, FieldType, TableSchema};
pub use turn::{QueryLogRecord, RetryInfo, RetryStatus, Turn};

/// Name of the hidden row-identity field injected into computation frames.
///
/// Never shown to the end user as a real field, but always present in the
/// allowed-field list handed to the generator so generated logic can carry
/// row positions back out of a partial result.
pub const ROW_IDENTITY_FIELD: &str = "__row_idx";
