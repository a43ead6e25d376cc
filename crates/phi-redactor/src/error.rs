//! Error types for building pattern tables.

use thiserror::Error;

use crate::identifier::IdentifierType;

/// Errors raised while constructing a [`PatternTable`](crate::PatternTable).
///
/// Detection itself never fails.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// A pattern did not compile.
    #[error("invalid {kind} pattern: {source}")]
    InvalidPattern {
        kind: IdentifierType,
        #[source]
        source: regex::Error,
    },
}
