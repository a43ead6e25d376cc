//! Detection and masking of protected health information (PHI).
//!
//! The [`Redactor`] scans free text against an immutable [`PatternTable`]
//! and produces a [`RedactionResult`]: the masked text, every identifier it
//! found with a confidence score, and an overall [`RiskTier`].
//!
//! Detection is best-effort. It never fails on input: empty, odd or
//! non-UTF-8 text simply yields zero identifiers.
//!
//! # Example
//!
//! ```rust
//! use phi_redactor::{IdentifierType, Redactor, RiskTier};
//!
//! let redactor = Redactor::new();
//! let result = redactor.detect("My SSN is 123-45-6789");
//!
//! assert_eq!(result.redacted_text, "My SSN is XXX-XX-XXXX");
//! assert_eq!(result.identifiers[0].kind, IdentifierType::Ssn);
//! assert!(result.risk_tier >= RiskTier::Medium);
//! ```

mod error;
mod identifier;
mod mask;
mod patterns;
mod redactor;

pub use error::RedactorError;
pub use identifier::{Identifier, IdentifierType, RedactionResult, RiskTier, Span};
pub use patterns::{PatternTable, VIETNAMESE_SURNAMES};
pub use redactor::Redactor;
