//! Core trait and types for text-generation backends.
//!
//! This crate provides the shared interface between the care pipeline and
//! whatever model produces free text for it. It defines:
//!
//! - [`Brain`] - The trait that all backends must implement
//! - [`GenerationRequest`] / [`Generation`] - Input and output of one call
//! - [`ModelParams`] - Per-call model overrides
//! - [`BrainError`] - Error types for backend operations
//! - [`fingerprint`] - Stable SHA-256 fingerprints for prompts and audit hashes
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, Generation, GenerationRequest};
//! use async_trait::async_trait;
//!
//! struct CannedBrain;
//!
//! #[async_trait]
//! impl Brain for CannedBrain {
//!     async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError> {
//!         Ok(Generation::new(format!("You asked: {}", request.user_text)))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "CannedBrain"
//!     }
//! }
//! ```

mod error;
mod prompt;
mod request;
mod trait_def;

pub use error::BrainError;
pub use prompt::fingerprint;
pub use request::{Generation, GenerationRequest, ModelParams};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
