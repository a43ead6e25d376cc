//! Mock text-generation backends for the care pipeline.
//!
//! This crate provides implementations of the `Brain` trait for testing:
//! - `ScriptedBrain` - Canned replies chosen by system-prompt substring, or echo
//! - `FailingBrain` - Always fails, for fallback paths
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For a real model, use the `openai-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, GenerationRequest, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::replying("Take it with food.");
//!
//!     let out = brain.generate(GenerationRequest::new("system", "metformin?")).await?;
//!     assert_eq!(out.text, "Take it with food.");
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest, ModelParams};

pub use delayed::DelayedBrain;
pub use failing::FailingBrain;
pub use scripted::ScriptedBrain;
