//! OpenAI-compatible text-generation backend.
//!
//! This crate provides a [`Brain`] implementation that calls any
//! chat-completions endpoint speaking the OpenAI wire format. It is
//! stateless: every call sends exactly one system and one user message, so
//! no conversation history or PHI is retained between queries.
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::{Brain, GenerationRequest, OpenAiBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     let out = brain
//!         .generate(GenerationRequest::new("You are a pharmacist.", "Can I take ibuprofen?"))
//!         .await?;
//!     println!("{}", out.text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::OpenAiBrain;
pub use config::{OpenAiBrainConfig, OpenAiBrainConfigBuilder};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest, ModelParams};
