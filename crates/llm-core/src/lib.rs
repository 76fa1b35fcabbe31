//! Core trait and types for completion providers.
//!
//! This crate provides the shared interface between the message generator
//! and whatever LLM backend produces the replies. It defines:
//!
//! - [`CompletionProvider`] - The trait every provider implements
//! - [`ChatMessage`] / [`CompletionRequest`] - Request types
//! - [`ProviderError`] - Error types for provider calls
//!
//! # Example
//!
//! ```rust
//! use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl CompletionProvider for Canned {
//!     async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
//!         Ok("Bora tomar um café?".to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Canned"
//!     }
//! }
//! ```

mod error;
mod message;
mod prompt;
mod trait_def;

pub use error::ProviderError;
pub use message::{ChatMessage, CompletionRequest, Role};
pub use prompt::prompt_fingerprint;
pub use trait_def::CompletionProvider;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
