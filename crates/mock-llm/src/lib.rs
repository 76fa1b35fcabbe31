//! Mock completion providers for testing message generation.
//!
//! This crate provides mock implementations of `CompletionProvider`:
//! - `EchoProvider` - Echoes the last user message back
//! - `ScriptedProvider` - Replays a fixed sequence of results
//! - `FailingProvider` - Always fails
//! - `DelayedProvider` - Wraps another provider with artificial delay
//! - `CountingProvider` - Wraps another provider and records every request
//!
//! For production use the `llm-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_llm::{CompletionProvider, CompletionRequest, EchoProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_llm::ProviderError> {
//!     let provider = EchoProvider::new();
//!     let reply = provider
//!         .complete(CompletionRequest::new("system", "Sumiu hein"))
//!         .await?;
//!     assert_eq!(reply, "Sumiu hein");
//!     Ok(())
//! }
//! ```

mod counting;
mod delayed;
mod echo;
mod scripted;

// Re-export llm-core types for convenience
pub use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};

pub use counting::CountingProvider;
pub use delayed::DelayedProvider;
pub use echo::EchoProvider;
pub use scripted::{FailingProvider, ScriptedProvider};
