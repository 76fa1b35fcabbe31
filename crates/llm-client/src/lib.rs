//! OpenAI-compatible completion provider.
//!
//! Talks to any `/v1/chat/completions` endpoint (OpenAI, xAI, local
//! gateways) and implements [`llm_core::CompletionProvider`].
//!
//! ```rust,no_run
//! use llm_client::OpenAiClient;
//! use llm_core::{CompletionProvider, CompletionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::from_env()?;
//!     let reply = client
//!         .complete(CompletionRequest::new("Seja breve.", "Sumiu, hein?"))
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::{LlmClientConfig, LlmClientConfigBuilder};

// Re-export llm-core types for convenience
pub use llm_core::{async_trait, ChatMessage, CompletionProvider, CompletionRequest, ProviderError};
