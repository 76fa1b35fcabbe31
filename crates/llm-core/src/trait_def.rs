//! The CompletionProvider trait definition.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::CompletionRequest;

/// Something that turns a prompt into free text.
///
/// This trait is object-safe and is used as `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request one completion and return its raw text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;
}
