//! Delayed provider - wraps another provider with artificial delay.

use std::time::Duration;

use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use tokio::time::sleep;

/// A provider that waits before delegating to another provider.
///
/// Useful for testing per-call timeouts.
pub struct DelayedProvider<P: CompletionProvider> {
    inner: P,
    delay: Duration,
}

impl<P: CompletionProvider> DelayedProvider<P> {
    /// Wrap `inner` with the specified delay.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Wrap `inner` with a delay in milliseconds.
    pub fn with_millis(inner: P, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for DelayedProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        "DelayedProvider"
    }
}
