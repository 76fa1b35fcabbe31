//! Counting provider - records every request passed through it.

use std::sync::atomic::{AtomicUsize, Ordering};

use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use tokio::sync::Mutex;

/// Wraps a provider and keeps a log of the requests it saw.
pub struct CountingProvider<P: CompletionProvider> {
    inner: P,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl<P: CompletionProvider> CountingProvider<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copies of every request received, in arrival order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for CountingProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
