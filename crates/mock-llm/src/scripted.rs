//! Providers with predetermined outcomes.

use std::collections::VecDeque;

use llm_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use tokio::sync::Mutex;

/// A provider that replays a fixed sequence of outcomes, in call order.
///
/// `Ok(text)` entries are returned as completions, `Err(())` entries as a
/// provider error. Once the script runs out every call fails.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ()>>>,
}

impl ScriptedProvider {
    /// Create a provider from a script.
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<S, ()>>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(script.into_iter().map(|r| r.map(Into::into)).collect()),
        }
    }

    /// Create a provider that succeeds with each reply in turn.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(Ok))
    }

    /// Number of scripted outcomes not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        match self.script.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(ProviderError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }),
            None => Err(ProviderError::Network("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "ScriptedProvider"
    }
}

/// A provider whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            message: "provider unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "FailingProvider"
    }
}
