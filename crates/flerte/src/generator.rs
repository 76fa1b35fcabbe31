//! Reply generation: credit check, conversation record, three completions.

use std::sync::Arc;
use std::time::Duration;

use database::{conversation, message, validation, Database, MessageType, NewConversation, NewMessage};
use futures::future::join_all;
use llm_core::{prompt_fingerprint, CompletionProvider, CompletionRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credits::SubscriptionManager;
use crate::error::{FlerteError, Result};
use crate::prompt::{self, Tone, FALLBACK_REPLY, VARIANT_COUNT};

/// Title used when the received message is blank.
pub const DEFAULT_TITLE: &str = "Nova conversa";

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Default ceiling for a single completion call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Input of a generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// The message the user received, pasted verbatim.
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub tone: Tone,
    /// Accepted for forward compatibility; a new conversation is always created.
    #[serde(default)]
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedReply {
    pub content: String,
}

/// Three reply suggestions and the conversation that stores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub conversation_id: i64,
    pub messages: Vec<GeneratedReply>,
}

/// Conversation title: the first characters of the trimmed context.
pub fn conversation_title(context: &str) -> String {
    let trimmed = context.trim();
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.chars().take(TITLE_MAX_CHARS).collect()
    }
}

/// Generates tone-specific reply suggestions against a completion provider.
#[derive(Clone)]
pub struct MessageGenerator {
    db: Database,
    subscriptions: SubscriptionManager,
    provider: Arc<dyn CompletionProvider>,
    call_timeout: Duration,
}

impl MessageGenerator {
    pub fn new(db: Database, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            subscriptions: SubscriptionManager::new(db.clone()),
            db,
            provider,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Generate three replies for `user_id`.
    ///
    /// Fails with [`FlerteError::NoCredits`] before any provider call or write
    /// when a finite balance is exhausted. The credit is consumed before the
    /// provider is called and is kept even if every call falls back.
    pub async fn generate(&self, user_id: i64, request: &GenerateRequest) -> Result<GenerateResponse> {
        validation::validate_context(&request.context)
            .map_err(|e| FlerteError::InvalidInput(e.to_string()))?;

        let subscription = self.subscriptions.get_or_create(user_id).await?;
        if !subscription.has_credits() {
            info!(user_id, "Generation refused: no credits");
            return Err(FlerteError::NoCredits);
        }
        if !subscription.is_unlimited() && !self.subscriptions.deduct(user_id).await? {
            info!(user_id, "Generation refused: balance drained concurrently");
            return Err(FlerteError::NoCredits);
        }

        // TODO: append to `request.conversation_id` once multi-turn history is
        // specified; until then every call opens a new conversation.
        if let Some(requested) = request.conversation_id {
            debug!(user_id, requested, "Ignoring conversation id, creating a new conversation");
        }

        let conversation = conversation::create_conversation(
            self.db.pool(),
            &NewConversation {
                user_id,
                title: conversation_title(&request.context),
                context: Some(request.context.clone()),
                tone: request.tone.to_string(),
            },
        )
        .await?;

        let replies = self.complete_variants(request).await;

        for content in &replies {
            message::add_message(
                self.db.pool(),
                &NewMessage {
                    conversation_id: conversation.id,
                    user_id,
                    message_type: MessageType::Generated,
                    content: content.clone(),
                },
            )
            .await?;
        }

        info!(
            user_id,
            conversation_id = conversation.id,
            tone = %request.tone,
            "Generated replies"
        );

        Ok(GenerateResponse {
            conversation_id: conversation.id,
            messages: replies
                .into_iter()
                .map(|content| GeneratedReply { content })
                .collect(),
        })
    }

    /// Issue the variant calls concurrently. Every slot yields a reply.
    async fn complete_variants(&self, request: &GenerateRequest) -> Vec<String> {
        let system = prompt::system_prompt(request.tone);
        debug!(
            provider = self.provider.name(),
            prompt = %prompt_fingerprint(&system),
            "Requesting completions"
        );

        let calls = (1..=VARIANT_COUNT).map(|variant| {
            let completion = CompletionRequest::new(
                system.clone(),
                prompt::user_prompt(request.tone, &request.context, variant),
            );
            async move {
                let call = self.provider.complete(completion);
                match tokio::time::timeout(self.call_timeout, call).await {
                    Ok(Ok(text)) => prompt::clean_completion(&text),
                    Ok(Err(e)) => {
                        warn!(variant, error = %e, "Completion failed, using fallback");
                        FALLBACK_REPLY.to_string()
                    }
                    Err(_) => {
                        warn!(
                            variant,
                            timeout = ?self.call_timeout,
                            "Completion timed out, using fallback"
                        );
                        FALLBACK_REPLY.to_string()
                    }
                }
            }
        });

        join_all(calls).await
    }
}
