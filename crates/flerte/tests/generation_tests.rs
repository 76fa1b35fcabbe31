//! End-to-end generation against mock providers and an in-memory database.

use std::sync::Arc;
use std::time::Duration;

use database::{conversation, message, transaction, user, Database, SubscriptionUpdate, TransactionType, UserUpsert};
use flerte::{FlerteError, GenerateRequest, MessageGenerator, SubscriptionManager, Tone, FALLBACK_REPLY};
use mock_llm::{CountingProvider, DelayedProvider, EchoProvider, FailingProvider, ScriptedProvider};

async fn setup() -> (Database, i64) {
    let db = Database::in_memory().await.unwrap();
    let user = user::upsert_user(
        db.pool(),
        &UserUpsert {
            open_id: "gen-user".to_string(),
            name: Some("Duda".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    (db, user.id)
}

async fn set_credits(db: &Database, user_id: i64, remaining: i64, total: i64) {
    SubscriptionManager::new(db.clone())
        .update(
            user_id,
            &SubscriptionUpdate {
                credits_remaining: Some(remaining),
                credits_total: Some(total),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

fn request(context: &str, tone: Tone) -> GenerateRequest {
    GenerateRequest {
        context: context.to_string(),
        tone,
        conversation_id: None,
    }
}

#[tokio::test]
async fn test_generate_three_replies_and_charge_one_credit() {
    let (db, user_id) = setup().await;
    let provider = ScriptedProvider::replies(["\"Bora!\"", "Tô dentro", "  Partiu  "]);
    let generator = MessageGenerator::new(db.clone(), Arc::new(provider));

    let response = generator
        .generate(user_id, &request("Vamos sair?", Tone::Bold))
        .await
        .unwrap();

    let contents: Vec<_> = response.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.len(), 3);
    for expected in ["Bora!", "Tô dentro", "Partiu"] {
        assert!(contents.contains(&expected), "missing {expected}");
    }

    let sub = SubscriptionManager::new(db.clone()).get_or_create(user_id).await.unwrap();
    assert_eq!(sub.credits_remaining, 9);

    let ledger = transaction::list_transactions(db.pool(), user_id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].transaction_type, TransactionType::CreditUsed);

    let stored = message::list_messages(db.pool(), response.conversation_id).await.unwrap();
    let stored: Vec<_> = stored.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(stored, contents);

    let conversation = conversation::get_conversation(db.pool(), response.conversation_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.title, "Vamos sair?");
    assert_eq!(conversation.tone, "bold");
}

#[tokio::test]
async fn test_prompts_carry_tone_and_variant() {
    let (db, user_id) = setup().await;
    let provider = Arc::new(CountingProvider::new(EchoProvider::new()));
    let generator = MessageGenerator::new(db, provider.clone());

    generator
        .generate(user_id, &request("Sumiu hein", Tone::Funny))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 3);
    let requests = provider.requests().await;
    let system = &requests[0].messages[0].content;
    assert!(requests.iter().all(|r| &r.messages[0].content == system));
    assert!(system.contains("ENGRAÇADO"));

    let mut variants: Vec<_> = requests
        .iter()
        .map(|r| r.last_user_text().unwrap().to_string())
        .collect();
    variants.sort();
    variants.dedup();
    assert_eq!(variants.len(), 3);
    assert!(variants.iter().all(|v| v.contains("\"Sumiu hein\"")));
}

#[tokio::test]
async fn test_no_credits_short_circuits() {
    let (db, user_id) = setup().await;
    set_credits(&db, user_id, 0, 10).await;

    let provider = Arc::new(CountingProvider::new(EchoProvider::new()));
    let generator = MessageGenerator::new(db.clone(), provider.clone());

    let result = generator.generate(user_id, &request("oi", Tone::Natural)).await;
    assert!(matches!(result, Err(FlerteError::NoCredits)));

    assert_eq!(provider.calls(), 0);
    assert_eq!(conversation::count_conversations(db.pool(), user_id).await.unwrap(), 0);
    assert!(transaction::list_transactions(db.pool(), user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unlimited_plan_is_never_charged() {
    let (db, user_id) = setup().await;
    set_credits(&db, user_id, 0, -1).await;

    let generator = MessageGenerator::new(db.clone(), Arc::new(EchoProvider::new()));
    for _ in 0..3 {
        generator
            .generate(user_id, &request("de novo", Tone::Natural))
            .await
            .unwrap();
    }

    let sub = SubscriptionManager::new(db.clone()).get_or_create(user_id).await.unwrap();
    assert_eq!(sub.credits_remaining, 0);
    assert!(transaction::list_transactions(db.pool(), user_id).await.unwrap().is_empty());
    assert_eq!(conversation::count_conversations(db.pool(), user_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_provider_failures_fall_back_and_still_charge() {
    let (db, user_id) = setup().await;
    let generator = MessageGenerator::new(db.clone(), Arc::new(FailingProvider));

    let response = generator
        .generate(user_id, &request("oi", Tone::Natural))
        .await
        .unwrap();

    assert!(response.messages.iter().all(|m| m.content == FALLBACK_REPLY));
    let sub = SubscriptionManager::new(db).get_or_create(user_id).await.unwrap();
    assert_eq!(sub.credits_remaining, 9);
}

#[tokio::test]
async fn test_partial_failure_keeps_good_replies() {
    let (db, user_id) = setup().await;
    let provider = ScriptedProvider::new([Ok("Primeira"), Err(()), Ok("")]);
    let generator = MessageGenerator::new(db, Arc::new(provider));

    let response = generator
        .generate(user_id, &request("oi", Tone::Natural))
        .await
        .unwrap();

    let contents: Vec<_> = response.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.iter().filter(|c| **c == "Primeira").count(), 1);
    assert_eq!(contents.iter().filter(|c| **c == FALLBACK_REPLY).count(), 2);
}

#[tokio::test]
async fn test_slow_provider_times_out_to_fallback() {
    let (db, user_id) = setup().await;
    let provider = DelayedProvider::with_millis(EchoProvider::new(), 500);
    let generator = MessageGenerator::new(db, Arc::new(provider))
        .with_call_timeout(Duration::from_millis(20));

    let response = generator
        .generate(user_id, &request("oi", Tone::Natural))
        .await
        .unwrap();

    assert!(response.messages.iter().all(|m| m.content == FALLBACK_REPLY));
}

#[tokio::test]
async fn test_each_call_creates_a_new_conversation() {
    let (db, user_id) = setup().await;
    let generator = MessageGenerator::new(db.clone(), Arc::new(EchoProvider::new()));

    let first = generator
        .generate(user_id, &request("um", Tone::Natural))
        .await
        .unwrap();
    let second = generator
        .generate(
            user_id,
            &GenerateRequest {
                conversation_id: Some(first.conversation_id),
                ..request("dois", Tone::Natural)
            },
        )
        .await
        .unwrap();

    assert_ne!(first.conversation_id, second.conversation_id);
    assert_eq!(conversation::count_conversations(db.pool(), user_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_blank_context_uses_default_title() {
    let (db, user_id) = setup().await;
    let generator = MessageGenerator::new(db.clone(), Arc::new(EchoProvider::new()));

    let response = generator
        .generate(user_id, &request("   ", Tone::Natural))
        .await
        .unwrap();

    let conversation = conversation::get_conversation(db.pool(), response.conversation_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.title, "Nova conversa");
}

#[tokio::test]
async fn test_oversized_context_rejected_without_charge() {
    let (db, user_id) = setup().await;
    let generator = MessageGenerator::new(db.clone(), Arc::new(EchoProvider::new()));

    let result = generator
        .generate(user_id, &request(&"a".repeat(4001), Tone::Natural))
        .await;
    assert!(matches!(result, Err(FlerteError::InvalidInput(_))));

    let sub = SubscriptionManager::new(db).get_or_create(user_id).await.unwrap();
    assert_eq!(sub.credits_remaining, 10);
}

#[tokio::test]
async fn test_concurrent_generations_respect_balance() {
    let (db, user_id) = setup().await;
    set_credits(&db, user_id, 2, 10).await;
    let generator = MessageGenerator::new(db.clone(), Arc::new(EchoProvider::new()));

    let req = request("oi", Tone::Natural);
    let attempts = (0..5).map(|_| generator.generate(user_id, &req));
    let results = futures::future::join_all(attempts).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(FlerteError::NoCredits)))
        .count();
    assert_eq!((ok, refused), (2, 3));

    let sub = SubscriptionManager::new(db).get_or_create(user_id).await.unwrap();
    assert_eq!(sub.credits_remaining, 0);
}
