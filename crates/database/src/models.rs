//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Plan identifier of the default free tier.
pub const FREE_PLAN: &str = "free";

/// Credits granted to a new free subscription.
pub const FREE_CREDITS: i64 = 10;

/// `credits_total` value marking an unlimited plan.
pub const UNLIMITED_CREDITS: i64 = -1;

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// A user, created on first successful external authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate key used by every other table.
    pub id: i64,
    /// Opaque identifier from the external auth provider.
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// How the user signed in (e.g. "google", "email").
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
    pub last_signed_in: String,
}

/// Fields supplied by the auth provider on login.
///
/// `None` fields are left untouched on an existing row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpsert {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
}

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Wire/storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

/// The single subscription row owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    /// `free` or a composite plan key such as `pro_monthly`.
    pub plan: String,
    pub status: SubscriptionStatus,
    /// Remaining credits. Meaningless when the plan is unlimited.
    pub credits_remaining: i64,
    /// Credits granted by the plan, or [`UNLIMITED_CREDITS`].
    pub credits_total: i64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Subscription {
    /// Whether the plan bypasses credit accounting.
    pub fn is_unlimited(&self) -> bool {
        self.credits_total == UNLIMITED_CREDITS
    }

    /// Whether a generation may start right now.
    pub fn has_credits(&self) -> bool {
        self.is_unlimited() || self.credits_remaining > 0
    }
}

/// Field-level patch applied to a subscription.
///
/// Outer `None` leaves a column unchanged. For nullable columns the inner
/// `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    pub plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub credits_remaining: Option<i64>,
    pub credits_total: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub stripe_customer_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub stripe_subscription_id: Option<Option<String>>,
}

impl SubscriptionUpdate {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Distinguishes an explicit JSON `null` from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One message-generation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    /// First 50 characters of the context, or a default title.
    pub title: String,
    /// The received message the user pasted in.
    pub context: Option<String>,
    pub tone: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for inserting a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub user_id: i64,
    pub title: String,
    pub context: Option<String>,
    pub tone: String,
}

/// Origin of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MessageType {
    Generated,
    UserInput,
}

/// User feedback on a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

/// A message belonging to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub is_favorite: bool,
    pub feedback: Option<Feedback>,
    pub created_at: String,
}

/// Fields for inserting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: i64,
    pub user_id: i64,
    pub message_type: MessageType,
    pub content: String,
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TransactionType {
    /// A paid checkout; `amount` is in minor currency units.
    Purchase,
    /// One generation; `amount` is in credits.
    CreditUsed,
    /// Manually granted credits.
    CreditAdded,
}

/// Append-only ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub description: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub created_at: String,
}

/// Fields for inserting a ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub description: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
}

/// A payment processor event that has already been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub received_at: String,
}
