//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Repos return `anyhow::Result`: infrastructure failures are converted to
//! `AppError::Internal` at the workflow boundary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Actor, Conversation, ConversationKind, Dispute, DisputeStatus, Message, Order, OrderStatus,
    RatingSummary, Review, TimelineEntry,
};

/// Persistence contract for orders and their timelines.
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn create_order(&self, order: Order) -> anyhow::Result<()>;
    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
    /// Orders where the user is buyer or vendor, newest first.
    async fn list_orders_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>>;
    /// Status write + timeline append in one transaction. The timeline is
    /// append-only; entries are never rewritten.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        entry: TimelineEntry,
    ) -> anyhow::Result<()>;
}

/// Persistence contract for disputes.
#[async_trait]
pub trait DisputeRepo: Send + Sync {
    async fn create_dispute(&self, dispute: Dispute) -> anyhow::Result<()>;
    async fn get_dispute(&self, id: Uuid) -> anyhow::Result<Option<Dispute>>;
    /// Disputes for the order whose status is in the active set
    /// (opened / negotiating / escalated).
    async fn active_for_order(&self, order_id: Uuid) -> anyhow::Result<Vec<Dispute>>;
    async fn set_status(&self, id: Uuid, status: DisputeStatus) -> anyhow::Result<()>;
}

/// Persistence contract for conversations and messages.
#[async_trait]
pub trait ConversationRepo: Send + Sync {
    async fn create_conversation(&self, conversation: Conversation) -> anyhow::Result<()>;
    async fn get_conversation(&self, id: Uuid) -> anyhow::Result<Option<Conversation>>;
    /// Dedup candidates: conversations of `kind` the user participates in.
    async fn find_by_kind_for_participant(
        &self,
        kind: ConversationKind,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<Conversation>>;
    /// All conversations the user participates in, most recently active
    /// first.
    async fn list_for_participant(&self, user_id: Uuid) -> anyhow::Result<Vec<Conversation>>;
    /// Message insert + parent `last_message_at` bump in one transaction.
    async fn create_message(&self, message: Message) -> anyhow::Result<()>;
    async fn get_message(&self, id: Uuid) -> anyhow::Result<Option<Message>>;
    /// Messages of a conversation in ascending creation order.
    async fn list_messages(&self, conversation_id: Uuid) -> anyhow::Result<Vec<Message>>;
    /// Adds the user to the message's read-by set; idempotent.
    async fn mark_read(&self, message_id: Uuid, user_id: Uuid) -> anyhow::Result<()>;
}

/// Persistence contract for reviews and rating aggregates.
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn create_review(&self, review: Review) -> anyhow::Result<()>;
    async fn find_by_author_and_product(
        &self,
        author_id: Uuid,
        product_id: Uuid,
    ) -> anyhow::Result<Option<Review>>;
    /// Count and mean over every review of the product. Always a full
    /// recompute; never an incremental update that can drift.
    async fn rating_summary(&self, product_id: Uuid) -> anyhow::Result<RatingSummary>;
}

/// Identity contract: resolves session tokens to actors.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolves a bearer token. `Ok(None)` means the token is absent,
    /// malformed or tampered with.
    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<Actor>>;

    /// Issues a token for a freshly authenticated actor.
    fn issue_session(&self, actor: &Actor) -> anyhow::Result<String>;

    /// Verifies a login password against a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;
}
