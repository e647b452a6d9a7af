//! # Domain Models
//!
//! These structs represent the core entities of the marketplace workflow.
//! We use UUID v7 for time-ordered, globally unique identification, and
//! integer cents for all money fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A caller resolved from a session token.
///
/// Every entity reference in the system is an opaque `Uuid`; the actor is the
/// single place where identity, display name and capability meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Vendor,
    Admin,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One purchased line of an Order. `title` and `unit_price_cents` are
/// snapshots taken at checkout so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// The canonical order status vocabulary. The admin-facing "new/processing"
/// wording maps onto `Pending`/`Confirmed`; there is exactly one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    CancellationRequested,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::CancellationRequested => "cancellation_requested",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Append-only audit record of a status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A buyer's purchase record. Orders are never physically deleted; the
/// timeline only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Vec<LineItem>,
    pub subtotal_cents: i64,
    pub delivery_cents: i64,
    /// Always `subtotal_cents + delivery_cents`; fixed at creation.
    pub total_cents: i64,
    /// Chosen payment method, a display label only.
    pub payment_method: String,
    pub city: String,
    pub address: String,
    pub comment: Option<String>,
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
}

/// Checkout input for a new Order. Totals are computed by the workflow, not
/// trusted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub vendor_id: Uuid,
    pub items: Vec<LineItem>,
    pub delivery_cents: i64,
    pub payment_method: String,
    pub city: String,
    pub address: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Opened,
    Negotiating,
    Escalated,
    ResolvedRefund,
    ResolvedDismissed,
    Cancelled,
}

impl DisputeStatus {
    /// Statuses that count as "currently blocking" for the order lock.
    pub const ACTIVE: [DisputeStatus; 3] = [
        DisputeStatus::Opened,
        DisputeStatus::Negotiating,
        DisputeStatus::Escalated,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    NotDelivered,
    QualityIssue,
    WrongItem,
    DamagedItem,
    Other,
}

/// Terminal outcomes an admin or vendor can apply to a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeResolution {
    Refund,
    Dismissed,
    Cancelled,
}

impl DisputeResolution {
    pub fn terminal_status(self) -> DisputeStatus {
        match self {
            DisputeResolution::Refund => DisputeStatus::ResolvedRefund,
            DisputeResolution::Dismissed => DisputeStatus::ResolvedDismissed,
            DisputeResolution::Cancelled => DisputeStatus::Cancelled,
        }
    }
}

/// A buyer-initiated escalation against an Order. While a dispute is in an
/// active status it locks the parent order's vendor workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub initiator_id: Uuid,
    pub respondent_id: Uuid,
    pub reason: DisputeReason,
    pub description: String,
    pub amount_requested_cents: i64,
    pub status: DisputeStatus,
    /// Attachment references (opaque ids or URLs) supplied as evidence.
    pub evidence: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    PreSales,
    OrderSupport,
    Dispute,
}

/// A deduplicated message thread. Uniqueness key is
/// (kind, participant set, context) — see the messaging workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: ConversationKind,
    /// Exactly the users entitled to read and write. Set semantics; order
    /// is not significant.
    pub participants: Vec<Uuid>,
    /// Free-form business context, e.g. {"product_id": ...} or
    /// {"order_id": ..., "dispute_id": ...}. Compared structurally.
    pub context: serde_json::Value,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub attachments: Vec<String>,
    /// Users who have seen this message. The sender is a member from birth.
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Published,
    Hidden,
}

/// A buyer's product review, gated on a delivered order. At most one per
/// (author, product) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub order_id: Uuid,
    pub author_id: Uuid,
    /// 1..=5 inclusive.
    pub rating: u8,
    pub body: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating for a product, always recomputed from the full review
/// set so repeated add/remove cycles cannot accumulate float drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub count: u32,
    pub average: f64,
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self { count: 0, average: 0.0 }
    }
}
