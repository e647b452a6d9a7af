//! # Guard predicates
//!
//! Each authorization/state rule lives here exactly once, so endpoints that
//! share a rule cannot drift apart.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Actor, Conversation, Order};
use crate::traits::DisputeRepo;

/// The order's buyer is the only party allowed to open disputes, request
/// cancellation and leave reviews.
pub fn is_buyer_of(order: &Order, actor: &Actor) -> bool {
    order.buyer_id == actor.id
}

pub fn is_vendor_of(order: &Order, actor: &Actor) -> bool {
    order.vendor_id == actor.id
}

/// Vendor-or-admin capability gate for the order workflow.
pub fn can_manage_order(order: &Order, actor: &Actor) -> bool {
    actor.is_admin() || is_vendor_of(order, actor)
}

/// Buyer, vendor or admin may read an order.
pub fn can_view_order(order: &Order, actor: &Actor) -> bool {
    actor.is_admin() || is_buyer_of(order, actor) || is_vendor_of(order, actor)
}

pub fn is_participant(conversation: &Conversation, actor: &Actor) -> bool {
    conversation.participants.contains(&actor.id)
}

/// Set equality over participant lists: order-insensitive, duplicates
/// collapse.
pub fn same_participant_set(a: &[Uuid], b: &[Uuid]) -> bool {
    use std::collections::HashSet;
    let a: HashSet<Uuid> = a.iter().copied().collect();
    let b: HashSet<Uuid> = b.iter().copied().collect();
    a == b
}

/// Structural context equality. `serde_json::Value` compares objects by
/// key/value content, not insertion order, which is exactly the dedup
/// semantics we want; `Null` and `{}` are distinct on purpose.
pub fn same_context(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    a == b
}

/// The dispute lock: any dispute in the active set blocks the parent
/// order's vendor workflow.
pub async fn has_active_dispute(disputes: &dyn DisputeRepo, order_id: Uuid) -> Result<bool> {
    let active = disputes.active_for_order(order_id).await?;
    Ok(!active.is_empty())
}
