//! Dispute lifecycle: buyer-opened escalations that lock the parent order's
//! vendor workflow until resolved.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::guards;
use crate::models::{
    Actor, Conversation, ConversationKind, Dispute, DisputeReason, DisputeResolution,
    DisputeStatus,
};
use crate::traits::{DisputeRepo, OrderRepo};
use crate::workflow::messaging::MessageCenter;

pub struct DisputeDesk {
    disputes: Arc<dyn DisputeRepo>,
    orders: Arc<dyn OrderRepo>,
    messages: Arc<MessageCenter>,
}

pub struct DisputeDraft {
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub reason: DisputeReason,
    pub description: String,
    pub amount_requested_cents: i64,
    pub evidence: Vec<String>,
}

impl DisputeDesk {
    pub fn new(
        disputes: Arc<dyn DisputeRepo>,
        orders: Arc<dyn OrderRepo>,
        messages: Arc<MessageCenter>,
    ) -> Self {
        Self { disputes, orders, messages }
    }

    /// Buyer opens a dispute against their order. At most one active dispute
    /// may exist per order; while it is active the order is locked.
    pub async fn open_dispute(&self, actor: &Actor, draft: DisputeDraft) -> Result<Dispute> {
        if draft.description.trim().is_empty() {
            return Err(AppError::ValidationError("dispute needs a description".into()));
        }
        if draft.amount_requested_cents < 0 {
            return Err(AppError::ValidationError(
                "requested amount cannot be negative".into(),
            ));
        }

        let order = self
            .orders
            .get_order(draft.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".into(), draft.order_id.to_string()))?;

        if !guards::is_buyer_of(&order, actor) {
            return Err(AppError::Forbidden(
                "only the order's buyer may open a dispute".into(),
            ));
        }
        if guards::has_active_dispute(self.disputes.as_ref(), order.id).await? {
            return Err(AppError::Conflict(
                "an active dispute already exists for this order".into(),
            ));
        }

        let now = Utc::now();
        let dispute = Dispute {
            id: Uuid::now_v7(),
            order_id: order.id,
            product_id: draft.product_id,
            initiator_id: actor.id,
            respondent_id: order.vendor_id,
            reason: draft.reason,
            description: draft.description,
            amount_requested_cents: draft.amount_requested_cents,
            status: DisputeStatus::Opened,
            evidence: draft.evidence,
            created_at: now,
            updated_at: now,
        };
        self.disputes.create_dispute(dispute.clone()).await?;
        log::info!("dispute {} opened on order {} by buyer {}", dispute.id, order.id, actor.id);
        Ok(dispute)
    }

    /// Vendor-or-admin terminal decision. Once the dispute leaves the active
    /// set, the order lock releases by itself: the guard query stops
    /// matching.
    pub async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        actor: &Actor,
        resolution: DisputeResolution,
    ) -> Result<Dispute> {
        let mut dispute = self.load(dispute_id).await?;

        if !actor.is_admin() && dispute.respondent_id != actor.id {
            return Err(AppError::Forbidden(
                "only the respondent vendor or an admin may resolve a dispute".into(),
            ));
        }
        if !dispute.status.is_active() {
            return Err(AppError::Conflict("dispute is already resolved".into()));
        }

        let terminal = resolution.terminal_status();
        self.disputes.set_status(dispute.id, terminal).await?;
        log::info!("dispute {} resolved as {:?}", dispute.id, resolution);
        dispute.status = terminal;
        dispute.updated_at = Utc::now();
        Ok(dispute)
    }

    /// Escalation moves the dispute to `Escalated` and opens (or reuses) the
    /// dispute conversation between initiator and respondent so negotiation
    /// has a thread to live in.
    pub async fn escalate_dispute(
        &self,
        dispute_id: Uuid,
        actor: &Actor,
    ) -> Result<(Dispute, Conversation)> {
        let mut dispute = self.load(dispute_id).await?;

        let is_party = actor.id == dispute.initiator_id || actor.id == dispute.respondent_id;
        if !actor.is_admin() && !is_party {
            return Err(AppError::Forbidden("you are not a party to this dispute".into()));
        }
        if !matches!(dispute.status, DisputeStatus::Opened | DisputeStatus::Negotiating) {
            return Err(AppError::Conflict(format!(
                "dispute cannot be escalated from {:?}",
                dispute.status
            )));
        }

        self.disputes
            .set_status(dispute.id, DisputeStatus::Escalated)
            .await?;
        dispute.status = DisputeStatus::Escalated;
        dispute.updated_at = Utc::now();

        // The participant set of the dispute thread is always the two
        // counterparties, even when an admin triggers the escalation.
        let participants = vec![dispute.initiator_id, dispute.respondent_id];
        let context = json!({
            "order_id": dispute.order_id,
            "dispute_id": dispute.id,
        });
        let conversation = self
            .messages
            .get_or_create_conversation_for(
                ConversationKind::Dispute,
                participants,
                context,
            )
            .await?;

        log::info!("dispute {} escalated, conversation {}", dispute.id, conversation.id);
        Ok((dispute, conversation))
    }

    pub async fn get_dispute(&self, dispute_id: Uuid, actor: &Actor) -> Result<Dispute> {
        let dispute = self.load(dispute_id).await?;
        let is_party = actor.id == dispute.initiator_id || actor.id == dispute.respondent_id;
        if !actor.is_admin() && !is_party {
            return Err(AppError::Forbidden("you are not a party to this dispute".into()));
        }
        Ok(dispute)
    }

    async fn load(&self, dispute_id: Uuid) -> Result<Dispute> {
        self.disputes
            .get_dispute(dispute_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Dispute".into(), dispute_id.to_string()))
    }
}
