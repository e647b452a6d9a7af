//! Order lifecycle: checkout, vendor status progression, cancellation
//! requests, and the dispute lock.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::guards;
use crate::models::{Actor, Order, OrderDraft, OrderStatus, TimelineEntry};
use crate::status;
use crate::traits::{DisputeRepo, OrderRepo};

pub struct OrderDesk {
    orders: Arc<dyn OrderRepo>,
    disputes: Arc<dyn DisputeRepo>,
}

impl OrderDesk {
    pub fn new(orders: Arc<dyn OrderRepo>, disputes: Arc<dyn DisputeRepo>) -> Self {
        Self { orders, disputes }
    }

    /// Creates an order at checkout. Totals are computed here, never trusted
    /// from the caller, and are immutable afterwards.
    pub async fn place_order(&self, buyer: &Actor, draft: OrderDraft) -> Result<Order> {
        if draft.items.is_empty() {
            return Err(AppError::ValidationError("order has no line items".into()));
        }
        if draft.items.iter().any(|i| i.quantity == 0 || i.unit_price_cents < 0) {
            return Err(AppError::ValidationError(
                "line items need a positive quantity and a non-negative price".into(),
            ));
        }
        if draft.delivery_cents < 0 {
            return Err(AppError::ValidationError("delivery price cannot be negative".into()));
        }

        let subtotal: i64 = draft.items.iter().map(|i| i.line_total_cents()).sum();
        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(),
            buyer_id: buyer.id,
            vendor_id: draft.vendor_id,
            items: draft.items,
            subtotal_cents: subtotal,
            delivery_cents: draft.delivery_cents,
            total_cents: subtotal + draft.delivery_cents,
            payment_method: draft.payment_method,
            city: draft.city,
            address: draft.address,
            comment: draft.comment,
            status: OrderStatus::Pending,
            timeline: vec![TimelineEntry {
                status: OrderStatus::Pending,
                actor_id: buyer.id,
                actor_name: buyer.name.clone(),
                at: now,
                note: None,
            }],
            created_at: now,
        };

        self.orders.create_order(order.clone()).await?;
        log::info!("order {} placed by buyer {}", order.id, buyer.id);
        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid, actor: &Actor) -> Result<Order> {
        let order = self.load(order_id).await?;
        if !guards::can_view_order(&order, actor) {
            return Err(AppError::Forbidden("you are not a party to this order".into()));
        }
        Ok(order)
    }

    pub async fn list_orders_for(&self, actor: &Actor) -> Result<Vec<Order>> {
        Ok(self.orders.list_orders_for_user(actor.id).await?)
    }

    /// Vendor/admin advancement through the workflow graph.
    ///
    /// Guard order matters: ownership first, then the dispute lock, then the
    /// cancellation side-state, then the transition table.
    pub async fn request_status_change(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;

        if !guards::can_manage_order(&order, actor) {
            return Err(AppError::Forbidden(
                "only the assigned vendor or an admin may change order status".into(),
            ));
        }
        if guards::has_active_dispute(self.disputes.as_ref(), order_id).await? {
            return Err(AppError::Conflict("order locked by an active dispute".into()));
        }
        if order.status == OrderStatus::CancellationRequested
            && new_status == OrderStatus::Shipped
        {
            return Err(AppError::Conflict(
                "a pending cancellation request must be resolved before shipping".into(),
            ));
        }
        if !status::can_transition(order.status, new_status) {
            return Err(AppError::Conflict(format!(
                "cannot move order from {} to {}",
                order.status, new_status
            )));
        }

        self.apply_status(order, new_status, actor, note).await
    }

    /// Buyer asks to cancel before shipment. The order parks in the
    /// side-state until the vendor (or an admin) resolves the request.
    pub async fn request_cancellation(
        &self,
        order_id: Uuid,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;

        if !guards::is_buyer_of(&order, actor) {
            return Err(AppError::Forbidden("only the buyer may request cancellation".into()));
        }
        if !status::can_transition(order.status, OrderStatus::CancellationRequested) {
            return Err(AppError::Conflict(format!(
                "cancellation cannot be requested while the order is {}",
                order.status
            )));
        }

        self.apply_status(order, OrderStatus::CancellationRequested, actor, note)
            .await
    }

    /// Vendor/admin decision on a pending cancellation request: accept moves
    /// the order to `Cancelled`, reject restores the status it held before
    /// the request (replayed from the timeline).
    pub async fn resolve_cancellation(
        &self,
        order_id: Uuid,
        actor: &Actor,
        accept: bool,
        note: Option<String>,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;

        if !guards::can_manage_order(&order, actor) {
            return Err(AppError::Forbidden(
                "only the assigned vendor or an admin may resolve a cancellation".into(),
            ));
        }
        if order.status != OrderStatus::CancellationRequested {
            return Err(AppError::Conflict("no pending cancellation request".into()));
        }

        let target = if accept {
            OrderStatus::Cancelled
        } else {
            prior_status(&order).ok_or_else(|| {
                AppError::Internal(format!("order {} has no pre-request status", order.id))
            })?
        };
        self.apply_status(order, target, actor, note).await
    }

    async fn apply_status(
        &self,
        mut order: Order,
        new_status: OrderStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<Order> {
        let entry = TimelineEntry {
            status: new_status,
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            at: Utc::now(),
            note,
        };
        self.orders
            .update_status(order.id, new_status, entry.clone())
            .await?;
        log::info!("order {} moved {} -> {}", order.id, order.status, new_status);
        order.status = new_status;
        order.timeline.push(entry);
        Ok(order)
    }

    async fn load(&self, order_id: Uuid) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".into(), order_id.to_string()))
    }
}

/// Last status the order held before entering `CancellationRequested`,
/// replayed from the append-only timeline.
fn prior_status(order: &Order) -> Option<OrderStatus> {
    order
        .timeline
        .iter()
        .rev()
        .map(|e| e.status)
        .find(|s| *s != OrderStatus::CancellationRequested)
}
