//! # rm-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the workflow
//! services. Every handler resolves the caller's session first; business
//! rules never run for anonymous requests.

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use rm_core::models::{
    Actor, ConversationKind, DisputeReason, DisputeResolution, OrderDraft, OrderStatus,
};
use rm_core::traits::SessionProvider;
use rm_core::workflow::disputes::DisputeDraft;
use rm_core::workflow::{DisputeDesk, MessageCenter, OrderDesk, ReviewGate};
use rm_core::AppError;

use crate::error::ApiError;

/// State shared across all actix workers.
pub struct AppState {
    pub orders: OrderDesk,
    pub disputes: DisputeDesk,
    pub messages: Arc<MessageCenter>,
    pub reviews: ReviewGate,
    pub sessions: Arc<dyn SessionProvider>,
}

/// Resolves `Authorization: Bearer <token>` into an Actor.
async fn require_actor(state: &AppState, req: &HttpRequest) -> Result<Actor, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("missing session token".into()))?;

    state
        .sessions
        .resolve_session(token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::Unauthenticated("invalid session token".into()))
        .map_err(ApiError::from)
}

// ── Orders ──────────────────────────────────────────────────────────────────

pub async fn place_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<OrderDraft>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let order = state.orders.place_order(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn get_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let order = state.orders.get_order(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn list_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let orders = state.orders.list_orders_for(&actor).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

pub async fn change_order_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let order = state
        .orders
        .request_status_change(path.into_inner(), body.status, &actor, body.note)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[derive(Deserialize)]
pub struct CancellationRequest {
    pub note: Option<String>,
}

pub async fn request_cancellation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CancellationRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let order = state
        .orders
        .request_cancellation(path.into_inner(), &actor, body.into_inner().note)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[derive(Deserialize)]
pub struct ResolveCancellationRequest {
    pub accept: bool,
    pub note: Option<String>,
}

pub async fn resolve_cancellation(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ResolveCancellationRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let order = state
        .orders
        .resolve_cancellation(path.into_inner(), &actor, body.accept, body.note)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

// ── Disputes ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OpenDisputeRequest {
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub reason: DisputeReason,
    pub description: String,
    #[serde(default)]
    pub amount_requested_cents: i64,
    #[serde(default)]
    pub evidence: Vec<String>,
}

pub async fn open_dispute(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<OpenDisputeRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let dispute = state
        .disputes
        .open_dispute(
            &actor,
            DisputeDraft {
                order_id: body.order_id,
                product_id: body.product_id,
                reason: body.reason,
                description: body.description,
                amount_requested_cents: body.amount_requested_cents,
                evidence: body.evidence,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(dispute))
}

pub async fn get_dispute(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let dispute = state.disputes.get_dispute(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(dispute))
}

#[derive(Deserialize)]
pub struct ResolveDisputeRequest {
    pub resolution: DisputeResolution,
}

pub async fn resolve_dispute(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ResolveDisputeRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let dispute = state
        .disputes
        .resolve_dispute(path.into_inner(), &actor, body.into_inner().resolution)
        .await?;
    Ok(HttpResponse::Ok().json(dispute))
}

pub async fn escalate_dispute(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let (dispute, conversation) = state
        .disputes
        .escalate_dispute(path.into_inner(), &actor)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "dispute": dispute,
        "conversation": conversation,
    })))
}

// ── Conversations & messages ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub kind: ConversationKind,
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub context: serde_json::Value,
}

pub async fn create_conversation(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateConversationRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let conversation = state
        .messages
        .get_or_create_conversation(body.kind, body.participants, body.context, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(conversation))
}

pub async fn list_conversations(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let conversations = state.messages.list_conversations(&actor).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

pub async fn list_messages(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let messages = state.messages.list_messages(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

pub async fn send_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let message = state
        .messages
        .send_message(body.conversation_id, &actor, body.body, body.attachments)
        .await?;
    Ok(HttpResponse::Created().json(message))
}

pub async fn mark_message_read(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    state.messages.mark_read(path.into_inner(), &actor).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub order_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub body: String,
}

pub async fn create_review(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let actor = require_actor(&state, &req).await?;
    let body = body.into_inner();
    let review = state
        .reviews
        .create_review(&actor, body.product_id, body.order_id, body.rating, body.body)
        .await?;
    Ok(HttpResponse::Created().json(review))
}

pub async fn product_rating(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    // Aggregate ratings are public; no session required.
    let summary = state.reviews.product_rating(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
