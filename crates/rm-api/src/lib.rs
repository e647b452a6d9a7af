//! # rm-api
//!
//! The web routing and orchestration layer for Rusty-Market.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the marketplace workflow surface.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Orders and the status workflow
            .route("/orders", web::post().to(handlers::place_order))
            .route("/orders", web::get().to(handlers::list_orders))
            .route("/orders/{id}", web::get().to(handlers::get_order))
            .route("/orders/{id}/status", web::put().to(handlers::change_order_status))
            .route(
                "/orders/{id}/cancellation",
                web::post().to(handlers::request_cancellation),
            )
            .route(
                "/orders/{id}/cancellation",
                web::put().to(handlers::resolve_cancellation),
            )
            // Disputes
            .route("/disputes", web::post().to(handlers::open_dispute))
            .route("/disputes/{id}", web::get().to(handlers::get_dispute))
            .route("/disputes/{id}/resolution", web::put().to(handlers::resolve_dispute))
            .route("/disputes/{id}/escalation", web::post().to(handlers::escalate_dispute))
            // Conversations and messages
            .route("/conversations", web::post().to(handlers::create_conversation))
            .route("/conversations", web::get().to(handlers::list_conversations))
            .route(
                "/conversations/{id}/messages",
                web::get().to(handlers::list_messages),
            )
            .route("/messages", web::post().to(handlers::send_message))
            .route("/messages/{id}/read", web::post().to(handlers::mark_message_read))
            // Reviews
            .route("/reviews", web::post().to(handlers::create_review))
            .route("/products/{id}/rating", web::get().to(handlers::product_rating)),
    );
}
