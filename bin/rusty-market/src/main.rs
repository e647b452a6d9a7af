//! # Rusty-Market Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use rm_api::handlers::AppState;
use rm_core::traits::{ConversationRepo, DisputeRepo, OrderRepo, ReviewRepo, SessionProvider};
use rm_core::workflow::{DisputeDesk, MessageCenter, OrderDesk, ReviewGate};

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use rm_db_sqlite::SqliteMarketRepo;

#[cfg(feature = "auth-simple")]
use rm_auth_simple::SimpleSessionProvider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:rusty_market.db?mode=rwc".into());
    let session_salt = std::env::var("SESSION_SALT").unwrap_or_else(|_| "dev-only-salt".into());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteMarketRepo::new(&database_url)
            .await
            .expect("Failed to init SQLite"),
    );

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let sessions: Arc<dyn SessionProvider> = Arc::new(SimpleSessionProvider::new(&session_salt));

    // 3. Wire the workflow services over the store's ports
    let order_repo: Arc<dyn OrderRepo> = store.clone();
    let dispute_repo: Arc<dyn DisputeRepo> = store.clone();
    let conversation_repo: Arc<dyn ConversationRepo> = store.clone();
    let review_repo: Arc<dyn ReviewRepo> = store;

    let messages = Arc::new(MessageCenter::new(conversation_repo));
    let state = web::Data::new(AppState {
        orders: OrderDesk::new(order_repo.clone(), dispute_repo.clone()),
        disputes: DisputeDesk::new(dispute_repo, order_repo.clone(), messages.clone()),
        reviews: ReviewGate::new(review_repo, order_repo),
        messages,
        sessions,
    });

    log::info!("🚀 Rusty-Market starting on http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(rm_api::middleware::standard_middleware())
            .wrap(rm_api::middleware::cors_policy())
            .configure(rm_api::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
