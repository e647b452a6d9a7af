//! rusty-market/crates/rm-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and traffic control.

use actix_cors::Cors;
use actix_web::middleware::Logger;

// Returns a standard set of middleware for the Rusty-Market API.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// Important if the storefront and API ever live on different subdomains.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allow_any_header()
        .max_age(3600)
}
