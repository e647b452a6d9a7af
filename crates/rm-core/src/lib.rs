//! rusty-market/crates/rm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Market:
//! order lifecycle, dispute locking, messaging and the review gate.

pub mod error;
pub mod guards;
pub mod models;
pub mod status;
pub mod traits;
pub mod workflow;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
pub use workflow::*;
