//! # Workflow services
//!
//! The business core: each service owns one responsibility, validates
//! identity + authorization + state through the shared guard predicates, and
//! drives exactly one repo mutation per operation.

pub mod disputes;
pub mod messaging;
pub mod orders;
pub mod reviews;

pub use disputes::DisputeDesk;
pub use messaging::MessageCenter;
pub use orders::OrderDesk;
pub use reviews::ReviewGate;
