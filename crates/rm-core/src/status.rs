//! # Order status transition table
//!
//! The workflow graph is data, not call-site code: adding a status means
//! extending `TRANSITIONS`, not touching every handler.

use crate::models::OrderStatus;

use OrderStatus::*;

/// Every legal (from, to) edge of the order workflow.
///
/// The happy path is linear (`Pending → Confirmed → Shipped → Delivered`);
/// `Cancelled` is reachable from any non-terminal state and
/// `CancellationRequested` is a side-state that parks the order until the
/// request is accepted or rejected.
pub const TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (Pending, Confirmed),
    (Confirmed, Shipped),
    (Shipped, Delivered),
    (Pending, Cancelled),
    (Confirmed, Cancelled),
    (Shipped, Cancelled),
    (Pending, CancellationRequested),
    (Confirmed, CancellationRequested),
    (CancellationRequested, Cancelled),
    // Rejecting a cancellation restores the pre-request status; those edges
    // are here so the restore path goes through the same table.
    (CancellationRequested, Pending),
    (CancellationRequested, Confirmed),
];

/// Whether `from → to` is a legal edge of the workflow graph.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    TRANSITIONS.contains(&(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_linear() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Confirmed, Shipped));
        assert!(can_transition(Shipped, Delivered));
    }

    #[test]
    fn no_skipping_ahead() {
        assert!(!can_transition(Pending, Shipped));
        assert!(!can_transition(Pending, Delivered));
        assert!(!can_transition(Confirmed, Delivered));
    }

    #[test]
    fn no_moving_backwards() {
        assert!(!can_transition(Shipped, Confirmed));
        assert!(!can_transition(Delivered, Shipped));
    }

    #[test]
    fn cancel_reachable_from_non_terminal_states() {
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Cancelled));
        assert!(can_transition(Shipped, Cancelled));
        assert!(!can_transition(Delivered, Cancelled));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for &(from, _) in TRANSITIONS {
            assert!(!from.is_terminal(), "{from} must not have outgoing edges");
        }
    }

    #[test]
    fn cancellation_request_blocks_shipping() {
        // Resolving the request is the only way out of the side-state.
        assert!(!can_transition(CancellationRequested, Shipped));
        assert!(can_transition(CancellationRequested, Cancelled));
        assert!(can_transition(CancellationRequested, Confirmed));
    }
}
