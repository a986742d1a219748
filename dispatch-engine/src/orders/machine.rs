//! Order State Machine
//!
//! The single place the lifecycle graph lives. Pure function of
//! `(current status, actor, action)`; every caller applies the result
//! under the order's lock.
//!
//! ```text
//! Placed -(restaurant)-> Accepted -(restaurant)-> Preparing
//!   -(restaurant)-> ReadyForPickup -(dispatcher)-> RiderAssigned
//!   -(rider)-> PickedUp -(rider)-> OnTheWay -(rider)-> Delivered
//!
//! Placed | Accepted | Preparing | ReadyForPickup
//!   -(restaurant or customer)-> Cancelled
//! ```
//!
//! The graph caps cancellation at `ReadyForPickup`; how far a deployment
//! actually lets callers cancel is the engine's `cancellable_statuses`
//! policy, which defaults to stopping at `Preparing`. Once a rider is
//! assigned cancellation needs a compensating flow because the rider may
//! already be en route; there is no direct edge.

use shared::order::{Actor, OrderStatus, TransitionAction};
use shared::{EngineError, EngineResult};

/// Compute the next status, or reject with `InvalidTransition`.
///
/// Rejection carries the current and requested states for diagnostics and
/// never mutates anything.
pub fn next_status(
    current: OrderStatus,
    actor: Actor,
    action: TransitionAction,
) -> EngineResult<OrderStatus> {
    use OrderStatus::*;
    use TransitionAction::*;

    let next = match (current, actor, action) {
        (Placed, Actor::Restaurant, Accept) => Accepted,
        (Accepted, Actor::Restaurant, MarkPreparing) => Preparing,
        (Preparing, Actor::Restaurant, MarkReady) => ReadyForPickup,
        (ReadyForPickup, Actor::Dispatcher, AssignRider) => RiderAssigned,
        (RiderAssigned, Actor::Rider, PickUp) => PickedUp,
        (PickedUp, Actor::Rider, StartDelivery) => OnTheWay,
        (OnTheWay, Actor::Rider, Deliver) => Delivered,

        (
            Placed | Accepted | Preparing | ReadyForPickup,
            Actor::Restaurant | Actor::Customer,
            Cancel,
        ) => Cancelled,

        _ => {
            return Err(EngineError::InvalidTransition {
                from: current,
                requested: action.target(),
            });
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Actor::*;
    use OrderStatus::*;
    use TransitionAction::*;

    #[test]
    fn test_happy_path_edges() {
        assert_eq!(next_status(Placed, Restaurant, Accept).unwrap(), Accepted);
        assert_eq!(
            next_status(Accepted, Restaurant, MarkPreparing).unwrap(),
            Preparing
        );
        assert_eq!(
            next_status(Preparing, Restaurant, MarkReady).unwrap(),
            ReadyForPickup
        );
        assert_eq!(
            next_status(ReadyForPickup, Dispatcher, AssignRider).unwrap(),
            RiderAssigned
        );
        assert_eq!(next_status(RiderAssigned, Rider, PickUp).unwrap(), PickedUp);
        assert_eq!(
            next_status(PickedUp, Rider, StartDelivery).unwrap(),
            OnTheWay
        );
        assert_eq!(next_status(OnTheWay, Rider, Deliver).unwrap(), Delivered);
    }

    #[test]
    fn test_cancellation_edges() {
        for from in [Placed, Accepted, Preparing, ReadyForPickup] {
            for actor in [Restaurant, Customer] {
                assert_eq!(next_status(from, actor, Cancel).unwrap(), Cancelled);
            }
        }
    }

    #[test]
    fn test_no_cancel_once_rider_assigned() {
        for from in [RiderAssigned, PickedUp, OnTheWay] {
            let err = next_status(from, Customer, Cancel).unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidTransition {
                    from,
                    requested: Cancelled
                }
            );
        }
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for from in [Delivered, Cancelled] {
            for actor in [Customer, Restaurant, Rider, Dispatcher] {
                for action in [
                    Accept,
                    MarkPreparing,
                    MarkReady,
                    AssignRider,
                    PickUp,
                    StartDelivery,
                    Deliver,
                    Cancel,
                ] {
                    assert!(next_status(from, actor, action).is_err());
                }
            }
        }
    }

    #[test]
    fn test_wrong_actor_is_rejected() {
        // Right edge, wrong actor
        assert!(next_status(Placed, Customer, Accept).is_err());
        assert!(next_status(Placed, Rider, Accept).is_err());
        assert!(next_status(ReadyForPickup, Rider, AssignRider).is_err());
        assert!(next_status(RiderAssigned, Restaurant, PickUp).is_err());
        assert!(next_status(Placed, Rider, Cancel).is_err());
    }

    #[test]
    fn test_no_skipping_rider_assignment() {
        // Cannot reach PickedUp without a rider having accepted first
        assert!(next_status(ReadyForPickup, Rider, PickUp).is_err());
        assert!(next_status(Preparing, Rider, PickUp).is_err());
    }

    #[test]
    fn test_rejection_carries_diagnostics() {
        let err = next_status(Delivered, Restaurant, Accept).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                from: Delivered,
                requested: Accepted
            }
        );
    }
}
