//! Engine error taxonomy
//!
//! All failures are typed values callers can pattern-match on; none of
//! them are used for control flow inside the engine. The engine never
//! retries a failed transition on the caller's behalf.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderStatus;

/// Engine errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Bad input - never retried automatically
    #[error("validation failed: {0}")]
    Validation(String),

    /// Attempted an edge the lifecycle graph does not allow
    #[error("invalid transition: {from} -> {requested}")]
    InvalidTransition {
        from: OrderStatus,
        requested: OrderStatus,
    },

    /// Optimistic version check failed - caller should re-read and retry
    /// at most once
    #[error("concurrent modification: expected version {expected}, found {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },

    /// Offer deadline passed before the rider accepted (expected race)
    #[error("offer expired")]
    OfferExpired,

    /// The offer was already accepted, declined, expired or superseded
    /// (expected race)
    #[error("offer already resolved")]
    OfferAlreadyResolved,

    /// An order with this id already exists
    #[error("duplicate order: {0}")]
    DuplicateOrder(String),

    /// No resource with this id (payload names it, e.g. "order abc" or
    /// "rider r1")
    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// Stable machine-readable code (HTTP clients key UI text off these)
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::Validation,
            EngineError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            EngineError::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            EngineError::OfferExpired => ErrorCode::OfferExpired,
            EngineError::OfferAlreadyResolved => ErrorCode::OfferAlreadyResolved,
            EngineError::DuplicateOrder(_) => ErrorCode::DuplicateOrder,
            EngineError::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// Wire-visible error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    InvalidTransition,
    ConcurrentModification,
    OfferExpired,
    OfferAlreadyResolved,
    DuplicateOrder,
    NotFound,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_is_resource_neutral() {
        let err = EngineError::NotFound("rider r1".to_string());
        assert_eq!(err.to_string(), "not found: rider r1");
    }

    #[test]
    fn test_display_carries_diagnostics() {
        let err = EngineError::InvalidTransition {
            from: OrderStatus::Delivered,
            requested: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "invalid transition: DELIVERED -> CANCELLED");
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
    }
}
