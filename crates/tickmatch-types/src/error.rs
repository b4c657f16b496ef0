//! Error types for the TickMatch engine.
//!
//! All errors use the `TM_ERR_` prefix convention for easy grepping in
//! logs. Codes are grouped by subsystem:
//! - 1xx: order / command errors
//! - 9xx: internal errors
//!
//! Every 1xx error doubles as the reason string of an `OrderRejected`
//! event; validation failures never mutate engine state.

use thiserror::Error;

use crate::OrderId;

/// Central error enum for all TickMatch operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Cancel or modify referenced an id that is not live.
    #[error("TM_ERR_100: order not found: {0}")]
    OrderNotFound(OrderId),

    /// The command failed validation (zero quantity, missing order).
    #[error("TM_ERR_101: invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Add with an order id that is already live.
    #[error("TM_ERR_102: order id already exists: {0}")]
    DuplicateOrder(OrderId),

    /// Modify of an order that is no longer resting on the book.
    #[error("TM_ERR_103: cannot modify filled order: {0}")]
    CannotModifyFilled(OrderId),

    /// Arena/index inconsistency. Not recoverable by the caller.
    #[error("TM_ERR_900: internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Zero-quantity rejection, shared by add and modify validation.
    #[must_use]
    pub fn zero_quantity() -> Self {
        Self::InvalidOrder {
            reason: "quantity must be positive".into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EngineError>;
