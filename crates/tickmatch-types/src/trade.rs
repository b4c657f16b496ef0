//! Trade model: the immutable record of one fill.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ExecutionId, Nanos, OrderId, Price, Qty, UserId};

/// One fill between an aggressor and a resting order.
///
/// Trades always print at the **resting (maker) price**, no matter how far
/// the aggressor was willing to cross. Timestamps are copied from the
/// aggressor. The engine publishes trades and does not store them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonically issued fill identifier.
    pub execution_id: ExecutionId,
    pub aggressor_order_id: OrderId,
    pub resting_order_id: OrderId,
    pub aggressor_user_id: UserId,
    pub resting_user_id: UserId,
    /// The resting order's price.
    pub price: Price,
    pub quantity: Qty,
    pub ts_received: Nanos,
    pub ts_executed: Nanos,
}

impl Trade {
    /// Notional value in tick·lot units. Widened to avoid overflow on
    /// large books.
    #[must_use]
    pub fn notional(&self) -> u128 {
        u128::from(self.price) * u128::from(self.quantity)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade[{}] {} @ {} ({} -> {})",
            self.execution_id,
            self.quantity,
            self.price,
            self.aggressor_order_id,
            self.resting_order_id,
        )
    }
}
