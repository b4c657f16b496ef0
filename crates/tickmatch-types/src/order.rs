//! Order model for the TickMatch engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Nanos, OrderId, Price, Qty, UserId};

/// Which side of the book an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an aggressor on this side matches against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A resting limit order.
///
/// Identity fields are set at creation; only `remaining_qty` changes while
/// the order is live (decremented by fills). The queue position inside a
/// price level is tracked by the book, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub side: Side,
    pub price: Price,
    /// Quantity at submission.
    pub quantity: Qty,
    /// Quantity still unfilled. Strictly positive while resting.
    pub remaining_qty: Qty,
    /// When the order was received, nanoseconds since the UNIX epoch.
    pub ts_received: Nanos,
    /// When the order became executable (equals `ts_received` unless a
    /// replay adapter supplies historical values).
    pub ts_executed: Nanos,
}

impl Order {
    /// Build a fresh order; `remaining_qty` starts at `quantity`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        side: Side,
        quantity: Qty,
        price: Price,
        ts_received: Nanos,
        ts_executed: Nanos,
    ) -> Self {
        Self {
            order_id,
            user_id,
            side,
            price,
            quantity,
            remaining_qty: quantity,
            ts_received,
            ts_executed,
        }
    }

    /// Whether this order, as an aggressor, crosses a resting level at
    /// `level_price` on the opposite side.
    #[must_use]
    pub fn crosses(&self, level_price: Price) -> bool {
        match self.side {
            Side::Buy => self.price >= level_price,
            Side::Sell => self.price <= level_price,
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }

    #[must_use]
    pub fn filled_qty(&self) -> Qty {
        self.quantity - self.remaining_qty
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// An order with fixed user and zero timestamps, for book-level tests.
    #[must_use]
    pub fn sample(order_id: u64, side: Side, quantity: Qty, price: Price) -> Self {
        Self::new(OrderId(order_id), UserId(1), side, quantity, price, 0, 0)
    }
}
