//! Events published by the engine after each command.
//!
//! Per-command emission order is a contract observers may rely on:
//! trades first (in match order), then the lifecycle event for the
//! command's own order, then a single top-of-book update if any side of
//! the book changed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrderId, Price, Qty, Trade};

/// Price and aggregate resting volume at one side's best level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Price,
    pub volume: Qty,
}

/// Snapshot of both best levels. A side that is empty carries `None`
/// rather than a sentinel price, so price 0 stays a legal tick value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<Quote>,
    pub ask: Option<Quote>,
}

impl fmt::Display for TopOfBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bid {
            Some(q) => write!(f, "{}x{}", q.volume, q.price)?,
            None => write!(f, "-")?,
        }
        write!(f, " | ")?;
        match self.ask {
            Some(q) => write!(f, "{}x{}", q.price, q.volume),
            None => write!(f, "-"),
        }
    }
}

/// Everything the engine tells its observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    TradeExecuted(Trade),
    OrderAcknowledged { order_id: OrderId },
    OrderCancelled { order_id: OrderId },
    OrderModified {
        order_id: OrderId,
        new_quantity: Qty,
        new_price: Price,
    },
    OrderRejected { order_id: OrderId, reason: String },
    TopOfBookUpdate(TopOfBook),
}

impl MarketEvent {
    /// Short tag for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TradeExecuted(_) => "TRADE",
            Self::OrderAcknowledged { .. } => "ACK",
            Self::OrderCancelled { .. } => "CANCEL",
            Self::OrderModified { .. } => "MODIFY",
            Self::OrderRejected { .. } => "REJECT",
            Self::TopOfBookUpdate(_) => "TOB",
        }
    }
}
