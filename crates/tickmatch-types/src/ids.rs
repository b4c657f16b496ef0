//! Identifiers and id generators used throughout TickMatch.
//!
//! All ids are opaque 64-bit values. Order and user ids are assigned by
//! the caller (a feed adapter or client); execution ids are issued by the
//! engine through an [`ExecutionIdGen`]. The generators are cloneable
//! handles over a shared atomic counter so several engines may draw from
//! one sequence — safe because the counters are write-only monotonic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Price in unsigned integer ticks. The tick value lives in
/// [`SymbolConfig`](crate::SymbolConfig), not in the engine.
pub type Price = u64;

/// Quantity in unsigned integer lots.
pub type Qty = u64;

/// Timestamp in nanoseconds since the UNIX epoch.
pub type Nanos = u64;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Unique order identifier, assigned by the submitting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Opaque identifier for the user that owns an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExecutionId
// ---------------------------------------------------------------------------

/// Identifier of one fill. Strictly monotonic within a generator's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExecutionId(pub u64);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// Identifier of a registered observer, issued by the engine at
/// registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Monotonic execution-id source. Cloning shares the underlying counter.
#[derive(Debug, Clone)]
pub struct ExecutionIdGen(Arc<AtomicU64>);

impl ExecutionIdGen {
    /// Create a generator starting at `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self(Arc::new(AtomicU64::new(first)))
    }

    /// Issue the next execution id.
    pub fn next_id(&self) -> ExecutionId {
        ExecutionId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ExecutionIdGen {
    fn default() -> Self {
        Self::starting_at(crate::constants::FIRST_EXECUTION_ID)
    }
}

/// Monotonic order-id source for collaborators that submit orders.
#[derive(Debug, Clone)]
pub struct OrderIdGen(Arc<AtomicU64>);

impl OrderIdGen {
    /// Create a generator starting at `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self(Arc::new(AtomicU64::new(first)))
    }

    /// Issue the next order id.
    pub fn next_id(&self) -> OrderId {
        OrderId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OrderIdGen {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
