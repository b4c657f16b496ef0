//! Commands and the queued-tail re-entrancy discipline.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tickmatch_types::{Nanos, OrderId, Price, Qty, Side, UserId};

/// One mutation of the engine state machine. Commands apply atomically:
/// they either succeed fully or are rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Add {
        order_id: OrderId,
        user_id: UserId,
        side: Side,
        quantity: Qty,
        price: Price,
        /// Caller-supplied `(ts_received, ts_executed)`, e.g. from a
        /// historical replay. The engine stamps both when absent.
        timestamps: Option<(Nanos, Nanos)>,
    },
    Cancel {
        order_id: OrderId,
    },
    Modify {
        order_id: OrderId,
        new_quantity: Qty,
        new_price: Price,
    },
}

impl Command {
    /// The order this command concerns.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Add { order_id, .. }
            | Self::Cancel { order_id }
            | Self::Modify { order_id, .. } => *order_id,
        }
    }
}

/// Cloneable FIFO of deferred commands.
///
/// Observers hold one of these instead of calling back into the engine:
/// commands pushed during event delivery run after the in-flight command
/// has fully completed, so the engine is never re-entered mid-update and
/// the book invariants hold at every observable boundary.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue(Rc<RefCell<VecDeque<Command>>>);

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a command for execution after the in-flight one.
    pub fn push(&self, command: Command) {
        self.0.borrow_mut().push_back(command);
    }

    pub(crate) fn pop(&self) -> Option<Command> {
        self.0.borrow_mut().pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
