//! A single price level in the order book.
//!
//! Orders at the same price queue in FIFO order (time priority) as an
//! intrusive doubly-linked list of arena handles: the front of the list
//! has the highest time priority and fills first, and any order can be
//! unlinked in O(1) given its handle. `total_volume` is a denormalized
//! sum of the queued orders' remaining quantities and is kept exactly
//! consistent with the queue.

use tickmatch_types::{EngineError, ExecutionIdGen, Order, Price, Qty, Result, Trade};

use crate::arena::{OrderArena, OrderHandle};

/// A single price level containing all resting orders at that price.
#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    total_volume: Qty,
    head: Option<OrderHandle>,
    tail: Option<OrderHandle>,
    len: usize,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[must_use]
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_volume: 0,
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// The price at this level.
    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Sum of remaining quantities across the queue.
    #[must_use]
    pub fn total_volume(&self) -> Qty {
        self.total_volume
    }

    /// Number of orders queued at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the front (oldest, highest-priority) order.
    #[must_use]
    pub fn front(&self) -> Option<OrderHandle> {
        self.head
    }

    /// Append an order to the tail of the queue (lowest time priority).
    ///
    /// The first order queued adopts its price as the level price.
    ///
    /// # Errors
    /// `InvalidOrder` if `handle` does not resolve to a live order.
    pub fn push_back(&mut self, arena: &mut OrderArena, handle: OrderHandle) -> Result<()> {
        let (qty, price) = match arena.get(handle) {
            Some(node) => (node.order.remaining_qty, node.order.price),
            None => {
                return Err(EngineError::InvalidOrder {
                    reason: "no order at handle".into(),
                })
            }
        };
        if self.len == 0 {
            self.price = price;
        }
        debug_assert_eq!(self.price, price, "order queued at foreign price level");

        let old_tail = self.tail;
        if let Some(node) = arena.get_mut(handle) {
            node.prev = old_tail;
            node.next = None;
            node.level = Some(self.price);
        }
        match old_tail {
            Some(tail) => {
                if let Some(node) = arena.get_mut(tail) {
                    node.next = Some(handle);
                }
            }
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
        self.total_volume += qty;
        Ok(())
    }

    /// Unlink a specific order from the queue in O(1).
    ///
    /// # Errors
    /// `OrderNotFound` if the order is not queued at this level.
    pub fn remove(&mut self, arena: &mut OrderArena, handle: OrderHandle) -> Result<()> {
        let (order_id, qty, prev, next, member) = match arena.get(handle) {
            Some(node) => (
                node.order.order_id,
                node.order.remaining_qty,
                node.prev,
                node.next,
                node.level,
            ),
            None => {
                return Err(EngineError::InvalidOrder {
                    reason: "no order at handle".into(),
                })
            }
        };
        if member != Some(self.price) {
            return Err(EngineError::OrderNotFound(order_id));
        }

        match prev {
            Some(p) => {
                if let Some(node) = arena.get_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = arena.get_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = arena.get_mut(handle) {
            node.prev = None;
            node.next = None;
            node.level = None;
        }
        self.len -= 1;
        self.total_volume -= qty;
        Ok(())
    }

    /// Shrink a queued order to `new_quantity` in place, keeping its
    /// queue position. A reduction never changes time priority.
    ///
    /// # Errors
    /// `OrderNotFound` if the order is not queued at this level;
    /// `InvalidOrder` if `new_quantity` is zero or grows the order.
    pub fn reduce_order(
        &mut self,
        arena: &mut OrderArena,
        handle: OrderHandle,
        new_quantity: Qty,
    ) -> Result<()> {
        let node = match arena.get_mut(handle) {
            Some(node) => node,
            None => {
                return Err(EngineError::InvalidOrder {
                    reason: "no order at handle".into(),
                })
            }
        };
        if node.level != Some(self.price) {
            return Err(EngineError::OrderNotFound(node.order.order_id));
        }
        if new_quantity == 0 || new_quantity > node.order.remaining_qty {
            return Err(EngineError::InvalidOrder {
                reason: "reduction must keep a positive remaining quantity".into(),
            });
        }
        let delta = node.order.remaining_qty - new_quantity;
        node.order.quantity = new_quantity;
        node.order.remaining_qty = new_quantity;
        self.total_volume -= delta;
        Ok(())
    }

    /// Consume up to `quantity` of resting volume from the front of the
    /// queue, producing one trade per maker touched, priced at this level.
    ///
    /// Makers that reach zero remaining quantity are popped and unlinked;
    /// freeing their arena slot and index entry is the caller's job.
    pub fn fill_against(
        &mut self,
        arena: &mut OrderArena,
        aggressor: &Order,
        quantity: Qty,
        exec_ids: &ExecutionIdGen,
    ) -> Vec<Trade> {
        let mut trades = Vec::new();
        let mut wanted = quantity;
        while wanted > 0 {
            let Some(head) = self.head else { break };
            let Some(node) = arena.get_mut(head) else { break };

            let fill = wanted.min(node.order.remaining_qty);
            trades.push(Trade {
                execution_id: exec_ids.next_id(),
                aggressor_order_id: aggressor.order_id,
                resting_order_id: node.order.order_id,
                aggressor_user_id: aggressor.user_id,
                resting_user_id: node.order.user_id,
                price: self.price,
                quantity: fill,
                ts_received: aggressor.ts_received,
                ts_executed: aggressor.ts_executed,
            });
            node.order.remaining_qty -= fill;
            self.total_volume -= fill;
            wanted -= fill;

            if node.order.remaining_qty == 0 {
                self.pop_front(arena);
            }
        }
        trades
    }

    /// Detach the front order, clearing its linkage and level marker.
    fn pop_front(&mut self, arena: &mut OrderArena) -> Option<OrderHandle> {
        let head = self.head?;
        let next = arena.get(head).and_then(|node| node.next);
        if let Some(node) = arena.get_mut(head) {
            node.prev = None;
            node.next = None;
            node.level = None;
        }
        self.head = next;
        match next {
            Some(n) => {
                if let Some(node) = arena.get_mut(n) {
                    node.prev = None;
                }
            }
            None => self.tail = None,
        }
        self.len -= 1;
        Some(head)
    }

    /// Queue handles front-to-back. Used by the consistency audit.
    pub fn iter_fifo<'a>(&self, arena: &'a OrderArena) -> impl Iterator<Item = OrderHandle> + 'a {
        LevelIter {
            arena,
            cur: self.head,
        }
    }
}

struct LevelIter<'a> {
    arena: &'a OrderArena,
    cur: Option<OrderHandle>,
}

impl Iterator for LevelIter<'_> {
    type Item = OrderHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cur?;
        self.cur = self.arena.get(handle).and_then(|node| node.next);
        Some(handle)
    }
}
