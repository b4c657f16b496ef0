//! The two-sided order book for a single symbol.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids** (buys): `BTreeMap<Reverse<Price>, PriceLevel>` -- highest price first
//! - **Asks** (sells): `BTreeMap<Price, PriceLevel>` -- lowest price first
//!
//! An auxiliary `HashMap<OrderId, OrderHandle>` gives O(1) cancellation
//! and modification. The arena owns every resting order; the index and
//! the level queues hold handles only, and all three stay consistent
//! under every mutation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use tickmatch_types::{
    EngineError, ExecutionIdGen, Order, OrderId, Price, Qty, Quote, Result, Side, TopOfBook, Trade,
};

use crate::arena::{OrderArena, OrderHandle};
use crate::price_level::PriceLevel;

/// The resting state of one symbol's market.
#[derive(Debug, Default)]
pub struct Book {
    arena: OrderArena,
    /// Fast lookup: `OrderId -> handle` for O(1) cancel and modify.
    index: HashMap<OrderId, OrderHandle>,
    /// Buy side: highest price first (`Reverse` key).
    bids: BTreeMap<Reverse<Price>, PriceLevel>,
    /// Sell side: lowest price first.
    asks: BTreeMap<Price, PriceLevel>,
}

impl Book {
    /// Create a new empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty book with `capacity` arena slots pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: OrderArena::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    // =================================================================
    // Matching
    // =================================================================

    /// Cross `incoming` against the opposite side, best level first,
    /// FIFO inside each level. Decrements `incoming.remaining_qty`,
    /// purges fully-consumed makers from the index and arena, and drops
    /// levels whose volume reaches zero. Trades print at maker prices.
    pub fn match_incoming(&mut self, incoming: &mut Order, exec_ids: &ExecutionIdGen) -> Vec<Trade> {
        let Self {
            arena,
            index,
            bids,
            asks,
        } = self;
        match incoming.side {
            Side::Buy => walk_side(asks, arena, index, incoming, exec_ids),
            Side::Sell => walk_side(bids, arena, index, incoming, exec_ids),
        }
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Rest `order` on its own side at its price, at the tail of the
    /// level queue, and index it.
    ///
    /// # Errors
    /// `DuplicateOrder` if the id is already live.
    pub fn insert_resting(&mut self, order: Order) -> Result<()> {
        if self.index.contains_key(&order.order_id) {
            return Err(EngineError::DuplicateOrder(order.order_id));
        }
        debug_assert!(order.remaining_qty > 0, "resting a fully filled order");

        let order_id = order.order_id;
        let side = order.side;
        let price = order.price;
        let handle = self.arena.insert(order);
        self.index.insert(order_id, handle);

        let level = match side {
            Side::Buy => self
                .bids
                .entry(Reverse(price))
                .or_insert_with(|| PriceLevel::new(price)),
            Side::Sell => self
                .asks
                .entry(price)
                .or_insert_with(|| PriceLevel::new(price)),
        };
        level.push_back(&mut self.arena, handle)
    }

    /// Shrink a resting order to `new_quantity` in place. The order keeps
    /// its queue position; a pure reduction never cedes time priority.
    ///
    /// # Errors
    /// `OrderNotFound` if the id is not live or not queued;
    /// `InvalidOrder` if the new quantity is zero or grows the order.
    pub fn reduce_resting(&mut self, order_id: OrderId, new_quantity: Qty) -> Result<()> {
        let handle = *self
            .index
            .get(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        let (side, price, member) = match self.arena.get(handle) {
            Some(node) => (node.order.side, node.order.price, node.level),
            None => {
                return Err(EngineError::Internal(format!(
                    "index entry {order_id} points at a freed arena slot"
                )))
            }
        };
        if member.is_none() {
            return Err(EngineError::OrderNotFound(order_id));
        }
        let missing_level =
            || EngineError::Internal(format!("no level at {price} for resting order {order_id}"));
        match side {
            Side::Buy => {
                let level = self.bids.get_mut(&Reverse(price)).ok_or_else(missing_level)?;
                level.reduce_order(&mut self.arena, handle, new_quantity)
            }
            Side::Sell => {
                let level = self.asks.get_mut(&price).ok_or_else(missing_level)?;
                level.reduce_order(&mut self.arena, handle, new_quantity)
            }
        }
    }

    // =================================================================
    // Removal
    // =================================================================

    /// Remove a resting order by id, unlinking it from its level in O(1)
    /// and dropping the level if it empties. Returns the removed order.
    ///
    /// # Errors
    /// `OrderNotFound` if the id is not live.
    pub fn remove_resting(&mut self, order_id: OrderId) -> Result<Order> {
        let handle = self
            .index
            .remove(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;

        let (side, price, member) = match self.arena.get(handle) {
            Some(node) => (node.order.side, node.order.price, node.level),
            None => {
                return Err(EngineError::Internal(format!(
                    "index entry {order_id} points at a freed arena slot"
                )))
            }
        };

        if member.is_some() {
            let missing_level =
                || EngineError::Internal(format!("no level at {price} for resting order {order_id}"));
            match side {
                Side::Buy => {
                    let level = self.bids.get_mut(&Reverse(price)).ok_or_else(missing_level)?;
                    level.remove(&mut self.arena, handle)?;
                    if level.total_volume() == 0 {
                        self.bids.remove(&Reverse(price));
                    }
                }
                Side::Sell => {
                    let level = self.asks.get_mut(&price).ok_or_else(missing_level)?;
                    level.remove(&mut self.arena, handle)?;
                    if level.total_volume() == 0 {
                        self.asks.remove(&price);
                    }
                }
            }
        } else {
            // Unreachable while the book invariants hold: every indexed
            // order is queued at exactly one level. Tolerated so a breach
            // cannot wedge cancellation.
            tracing::warn!(%order_id, "removing an indexed order with no level membership");
        }

        self.arena
            .remove(handle)
            .ok_or_else(|| EngineError::Internal(format!("arena slot for {order_id} vanished")))
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Price and aggregate volume at the best bid level.
    #[must_use]
    pub fn best_bid_quote(&self) -> Option<Quote> {
        self.bids.iter().next().map(|(key, level)| Quote {
            price: key.0,
            volume: level.total_volume(),
        })
    }

    /// Price and aggregate volume at the best ask level.
    #[must_use]
    pub fn best_ask_quote(&self) -> Option<Quote> {
        self.asks.iter().next().map(|(&price, level)| Quote {
            price,
            volume: level.total_volume(),
        })
    }

    /// Both best levels.
    #[must_use]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.best_bid_quote(),
            ask: self.best_ask_quote(),
        }
    }

    /// Sum of resting volume over every bid level.
    #[must_use]
    pub fn total_bid_volume(&self) -> Qty {
        self.bids.values().map(PriceLevel::total_volume).sum()
    }

    /// Sum of resting volume over every ask level.
    #[must_use]
    pub fn total_ask_volume(&self) -> Qty {
        self.asks.values().map(PriceLevel::total_volume).sum()
    }

    /// Spread in ticks. `None` if either side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Mid price in ticks, rounded down. `None` if either side is empty.
    #[must_use]
    pub fn mid_price(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(bid + (ask - bid) / 2),
            _ => None,
        }
    }

    /// Total number of resting orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Number of distinct bid price levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of distinct ask price levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Returns `true` if the book has no orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if an order is live.
    #[must_use]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// The resting order for `order_id`, if live.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let handle = self.index.get(&order_id)?;
        self.arena.get(*handle).map(|node| &node.order)
    }

    /// Whether the live order is still queued at a level. `None` if the
    /// id is unknown.
    #[must_use]
    pub fn is_resting(&self, order_id: OrderId) -> Option<bool> {
        let handle = self.index.get(&order_id)?;
        self.arena.get(*handle).map(|node| node.level.is_some())
    }

    // =================================================================
    // Consistency audit
    // =================================================================

    /// Walk every index entry, level, and queue link, verifying the
    /// structural invariants. Intended for tests and debug assertions;
    /// O(orders).
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let queued_bids = audit_side(Side::Buy, &self.bids, &self.arena, &self.index)?;
        let queued_asks = audit_side(Side::Sell, &self.asks, &self.arena, &self.index)?;
        let queued = queued_bids + queued_asks;
        if queued != self.index.len() {
            return Err(format!(
                "{} orders queued across levels, {} indexed",
                queued,
                self.index.len()
            ));
        }
        if self.index.len() != self.arena.len() {
            return Err(format!(
                "{} orders indexed, {} in the arena",
                self.index.len(),
                self.arena.len()
            ));
        }
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(format!("book is crossed: best bid {bid} >= best ask {ask}"));
            }
        }
        Ok(())
    }
}

/// Audit one side's levels, returning the number of orders queued there.
fn audit_side<K: Ord>(
    side: Side,
    levels: &BTreeMap<K, PriceLevel>,
    arena: &OrderArena,
    index: &HashMap<OrderId, OrderHandle>,
) -> std::result::Result<usize, String> {
    let mut queued = 0usize;
    for level in levels.values() {
        if level.is_empty() {
            return Err(format!("{side} level {} has an empty queue", level.price()));
        }
        let mut volume: Qty = 0;
        let mut count = 0usize;
        for handle in level.iter_fifo(arena) {
            let Some(node) = arena.get(handle) else {
                return Err(format!("{side} level {} queues a freed slot", level.price()));
            };
            let order = &node.order;
            if node.level != Some(level.price()) {
                return Err(format!(
                    "{} has level marker {:?}, queued at {}",
                    order.order_id,
                    node.level,
                    level.price()
                ));
            }
            if order.side != side {
                return Err(format!("{} is a {} on the {side} side", order.order_id, order.side));
            }
            if order.price != level.price() {
                return Err(format!(
                    "{} priced {} rests at level {}",
                    order.order_id,
                    order.price,
                    level.price()
                ));
            }
            if order.remaining_qty == 0 {
                return Err(format!("{} rests with zero quantity", order.order_id));
            }
            if index.get(&order.order_id) != Some(&handle) {
                return Err(format!("{} queued but not indexed at its handle", order.order_id));
            }
            volume += order.remaining_qty;
            count += 1;
        }
        if volume != level.total_volume() {
            return Err(format!(
                "{side} level {} volume {} != queue sum {}",
                level.price(),
                level.total_volume(),
                volume
            ));
        }
        if count != level.len() {
            return Err(format!(
                "{side} level {} len {} != queue count {}",
                level.price(),
                level.len(),
                count
            ));
        }
        queued += count;
    }
    Ok(queued)
}

/// Walk one side from best outward, filling every level that crosses
/// with `incoming` until the aggressor is exhausted or prices stop
/// crossing. Both side maps iterate best-first, so the walk is shared.
fn walk_side<K: Ord + Copy>(
    levels: &mut BTreeMap<K, PriceLevel>,
    arena: &mut OrderArena,
    index: &mut HashMap<OrderId, OrderHandle>,
    incoming: &mut Order,
    exec_ids: &ExecutionIdGen,
) -> Vec<Trade> {
    let mut trades = Vec::new();
    while incoming.remaining_qty > 0 {
        let Some((&key, best)) = levels.iter().next() else {
            break;
        };
        if !incoming.crosses(best.price()) {
            break;
        }

        let Some(level) = levels.get_mut(&key) else {
            break;
        };
        let take = incoming.remaining_qty.min(level.total_volume());
        let level_trades = level.fill_against(arena, incoming, take, exec_ids);
        let level_drained = level.total_volume() == 0;

        for trade in &level_trades {
            incoming.remaining_qty -= trade.quantity;
            // A maker consumed to zero leaves the index and the arena.
            if let Some(&handle) = index.get(&trade.resting_order_id) {
                let filled = arena
                    .get(handle)
                    .is_some_and(|node| node.order.remaining_qty == 0);
                if filled {
                    index.remove(&trade.resting_order_id);
                    arena.remove(handle);
                }
            }
        }
        trades.extend(level_trades);

        if level_drained {
            levels.remove(&key);
        }
    }
    trades
}
