//! The matching engine: a single-threaded command state machine.
//!
//! Control flow for one accepted Add: validate against the index, walk
//! the opposite side best-first filling FIFO inside each level, purge
//! fully-consumed makers, rest any residue on the order's own side, then
//! emit events in the contractual order — trades first (match order),
//! the lifecycle event for the command's own order, one top-of-book
//! update last. Rejections emit exactly one `OrderRejected` and change
//! nothing.
//!
//! Commands pushed by observers during delivery land on the engine's
//! [`CommandQueue`] and are drained after the in-flight command
//! completes, so the engine is never re-entered mid-update.

use tickmatch_book::Book;
use tickmatch_types::{
    constants, ClientId, EngineConfig, EngineError, ExecutionIdGen, MarketEvent, Nanos, Order,
    OrderId, Price, Qty, Result, Side, TopOfBook, Trade, UserId,
};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, CommandQueue};
use crate::observer::{ObserverSet, SharedObserver};

/// Price-time priority matching engine for one symbol.
pub struct MatchingEngine {
    config: EngineConfig,
    book: Book,
    observers: ObserverSet,
    clock: Box<dyn Clock>,
    exec_ids: ExecutionIdGen,
    pending: CommandQueue,
}

impl MatchingEngine {
    /// Create an engine with the wall clock and a fresh execution-id
    /// sequence.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(
            config,
            Box::new(SystemClock::default()),
            ExecutionIdGen::default(),
        )
    }

    /// Create an engine with an injected clock and execution-id
    /// generator. Generators may be shared across engines; both are
    /// write-only monotonic.
    #[must_use]
    pub fn with_parts(
        config: EngineConfig,
        clock: Box<dyn Clock>,
        exec_ids: ExecutionIdGen,
    ) -> Self {
        tracing::info!(
            symbol = %config.symbol.symbol,
            arena_capacity = config.arena_capacity,
            version = constants::VERSION,
            "engine ready"
        );
        Self {
            book: Book::with_capacity(config.arena_capacity),
            config,
            observers: ObserverSet::new(),
            clock,
            exec_ids,
            pending: CommandQueue::new(),
        }
    }

    // =================================================================
    // Command surface
    // =================================================================

    /// Add a limit order, stamping both timestamps from the engine clock.
    pub fn add_order(
        &mut self,
        order_id: OrderId,
        user_id: UserId,
        side: Side,
        quantity: Qty,
        price: Price,
    ) -> Result<()> {
        self.run(Command::Add {
            order_id,
            user_id,
            side,
            quantity,
            price,
            timestamps: None,
        })
    }

    /// Add a limit order with caller-supplied timestamps (historical
    /// replay).
    #[allow(clippy::too_many_arguments)]
    pub fn add_order_at(
        &mut self,
        order_id: OrderId,
        user_id: UserId,
        side: Side,
        quantity: Qty,
        price: Price,
        ts_received: Nanos,
        ts_executed: Nanos,
    ) -> Result<()> {
        self.run(Command::Add {
            order_id,
            user_id,
            side,
            quantity,
            price,
            timestamps: Some((ts_received, ts_executed)),
        })
    }

    /// Cancel a resting order.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<()> {
        self.run(Command::Cancel { order_id })
    }

    /// Modify a resting order: cancel-and-replace keeping the id. A pure
    /// quantity reduction at the same price keeps time priority; any
    /// other change re-queues (and may cross the book).
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        new_quantity: Qty,
        new_price: Price,
    ) -> Result<()> {
        self.run(Command::Modify {
            order_id,
            new_quantity,
            new_price,
        })
    }

    /// Run any command through the state machine.
    pub fn submit(&mut self, command: Command) -> Result<()> {
        self.run(command)
    }

    /// Handle for enqueueing commands from observer callbacks; drained
    /// after the in-flight command completes.
    #[must_use]
    pub fn command_queue(&self) -> CommandQueue {
        self.pending.clone()
    }

    // =================================================================
    // Observer surface
    // =================================================================

    /// Register an observer; calls its `on_init` and issues its id.
    pub fn register_observer(&mut self, observer: SharedObserver) -> ClientId {
        self.observers.register(observer)
    }

    /// Unregister an observer; calls its `on_shutdown`. Returns whether
    /// the id was registered.
    pub fn unregister_observer(&mut self, client_id: ClientId) -> bool {
        self.observers.unregister(client_id)
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// Sum of resting volume over every bid level.
    #[must_use]
    pub fn total_bid_volume(&self) -> Qty {
        self.book.total_bid_volume()
    }

    /// Sum of resting volume over every ask level.
    #[must_use]
    pub fn total_ask_volume(&self) -> Qty {
        self.book.total_ask_volume()
    }

    /// Spread in ticks. `None` if either side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<u64> {
        self.book.spread()
    }

    /// Mid price in ticks. `None` if either side is empty.
    #[must_use]
    pub fn mid_price(&self) -> Option<u64> {
        self.book.mid_price()
    }

    /// Both best levels with their aggregate volumes.
    #[must_use]
    pub fn top_of_book(&self) -> TopOfBook {
        self.book.top_of_book()
    }

    /// Number of live resting orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Check if an order is live.
    #[must_use]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.book.contains_order(order_id)
    }

    /// The resting book. Exposed for audits and read-only collaborators.
    #[must_use]
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =================================================================
    // State machine
    // =================================================================

    /// Apply one command, then drain commands observers queued during
    /// its event delivery.
    fn run(&mut self, command: Command) -> Result<()> {
        let result = self.apply(command);
        self.drain_pending();
        result
    }

    fn drain_pending(&mut self) {
        while let Some(command) = self.pending.pop() {
            let order_id = command.order_id();
            if let Err(error) = self.apply(command) {
                // The enqueueing observer already got an OrderRejected;
                // there is no caller left to hand the error to.
                tracing::warn!(%order_id, %error, "queued command rejected");
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Add {
                order_id,
                user_id,
                side,
                quantity,
                price,
                timestamps,
            } => self.apply_add(order_id, user_id, side, quantity, price, timestamps),
            Command::Cancel { order_id } => self.apply_cancel(order_id),
            Command::Modify {
                order_id,
                new_quantity,
                new_price,
            } => self.apply_modify(order_id, new_quantity, new_price),
        }
    }

    fn apply_add(
        &mut self,
        order_id: OrderId,
        user_id: UserId,
        side: Side,
        quantity: Qty,
        price: Price,
        timestamps: Option<(Nanos, Nanos)>,
    ) -> Result<()> {
        if quantity == 0 {
            return Err(self.reject(order_id, EngineError::zero_quantity()));
        }
        if self.book.contains_order(order_id) {
            return Err(self.reject(order_id, EngineError::DuplicateOrder(order_id)));
        }

        let (ts_received, ts_executed) = match timestamps {
            Some(ts) => ts,
            None => {
                let now = self.clock.now();
                (now, now)
            }
        };
        let incoming = Order::new(order_id, user_id, side, quantity, price, ts_received, ts_executed);

        let (trades, rested) = self.match_and_rest(incoming)?;
        tracing::debug!(%order_id, %side, quantity, price, trades = trades.len(), rested, "add processed");

        let mut events: Vec<MarketEvent> =
            trades.into_iter().map(MarketEvent::TradeExecuted).collect();
        if rested {
            events.push(MarketEvent::OrderAcknowledged { order_id });
        }
        // An accepted add always moves a side: it traded, rested, or both.
        events.push(MarketEvent::TopOfBookUpdate(self.book.top_of_book()));
        self.emit_all(&events);
        Ok(())
    }

    fn apply_cancel(&mut self, order_id: OrderId) -> Result<()> {
        if !self.book.contains_order(order_id) {
            return Err(self.reject(order_id, EngineError::OrderNotFound(order_id)));
        }
        self.book.remove_resting(order_id)?;
        tracing::debug!(%order_id, "cancel processed");
        self.emit_all(&[
            MarketEvent::OrderCancelled { order_id },
            MarketEvent::TopOfBookUpdate(self.book.top_of_book()),
        ]);
        Ok(())
    }

    fn apply_modify(
        &mut self,
        order_id: OrderId,
        new_quantity: Qty,
        new_price: Price,
    ) -> Result<()> {
        if new_quantity == 0 {
            return Err(self.reject(order_id, EngineError::zero_quantity()));
        }
        let Some(resting) = self.book.is_resting(order_id) else {
            return Err(self.reject(order_id, EngineError::OrderNotFound(order_id)));
        };
        if !resting {
            return Err(self.reject(order_id, EngineError::CannotModifyFilled(order_id)));
        }

        let existing = match self.book.order(order_id) {
            Some(order) => order.clone(),
            None => {
                return Err(EngineError::Internal(format!(
                    "resting order {order_id} vanished during modify"
                )))
            }
        };

        // A pure reduction at the same price keeps queue position and
        // both timestamps; everything else is cancel-and-replace with a
        // refreshed execution timestamp.
        if new_price == existing.price && new_quantity <= existing.remaining_qty {
            self.book.reduce_resting(order_id, new_quantity)?;
            tracing::debug!(%order_id, new_quantity, "modify reduced in place");
            self.emit_all(&[
                MarketEvent::OrderModified {
                    order_id,
                    new_quantity,
                    new_price,
                },
                MarketEvent::TopOfBookUpdate(self.book.top_of_book()),
            ]);
            return Ok(());
        }

        let removed = self.book.remove_resting(order_id)?;
        let ts_executed = self.clock.now();
        let replacement = Order::new(
            order_id,
            removed.user_id,
            removed.side,
            new_quantity,
            new_price,
            removed.ts_received,
            ts_executed,
        );

        let (trades, rested) = self.match_and_rest(replacement)?;
        tracing::debug!(%order_id, new_quantity, new_price, trades = trades.len(), rested, "modify replaced");

        let mut events: Vec<MarketEvent> =
            trades.into_iter().map(MarketEvent::TradeExecuted).collect();
        if rested {
            // The replacement acknowledges as a modification.
            events.push(MarketEvent::OrderModified {
                order_id,
                new_quantity,
                new_price,
            });
        }
        events.push(MarketEvent::TopOfBookUpdate(self.book.top_of_book()));
        self.emit_all(&events);
        Ok(())
    }

    /// Shared tail of add and modify: cross the incoming order against
    /// the opposite side and rest any residue on its own side.
    fn match_and_rest(&mut self, mut incoming: Order) -> Result<(Vec<Trade>, bool)> {
        let trades = self.book.match_incoming(&mut incoming, &self.exec_ids);
        let rested = incoming.remaining_qty > 0;
        if rested {
            self.book.insert_resting(incoming)?;
        }
        Ok((trades, rested))
    }

    /// Emit a rejection event and hand the error back to the caller.
    fn reject(&mut self, order_id: OrderId, error: EngineError) -> EngineError {
        tracing::debug!(%order_id, %error, "command rejected");
        self.observers.broadcast(&MarketEvent::OrderRejected {
            order_id,
            reason: error.to_string(),
        });
        error
    }

    fn emit_all(&self, events: &[MarketEvent]) {
        for event in events {
            self.observers.broadcast(event);
        }
    }
}

impl Drop for MatchingEngine {
    /// Teardown shuts every observer down; the arena frees all resting
    /// orders with the book.
    fn drop(&mut self) {
        self.observers.shutdown_all();
    }
}
