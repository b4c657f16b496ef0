//! Observer capability set and fan-out.
//!
//! Observers are shared with the outside world (`Rc<RefCell<…>>`; the
//! engine is single-threaded). Each event is broadcast in registration
//! order over a snapshot of the set, and a failure in one observer is
//! logged and swallowed so it can neither block delivery to the others
//! nor alter engine state.

use std::cell::RefCell;
use std::rc::Rc;

use tickmatch_types::{ClientId, MarketEvent, OrderId, Price, Qty, Result, TopOfBook, Trade};

/// The capability set an order book observer implements.
///
/// Every callback returns a `Result`; errors are isolated by the engine.
/// Default implementations are no-ops so collaborators implement only
/// the events they care about.
pub trait EngineObserver {
    /// Human-readable name used in log lines.
    fn name(&self) -> &str {
        "observer"
    }

    /// Called once when the observer is registered.
    fn on_init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when the observer is unregistered or the engine shuts down.
    fn on_shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_trade_executed(&mut self, _trade: &Trade) -> Result<()> {
        Ok(())
    }

    fn on_order_acknowledged(&mut self, _order_id: OrderId) -> Result<()> {
        Ok(())
    }

    fn on_order_cancelled(&mut self, _order_id: OrderId) -> Result<()> {
        Ok(())
    }

    fn on_order_modified(
        &mut self,
        _order_id: OrderId,
        _new_quantity: Qty,
        _new_price: Price,
    ) -> Result<()> {
        Ok(())
    }

    fn on_order_rejected(&mut self, _order_id: OrderId, _reason: &str) -> Result<()> {
        Ok(())
    }

    fn on_top_of_book(&mut self, _top: &TopOfBook) -> Result<()> {
        Ok(())
    }
}

/// Shared handle to an observer.
pub type SharedObserver = Rc<RefCell<dyn EngineObserver>>;

/// The engine's observer collection, keyed by issued [`ClientId`]s.
#[derive(Default)]
pub struct ObserverSet {
    /// Registration order doubles as delivery order.
    observers: Vec<(ClientId, SharedObserver)>,
    next_client_id: u64,
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer, call its `on_init`, and issue its id.
    pub fn register(&mut self, observer: SharedObserver) -> ClientId {
        let client_id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        {
            let mut obs = observer.borrow_mut();
            if let Err(error) = obs.on_init() {
                tracing::warn!(%client_id, name = obs.name(), %error, "observer init failed");
            }
        }
        self.observers.push((client_id, observer));
        client_id
    }

    /// Unregister an observer, calling its `on_shutdown`. Returns whether
    /// the id was registered.
    pub fn unregister(&mut self, client_id: ClientId) -> bool {
        let Some(pos) = self.observers.iter().position(|(id, _)| *id == client_id) else {
            return false;
        };
        let (_, observer) = self.observers.remove(pos);
        shutdown_one(client_id, &observer);
        true
    }

    /// Deliver one event to every observer in registration order.
    ///
    /// The set is snapshotted first, so delivery tolerates registration
    /// changes made by queued commands. Failures are logged and swallowed.
    pub fn broadcast(&self, event: &MarketEvent) {
        let snapshot: Vec<(ClientId, SharedObserver)> = self
            .observers
            .iter()
            .map(|(id, obs)| (*id, Rc::clone(obs)))
            .collect();

        for (client_id, observer) in snapshot {
            let Ok(mut obs) = observer.try_borrow_mut() else {
                tracing::warn!(%client_id, kind = event.kind(), "observer busy, skipping delivery");
                continue;
            };
            if let Err(error) = deliver(&mut *obs, event) {
                tracing::warn!(
                    %client_id,
                    name = obs.name(),
                    kind = event.kind(),
                    %error,
                    "observer failed, continuing fan-out"
                );
            }
        }
    }

    /// Shut down and drop every observer. Used at engine teardown.
    pub fn shutdown_all(&mut self) {
        for (client_id, observer) in self.observers.drain(..) {
            shutdown_one(client_id, &observer);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

fn shutdown_one(client_id: ClientId, observer: &SharedObserver) {
    let Ok(mut obs) = observer.try_borrow_mut() else {
        tracing::warn!(%client_id, "observer busy at shutdown");
        return;
    };
    if let Err(error) = obs.on_shutdown() {
        tracing::warn!(%client_id, name = obs.name(), %error, "observer shutdown failed");
    }
}

fn deliver(observer: &mut dyn EngineObserver, event: &MarketEvent) -> Result<()> {
    match event {
        MarketEvent::TradeExecuted(trade) => observer.on_trade_executed(trade),
        MarketEvent::OrderAcknowledged { order_id } => observer.on_order_acknowledged(*order_id),
        MarketEvent::OrderCancelled { order_id } => observer.on_order_cancelled(*order_id),
        MarketEvent::OrderModified {
            order_id,
            new_quantity,
            new_price,
        } => observer.on_order_modified(*order_id, *new_quantity, *new_price),
        MarketEvent::OrderRejected { order_id, reason } => {
            observer.on_order_rejected(*order_id, reason)
        }
        MarketEvent::TopOfBookUpdate(top) => observer.on_top_of_book(top),
    }
}

#[cfg(test)]
mod tests {
    use tickmatch_types::EngineError;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        kinds: Vec<&'static str>,
        initialized: bool,
        shut_down: bool,
    }

    impl EngineObserver for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_init(&mut self) -> Result<()> {
            self.initialized = true;
            Ok(())
        }

        fn on_shutdown(&mut self) -> Result<()> {
            self.shut_down = true;
            Ok(())
        }

        fn on_order_acknowledged(&mut self, _order_id: OrderId) -> Result<()> {
            self.kinds.push("ACK");
            Ok(())
        }

        fn on_top_of_book(&mut self, _top: &TopOfBook) -> Result<()> {
            self.kinds.push("TOB");
            Ok(())
        }
    }

    struct Failing;

    impl EngineObserver for Failing {
        fn on_order_acknowledged(&mut self, order_id: OrderId) -> Result<()> {
            Err(EngineError::Internal(format!("boom on {order_id}")))
        }
    }

    #[test]
    fn register_calls_init_and_issues_sequential_ids() {
        let mut set = ObserverSet::new();
        let first: Rc<RefCell<Recorder>> = Rc::default();
        let second: Rc<RefCell<Recorder>> = Rc::default();

        let a = set.register(first.clone());
        let b = set.register(second.clone());
        assert!(a < b);
        assert!(first.borrow().initialized);
        assert!(second.borrow().initialized);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn broadcast_reaches_all_in_registration_order() {
        let mut set = ObserverSet::new();
        let recorder: Rc<RefCell<Recorder>> = Rc::default();
        set.register(recorder.clone());

        set.broadcast(&MarketEvent::OrderAcknowledged { order_id: OrderId(1) });
        set.broadcast(&MarketEvent::TopOfBookUpdate(TopOfBook::default()));
        assert_eq!(recorder.borrow().kinds, vec!["ACK", "TOB"]);
    }

    #[test]
    fn failing_observer_does_not_block_others() {
        let mut set = ObserverSet::new();
        set.register(Rc::new(RefCell::new(Failing)));
        let recorder: Rc<RefCell<Recorder>> = Rc::default();
        set.register(recorder.clone());

        set.broadcast(&MarketEvent::OrderAcknowledged { order_id: OrderId(1) });
        assert_eq!(recorder.borrow().kinds, vec!["ACK"]);
    }

    #[test]
    fn unregister_calls_shutdown() {
        let mut set = ObserverSet::new();
        let recorder: Rc<RefCell<Recorder>> = Rc::default();
        let id = set.register(recorder.clone());

        assert!(set.unregister(id));
        assert!(recorder.borrow().shut_down);
        assert!(set.is_empty());
        assert!(!set.unregister(id));
    }

    #[test]
    fn shutdown_all_drains_the_set() {
        let mut set = ObserverSet::new();
        let first: Rc<RefCell<Recorder>> = Rc::default();
        let second: Rc<RefCell<Recorder>> = Rc::default();
        set.register(first.clone());
        set.register(second.clone());

        set.shutdown_all();
        assert!(set.is_empty());
        assert!(first.borrow().shut_down);
        assert!(second.borrow().shut_down);
    }
}
