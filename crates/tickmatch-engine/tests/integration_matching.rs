//! Integration tests: matching semantics through the full command path.
//!
//! Each scenario drives the engine through its public command surface,
//! captures trades through a registered observer, and audits the book's
//! structural invariants after every accepted command.

use std::cell::RefCell;
use std::rc::Rc;

use tickmatch_engine::{EngineObserver, ManualClock, MatchingEngine};
use tickmatch_types::{
    EngineConfig, EngineError, ExecutionIdGen, OrderId, Price, Qty, Result, Side, Trade, UserId,
};

#[derive(Default)]
struct TradeLog {
    trades: Vec<Trade>,
}

impl EngineObserver for TradeLog {
    fn name(&self) -> &str {
        "trade-log"
    }

    fn on_trade_executed(&mut self, trade: &Trade) -> Result<()> {
        self.trades.push(trade.clone());
        Ok(())
    }
}

fn engine() -> (MatchingEngine, Rc<RefCell<TradeLog>>) {
    let mut engine = MatchingEngine::with_parts(
        EngineConfig::default(),
        Box::new(ManualClock::starting_at(1)),
        ExecutionIdGen::default(),
    );
    let log: Rc<RefCell<TradeLog>> = Rc::default();
    engine.register_observer(log.clone());
    (engine, log)
}

/// Add an order (user id mirrors order id) and audit the book.
fn add(engine: &mut MatchingEngine, id: u64, side: Side, qty: Qty, price: Price) {
    engine
        .add_order(OrderId(id), UserId(id), side, qty, price)
        .unwrap();
    engine.book().check_consistency().unwrap();
}

// =====================================================================
// Concrete scenarios
// =====================================================================

#[test]
fn full_cross_on_a_single_level() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 100, 10_050);
    add(&mut engine, 2, Side::Buy, 100, 10_050);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 1);
    let trade = &log.trades[0];
    assert_eq!(trade.aggressor_order_id, OrderId(2));
    assert_eq!(trade.resting_order_id, OrderId(1));
    assert_eq!(trade.price, 10_050);
    assert_eq!(trade.quantity, 100);

    assert_eq!(engine.best_bid(), None);
    assert_eq!(engine.best_ask(), None);
    assert_eq!(engine.order_count(), 0);
}

#[test]
fn partial_fill_rests_the_maker_residue() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 100, 10_050);
    add(&mut engine, 2, Side::Buy, 80, 10_050);

    assert_eq!(log.borrow().trades.len(), 1);
    assert_eq!(log.borrow().trades[0].quantity, 80);
    assert_eq!(log.borrow().trades[0].price, 10_050);

    assert_eq!(engine.best_ask(), Some(10_050));
    assert_eq!(engine.total_ask_volume(), 20);
    assert_eq!(engine.best_bid(), None);
    assert!(!engine.contains_order(OrderId(2)));
    assert_eq!(engine.book().order(OrderId(1)).unwrap().remaining_qty, 20);
}

#[test]
fn aggressor_walks_levels_until_price_stops_crossing() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 50, 10_050);
    add(&mut engine, 2, Side::Sell, 75, 10_060);
    add(&mut engine, 3, Side::Sell, 100, 10_070);
    add(&mut engine, 4, Side::Buy, 200, 10_065);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 2);
    assert_eq!((log.trades[0].price, log.trades[0].quantity), (10_050, 50));
    assert_eq!((log.trades[1].price, log.trades[1].quantity), (10_060, 75));

    assert_eq!(engine.best_bid(), Some(10_065));
    assert_eq!(engine.total_bid_volume(), 75);
    assert_eq!(engine.best_ask(), Some(10_070));
    assert_eq!(engine.total_ask_volume(), 100);
}

#[test]
fn time_priority_inside_a_level() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Buy, 100, 10_000);
    add(&mut engine, 2, Side::Buy, 150, 10_000);
    add(&mut engine, 3, Side::Buy, 200, 10_000);
    add(&mut engine, 4, Side::Sell, 250, 10_000);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 2);
    assert_eq!(log.trades[0].resting_order_id, OrderId(1));
    assert_eq!(log.trades[0].quantity, 100);
    assert_eq!(log.trades[1].resting_order_id, OrderId(2));
    assert_eq!(log.trades[1].quantity, 150);

    assert_eq!(engine.total_bid_volume(), 200);
    assert_eq!(engine.book().order(OrderId(3)).unwrap().remaining_qty, 200);
}

#[test]
fn modify_reduction_at_same_price_keeps_the_head() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Buy, 100, 10_000);
    add(&mut engine, 2, Side::Buy, 150, 10_000);
    add(&mut engine, 3, Side::Buy, 200, 10_000);

    engine.modify_order(OrderId(1), 75, 10_000).unwrap();
    engine.book().check_consistency().unwrap();

    add(&mut engine, 4, Side::Sell, 50, 10_000);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 1);
    assert_eq!(log.trades[0].resting_order_id, OrderId(1));
    assert_eq!(log.trades[0].quantity, 50);
    assert_eq!(engine.book().order(OrderId(1)).unwrap().remaining_qty, 25);
}

#[test]
fn modify_to_a_crossing_price_trades_immediately() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Buy, 100, 9_900);
    add(&mut engine, 2, Side::Sell, 100, 10_100);

    engine.modify_order(OrderId(1), 100, 10_200).unwrap();
    engine.book().check_consistency().unwrap();

    let log = log.borrow();
    assert_eq!(log.trades.len(), 1);
    let trade = &log.trades[0];
    assert_eq!(trade.aggressor_order_id, OrderId(1));
    assert_eq!(trade.resting_order_id, OrderId(2));
    assert_eq!(trade.price, 10_100, "prints at the resting price");
    assert_eq!(trade.quantity, 100);
    assert_eq!(engine.order_count(), 0);
}

// =====================================================================
// Laws
// =====================================================================

#[test]
fn cancel_inverts_a_non_matching_add() {
    let (mut engine, _log) = engine();
    add(&mut engine, 1, Side::Buy, 40, 9_900);
    add(&mut engine, 2, Side::Sell, 60, 10_100);

    let before = (
        engine.best_bid(),
        engine.best_ask(),
        engine.total_bid_volume(),
        engine.total_ask_volume(),
    );

    add(&mut engine, 3, Side::Buy, 25, 9_950);
    engine.cancel_order(OrderId(3)).unwrap();
    engine.book().check_consistency().unwrap();

    let after = (
        engine.best_bid(),
        engine.best_ask(),
        engine.total_bid_volume(),
        engine.total_ask_volume(),
    );
    assert_eq!(before, after);
}

#[test]
fn crossing_add_conserves_aggregate_volume() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 50, 10_050);
    add(&mut engine, 2, Side::Sell, 75, 10_060);
    add(&mut engine, 3, Side::Sell, 100, 10_070);

    let maker_volume_at_entry = engine.total_ask_volume();
    let aggressor_qty: Qty = 200;
    add(&mut engine, 4, Side::Buy, aggressor_qty, 10_065);

    // Each trade consumes its quantity from both parties.
    let traded: Qty = log.borrow().trades.iter().map(|t| t.quantity).sum();
    let residuals = engine.total_bid_volume() + engine.total_ask_volume();
    assert_eq!(maker_volume_at_entry + aggressor_qty, 2 * traded + residuals);
}

#[test]
fn trades_always_print_at_the_resting_price() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 10, 10_050);
    add(&mut engine, 2, Side::Sell, 10, 10_060);
    add(&mut engine, 3, Side::Buy, 20, 99_999);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 2);
    assert_eq!(log.trades[0].price, 10_050);
    assert_eq!(log.trades[1].price, 10_060);
}

#[test]
fn modify_that_is_not_a_pure_reduction_cedes_priority() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Buy, 100, 10_000);
    add(&mut engine, 2, Side::Buy, 100, 10_000);

    // Growing the order re-queues it behind its level peers.
    engine.modify_order(OrderId(1), 120, 10_000).unwrap();
    engine.book().check_consistency().unwrap();

    add(&mut engine, 3, Side::Sell, 50, 10_000);
    assert_eq!(log.borrow().trades[0].resting_order_id, OrderId(2));
}

// =====================================================================
// Boundary behaviors
// =====================================================================

#[test]
fn zero_quantity_add_is_rejected_without_state_change() {
    let (mut engine, log) = engine();
    let result = engine.add_order(OrderId(1), UserId(1), Side::Buy, 0, 100);
    assert!(matches!(result, Err(EngineError::InvalidOrder { .. })));
    assert_eq!(engine.order_count(), 0);
    assert!(log.borrow().trades.is_empty());
    engine.book().check_consistency().unwrap();
}

#[test]
fn duplicate_id_add_is_rejected_without_state_change() {
    let (mut engine, _log) = engine();
    add(&mut engine, 1, Side::Buy, 10, 100);

    let result = engine.add_order(OrderId(1), UserId(9), Side::Sell, 99, 101);
    assert!(matches!(result, Err(EngineError::DuplicateOrder(id)) if id == OrderId(1)));
    assert_eq!(engine.order_count(), 1);
    assert_eq!(engine.total_ask_volume(), 0);
}

#[test]
fn cancel_of_unknown_id_is_rejected() {
    let (mut engine, _log) = engine();
    let result = engine.cancel_order(OrderId(404));
    assert!(matches!(result, Err(EngineError::OrderNotFound(id)) if id == OrderId(404)));
}

#[test]
fn modify_to_zero_quantity_is_rejected() {
    let (mut engine, _log) = engine();
    add(&mut engine, 1, Side::Buy, 10, 100);

    let result = engine.modify_order(OrderId(1), 0, 100);
    assert!(matches!(result, Err(EngineError::InvalidOrder { .. })));
    assert_eq!(engine.book().order(OrderId(1)).unwrap().remaining_qty, 10);
}

#[test]
fn modify_of_unknown_id_is_rejected() {
    let (mut engine, _log) = engine();
    let result = engine.modify_order(OrderId(404), 10, 100);
    assert!(matches!(result, Err(EngineError::OrderNotFound(_))));
}

#[test]
fn add_crossing_an_empty_opposite_side_rests_fully() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Buy, 10, 10_050);

    assert!(log.borrow().trades.is_empty());
    assert_eq!(engine.best_bid(), Some(10_050));
    assert_eq!(engine.total_bid_volume(), 10);
}

#[test]
fn removing_the_last_order_at_a_price_drops_the_level() {
    let (mut engine, _log) = engine();
    add(&mut engine, 1, Side::Sell, 10, 10_050);
    add(&mut engine, 2, Side::Sell, 10, 10_060);

    engine.cancel_order(OrderId(1)).unwrap();
    engine.book().check_consistency().unwrap();
    assert_eq!(engine.best_ask(), Some(10_060));

    engine.cancel_order(OrderId(2)).unwrap();
    assert_eq!(engine.best_ask(), None);
    assert!(engine.book().is_empty());
}

// =====================================================================
// Queries across command sequences
// =====================================================================

#[test]
fn spread_and_mid_track_the_best_levels() {
    let (mut engine, _log) = engine();
    assert_eq!(engine.spread(), None);
    assert_eq!(engine.mid_price(), None);

    add(&mut engine, 1, Side::Buy, 10, 10_000);
    assert_eq!(engine.spread(), None, "one-sided book has no spread");

    add(&mut engine, 2, Side::Sell, 10, 10_010);
    assert_eq!(engine.spread(), Some(10));
    assert_eq!(engine.mid_price(), Some(10_005));

    add(&mut engine, 3, Side::Buy, 10, 10_004);
    assert_eq!(engine.spread(), Some(6));
}

#[test]
fn execution_ids_stay_monotonic_across_commands() {
    let (mut engine, log) = engine();
    add(&mut engine, 1, Side::Sell, 10, 10_000);
    add(&mut engine, 2, Side::Buy, 10, 10_000);
    add(&mut engine, 3, Side::Sell, 10, 10_000);
    add(&mut engine, 4, Side::Buy, 10, 10_000);

    let log = log.borrow();
    assert_eq!(log.trades.len(), 2);
    assert!(log.trades[0].execution_id < log.trades[1].execution_id);
}

#[test]
fn trades_carry_the_aggressor_timestamps() {
    let (mut engine, log) = engine();
    engine
        .add_order_at(OrderId(1), UserId(1), Side::Sell, 10, 10_000, 100, 101)
        .unwrap();
    engine
        .add_order_at(OrderId(2), UserId(2), Side::Buy, 10, 10_000, 200, 201)
        .unwrap();

    let log = log.borrow();
    assert_eq!(log.trades[0].ts_received, 200);
    assert_eq!(log.trades[0].ts_executed, 201);
    assert_eq!(log.trades[0].aggressor_user_id, UserId(2));
    assert_eq!(log.trades[0].resting_user_id, UserId(1));
}
