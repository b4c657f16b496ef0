//! Configuration for an engine instance and its traded symbol.
//!
//! The engine itself works in integer ticks and lots. `SymbolConfig`
//! carries the human-facing scale so collaborators (recorders, P&L
//! trackers) can convert without baking a price scale into the core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, Price, Qty};

/// Per-symbol scale configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Symbol name (e.g., "ESZ5").
    pub symbol: String,
    /// Quote-currency value of one price tick.
    pub tick_size: Decimal,
    /// Base-unit value of one quantity lot.
    pub lot_size: Decimal,
}

impl SymbolConfig {
    #[must_use]
    pub fn new(symbol: impl Into<String>, tick_size: Decimal, lot_size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            lot_size,
        }
    }

    /// CME ES-style symbol: quarter-point ticks, single-contract lots.
    #[must_use]
    pub fn es_futures() -> Self {
        Self::new("ES", Decimal::new(25, 2), Decimal::ONE)
    }

    /// Convert a tick price to quote currency.
    #[must_use]
    pub fn price_to_quote(&self, price: Price) -> Decimal {
        Decimal::from(price) * self.tick_size
    }

    /// Convert a lot quantity to base units.
    #[must_use]
    pub fn qty_to_base(&self, qty: Qty) -> Decimal {
        Decimal::from(qty) * self.lot_size
    }
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self::es_futures()
    }
}

/// Construction-time settings for one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbol: SymbolConfig,
    /// Orders pre-allocated in the arena.
    pub arena_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: SymbolConfig::default(),
            arena_capacity: constants::DEFAULT_ARENA_CAPACITY,
        }
    }
}
