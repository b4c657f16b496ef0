//! # tickmatch-types
//!
//! Shared types, errors, and configuration for the **TickMatch** limit
//! order book engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`ExecutionId`], [`ClientId`]
//!   and the scalar aliases [`Price`], [`Qty`], [`Nanos`]
//! - **Order model**: [`Order`], [`Side`]
//! - **Trade model**: [`Trade`]
//! - **Event model**: [`MarketEvent`], [`TopOfBook`], [`Quote`]
//! - **Generators**: [`ExecutionIdGen`], [`OrderIdGen`]
//! - **Configuration**: [`EngineConfig`], [`SymbolConfig`]
//! - **Errors**: [`EngineError`] with `TM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use tickmatch_types::{Order, Side, Trade, MarketEvent, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use trade::*;

// Constants are accessed via `tickmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
