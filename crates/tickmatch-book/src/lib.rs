//! # tickmatch-book
//!
//! Book data structures for the TickMatch engine:
//!
//! - [`OrderArena`]: slab-backed pool owning every live order; everything
//!   else refers to orders through [`OrderHandle`]s
//! - [`PriceLevel`]: FIFO queue of resting orders at one price, kept as an
//!   intrusive doubly-linked list of handles for O(1) removal
//! - [`Book`]: the two side books (`BTreeMap`-ordered, best first), the
//!   order index, and the continuous price-time match walk
//!
//! The arena owns; the side books and the index hold handles. Dropping the
//! book drops the arena and with it every resting order.

pub mod arena;
pub mod book;
pub mod price_level;

pub use arena::{OrderArena, OrderHandle};
pub use book::Book;
pub use price_level::PriceLevel;
