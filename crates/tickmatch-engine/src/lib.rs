//! # tickmatch-engine
//!
//! The TickMatch command state machine. One logical thread owns a
//! [`MatchingEngine`]; commands (add, cancel, modify) mutate it serially
//! and each completes synchronously, emitting events to registered
//! observers before the next command is accepted.
//!
//! - [`MatchingEngine`]: validation, continuous matching, event ordering
//! - [`EngineObserver`]: the capability set observers implement; failures
//!   are isolated per observer and never alter engine state
//! - [`CommandQueue`]: the queued-tail discipline — observers enqueue
//!   follow-up commands instead of re-entering the engine mid-update
//! - [`Clock`]: injectable time source ([`SystemClock`] for wall time,
//!   [`ManualClock`] for deterministic tests and replays)

pub mod clock;
pub mod command;
pub mod engine;
pub mod observer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandQueue};
pub use engine::MatchingEngine;
pub use observer::{EngineObserver, ObserverSet, SharedObserver};
