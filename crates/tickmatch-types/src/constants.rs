//! System-wide constants for the TickMatch engine.

/// Orders pre-allocated in the arena by default.
pub const DEFAULT_ARENA_CAPACITY: usize = 1 << 16;

/// First execution id issued by a fresh generator.
pub const FIRST_EXECUTION_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TickMatch";
