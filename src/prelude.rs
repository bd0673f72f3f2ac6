//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```
//!
//! This imports everything needed to stand up an engine, submit orders,
//! and consume market data.

// Core engine types
pub use crate::engine::book::{LevelDepth, OrderBook};
pub use crate::engine::error::EngineError;
pub use crate::engine::exchange::Exchange;
pub use crate::engine::symbol::{Command, CommandReply, SymbolCore, SymbolEngine};

// Domain types
pub use crate::engine::types::{
    Bbo, Order, OrderId, OrderKind, OrderStatus, Side, SymbolConfig,
};

// Commands and admission
pub use crate::engine::admission::NewOrderRequest;

// Matching results
pub use crate::engine::matching::{Fill, LevelUpdate, MatchExecution};

// Market data
pub use crate::engine::events::{BboUpdate, BookDelta, MarketDataEvent, Trade};
pub use crate::engine::sequencer::{ChannelMask, SequencerConfig, Subscription};
pub use crate::engine::serialization::{EventSerializer, JsonEventSerializer};
pub use crate::engine::snapshot::{BookSnapshot, SnapshotPackage};

// Fees
pub use crate::engine::fees::{FeeSchedule, FeeTable, LiquidityRole};

// Journaling and replay
pub use crate::engine::replay::{CommandRecord, Journal, JournaledOp, MemoryJournal};

// Utility functions
pub use crate::utils::{format_fixed, monotonic_nanos, parse_fixed};
