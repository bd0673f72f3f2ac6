//! # Price-Time Priority Matching Engine
//!
//! A central limit order book (CLOB) matching engine for single-venue
//! trading systems, written in Rust. Each symbol is owned by a single
//! logical writer that serializes commands, matches incoming orders under
//! strict price-time priority, and publishes a deterministic, sequenced
//! event stream to market-data subscribers.
//!
//! ## Key Features
//!
//! - **Four order types**: limit, market, immediate-or-cancel, and
//!   fill-or-kill, all matched against the same FIFO price levels.
//! - **No trade-throughs**: every trade prints at the maker's resting
//!   price, so a taker can only ever receive price improvement relative to
//!   its limit.
//! - **Single-writer concurrency**: one Tokio task per symbol owns its
//!   book outright behind a bounded inbox; scale-out is by sharding
//!   symbols, not by locking inside a book.
//! - **Deterministic event stream**: gap-free per-symbol sequence numbers
//!   over trades and book deltas, with monotonic trade ids, suitable for
//!   external journaling and deterministic replay.
//! - **Market-data fanout**: `orderbook`, `trades`, and `bbo` channels with
//!   snapshot-on-subscribe semantics; slow subscribers are dropped rather
//!   than ever blocking the engine.
//! - **Exact arithmetic**: prices and quantities are scaled fixed-point
//!   integers end to end; external JSON carries decimal strings.
//!
//! ## Quick Start
//!
//! ```
//! use matchbook_rs::prelude::*;
//!
//! let config = SymbolConfig::new("BTC/USD", 2, 3, 1, 1, "USD");
//! let mut core = SymbolCore::new(config, FeeSchedule::new(10, 20, "USD"));
//!
//! // Rest an ask, then cross it with a bid.
//! let ask = NewOrderRequest::limit(Side::Sell, 10_000, 1_000);
//! core.apply(Command::NewOrder(ask));
//!
//! let bid = NewOrderRequest::limit(Side::Buy, 10_000, 1_000);
//! let reply = core.apply(Command::NewOrder(bid));
//!
//! match reply {
//!     CommandReply::OrderAccepted { status, executed, .. } => {
//!         assert_eq!(status, OrderStatus::Filled);
//!         assert_eq!(executed, 1_000);
//!     }
//!     other => panic!("unexpected reply: {other:?}"),
//! }
//! assert!(core.book().is_empty());
//! ```
//!
//! For a multi-symbol deployment, wrap cores in [`Exchange`], which spawns
//! one [`engine::symbol::SymbolEngine`] task per symbol and routes
//! commands, cancels, queries, and subscriptions to the right writer.
//!
//! ## Design Goals
//!
//! 1. **Correctness**: price-time priority, non-crossed book, and
//!    conservation of quantity are enforced invariants, exercised by
//!    property tests over arbitrary command sequences.
//! 2. **Determinism**: identical command order reproduces identical book
//!    state, sequence numbers, and trade ids; replay is a first-class
//!    startup path.
//! 3. **Isolation**: client-induced errors are recoverable acks; internal
//!    invariant violations halt the affected symbol engine and nothing
//!    else.

pub mod engine;
pub mod prelude;
mod utils;

pub use engine::admission::NewOrderRequest;
pub use engine::book::{LevelDepth, OrderBook};
pub use engine::error::EngineError;
pub use engine::events::{BboUpdate, BookDelta, MarketDataEvent, Trade};
pub use engine::exchange::{DEFAULT_INBOX_CAPACITY, Exchange};
pub use engine::fees::{FeeSchedule, FeeTable, LiquidityRole};
pub use engine::level::{HeadFill, PriceLevel};
pub use engine::matching::{Fill, LevelUpdate, MatchExecution};
pub use engine::replay::{
    CommandRecord, Journal, JournalError, JournalReadIter, JournaledOp, MemoryJournal,
};
pub use engine::sequencer::{ChannelMask, EventSequencer, SequencerConfig, Subscription};
pub use engine::serialization::{EventSerializer, JsonEventSerializer, SerializationError};
pub use engine::snapshot::{BookSnapshot, SNAPSHOT_FORMAT_VERSION, SnapshotError, SnapshotPackage};
pub use engine::symbol::{Command, CommandReply, SymbolCore, SymbolEngine};
pub use engine::types::{Bbo, Order, OrderId, OrderKind, OrderStatus, Side, SymbolConfig};
pub use utils::{FixedPointError, format_bps, format_fixed, monotonic_nanos, parse_fixed};
