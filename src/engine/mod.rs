//! Matching engine implementation: per-symbol order books, the price-time
//! priority matcher, single-writer symbol engines, and sequenced
//! market-data fanout.

pub mod admission;
pub mod book;
pub mod error;
pub mod events;
pub mod exchange;
pub mod fees;
pub mod level;
pub mod matching;
pub mod replay;
pub mod sequencer;
pub mod serialization;
pub mod snapshot;
pub mod symbol;
pub mod types;

pub use book::OrderBook;
pub use error::EngineError;
pub use exchange::Exchange;
pub use symbol::{Command, CommandReply, SymbolCore, SymbolEngine};
