//! Sequenced market-data events emitted by the symbol engine.

use crate::engine::matching::LevelUpdate;
use crate::engine::snapshot::BookSnapshot;
use crate::engine::types::{Bbo, OrderId, Side};
use serde::{Deserialize, Serialize};

/// An executed trade.
///
/// The price is always the maker's resting price; fees are the *rates*
/// looked up at emission time, in basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// The symbol traded.
    pub symbol: String,
    /// Monotonic per-symbol trade identifier.
    pub trade_id: u64,
    /// Execution price in scaled units.
    pub price: u128,
    /// Executed quantity in scaled units.
    pub quantity: u64,
    /// The resting order that provided liquidity.
    pub maker_order_id: OrderId,
    /// The incoming order that removed liquidity.
    pub taker_order_id: OrderId,
    /// The taker's side.
    pub aggressor_side: Side,
    /// Maker fee rate in basis points (negative = rebate).
    pub maker_fee_bps: i32,
    /// Taker fee rate in basis points.
    pub taker_fee_bps: i32,
    /// Currency the fee rates apply in.
    pub fee_currency: String,
    /// Monotonic engine timestamp.
    pub timestamp_ns: u64,
    /// Per-symbol event sequence number.
    pub seq: u64,
}

/// A compact diff of price-level aggregates after one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDelta {
    /// The symbol the delta applies to.
    pub symbol: String,
    /// Changed levels in the order they were touched; a zero quantity
    /// signals level removal.
    pub changes: Vec<LevelUpdate>,
    /// Monotonic engine timestamp.
    pub timestamp_ns: u64,
    /// Per-symbol event sequence number.
    pub seq: u64,
}

/// Top-of-book change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BboUpdate {
    /// The symbol the update applies to.
    pub symbol: String,
    /// The new best bid and offer.
    pub bbo: Bbo,
    /// Monotonic engine timestamp.
    pub timestamp_ns: u64,
    /// Per-symbol event sequence number.
    pub seq: u64,
}

/// Any event carried on the market-data channels.
///
/// Snapshots do not consume a sequence number of their own; they carry the
/// last sequence emitted before they were taken so every subscriber's
/// delta stream stays gap-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketDataEvent {
    /// A trade print for the `trades` channel.
    Trade(Trade),
    /// An incremental book update for the `orderbook` channel.
    Delta(BookDelta),
    /// A full book snapshot for the `orderbook` channel.
    Snapshot(BookSnapshot),
    /// A top-of-book change for the `bbo` channel.
    Bbo(BboUpdate),
}

impl MarketDataEvent {
    /// The sequence position of this event: its own sequence number, or
    /// for snapshots the last sequence they reflect.
    #[must_use]
    pub fn seq(&self) -> u64 {
        match self {
            MarketDataEvent::Trade(trade) => trade.seq,
            MarketDataEvent::Delta(delta) => delta.seq,
            MarketDataEvent::Snapshot(snapshot) => snapshot.last_seq,
            MarketDataEvent::Bbo(update) => update.seq,
        }
    }

    /// The symbol this event belongs to.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            MarketDataEvent::Trade(trade) => &trade.symbol,
            MarketDataEvent::Delta(delta) => &delta.symbol,
            MarketDataEvent::Snapshot(snapshot) => &snapshot.symbol,
            MarketDataEvent::Bbo(update) => &update.symbol,
        }
    }
}
