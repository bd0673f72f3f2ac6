//! Pluggable wire serialization for market-data events.
//!
//! External JSON uses decimal strings for every price, quantity, and fee
//! rate; binary floating point never appears on the wire. The
//! [`EventSerializer`] trait is the seam for alternative formats; the
//! built-in [`JsonEventSerializer`] is the default.

use crate::engine::book::LevelDepth;
use crate::engine::events::{BboUpdate, BookDelta, MarketDataEvent, Trade};
use crate::engine::snapshot::BookSnapshot;
use crate::engine::types::{Side, SymbolConfig};
use crate::utils::format_bps;
use serde_json::{Value, json};

/// Errors that can occur during event serialization.
#[derive(Debug)]
pub struct SerializationError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event serialization error: {}", self.message)
    }
}

impl std::error::Error for SerializationError {}

/// A pluggable serializer for market-data events.
///
/// Implementations convert a [`MarketDataEvent`] into the wire bytes for
/// one of the fanout channels. The symbol configuration supplies the
/// decimal scales for price and quantity formatting.
pub trait EventSerializer: Send + Sync + std::fmt::Debug {
    /// Serializes an event into a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError`] if the event cannot be encoded.
    fn serialize_event(
        &self,
        event: &MarketDataEvent,
        config: &SymbolConfig,
    ) -> Result<Vec<u8>, SerializationError>;

    /// MIME-like content type identifier for this format.
    #[must_use]
    fn content_type(&self) -> &'static str;
}

/// JSON event serializer using `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventSerializer;

impl JsonEventSerializer {
    /// Create a new JSON event serializer.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self
    }

    fn trade_json(trade: &Trade, config: &SymbolConfig) -> Value {
        json!({
            "type": "trade",
            "symbol": trade.symbol,
            "trade_id": trade.trade_id,
            "price": config.format_price(trade.price),
            "quantity": config.format_qty(trade.quantity),
            "aggressor_side": trade.aggressor_side,
            "maker_order_id": trade.maker_order_id,
            "taker_order_id": trade.taker_order_id,
            "maker_fee": format_bps(trade.maker_fee_bps),
            "taker_fee": format_bps(trade.taker_fee_bps),
            "fee_currency": trade.fee_currency,
            "timestamp": trade.timestamp_ns,
            "seq": trade.seq,
        })
    }

    fn delta_json(delta: &BookDelta, config: &SymbolConfig) -> Value {
        let levels = |side: Side| -> Vec<Value> {
            delta
                .changes
                .iter()
                .filter(|change| change.side == side)
                .map(|change| {
                    json!([
                        config.format_price(change.price),
                        config.format_qty(change.total_quantity),
                    ])
                })
                .collect()
        };
        json!({
            "type": "orderbook_update",
            "symbol": delta.symbol,
            "bids": levels(Side::Buy),
            "asks": levels(Side::Sell),
            "timestamp": delta.timestamp_ns,
            "seq": delta.seq,
        })
    }

    fn snapshot_json(snapshot: &BookSnapshot, config: &SymbolConfig) -> Value {
        let levels = |levels: &[LevelDepth]| -> Vec<Value> {
            levels
                .iter()
                .map(|level| {
                    json!([
                        config.format_price(level.price),
                        config.format_qty(level.quantity),
                    ])
                })
                .collect()
        };
        json!({
            "type": "orderbook_update",
            "symbol": snapshot.symbol,
            "bids": levels(&snapshot.bids),
            "asks": levels(&snapshot.asks),
            "timestamp": snapshot.timestamp_ns,
            "seq": snapshot.last_seq,
        })
    }

    fn bbo_json(update: &BboUpdate, config: &SymbolConfig) -> Value {
        let price = |entry: Option<(u128, u64)>| -> Value {
            entry.map_or(Value::Null, |(price, _)| config.format_price(price).into())
        };
        let qty = |entry: Option<(u128, u64)>| -> Value {
            entry.map_or(Value::Null, |(_, quantity)| {
                config.format_qty(quantity).into()
            })
        };
        json!({
            "type": "bbo_update",
            "symbol": update.symbol,
            "best_bid": price(update.bbo.bid),
            "best_bid_qty": qty(update.bbo.bid),
            "best_ask": price(update.bbo.ask),
            "best_ask_qty": qty(update.bbo.ask),
            "spread": update.bbo.spread().map_or(Value::Null, |spread| {
                config.format_price(spread).into()
            }),
            "timestamp": update.timestamp_ns,
            "seq": update.seq,
        })
    }
}

impl EventSerializer for JsonEventSerializer {
    fn serialize_event(
        &self,
        event: &MarketDataEvent,
        config: &SymbolConfig,
    ) -> Result<Vec<u8>, SerializationError> {
        let value = match event {
            MarketDataEvent::Trade(trade) => Self::trade_json(trade, config),
            MarketDataEvent::Delta(delta) => Self::delta_json(delta, config),
            MarketDataEvent::Snapshot(snapshot) => Self::snapshot_json(snapshot, config),
            MarketDataEvent::Bbo(update) => Self::bbo_json(update, config),
        };
        serde_json::to_vec(&value).map_err(|error| SerializationError {
            message: error.to_string(),
        })
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
