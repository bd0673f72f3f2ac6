//! Per-symbol order book: two price-ordered level maps plus the order
//! index that makes cancellation cheap.

use crate::engine::error::EngineError;
use crate::engine::level::PriceLevel;
use crate::engine::types::{Bbo, Order, OrderId, Side};
use either::Either;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// One price level of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LevelDepth {
    /// Level price in scaled units.
    pub price: u128,
    /// Total resting quantity at the level.
    pub quantity: u64,
    /// Number of live orders at the level.
    pub order_count: usize,
}

/// The order book for a single symbol.
///
/// Bids iterate highest-first, asks lowest-first. The book is owned
/// outright by its symbol engine; no interior locking is needed because
/// exactly one logical writer mutates it.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,

    /// Bid side levels keyed by scaled price; best bid is the highest key.
    bids: BTreeMap<u128, PriceLevel>,

    /// Ask side levels keyed by scaled price; best ask is the lowest key.
    asks: BTreeMap<u128, PriceLevel>,

    /// Order index: id → (price, side) of the level holding the order.
    order_locations: HashMap<OrderId, (u128, Side)>,

    /// Price of the most recent trade, if any.
    last_trade_price: Option<u128>,
}

impl OrderBook {
    /// Creates an empty book for `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_locations: HashMap::new(),
            last_trade_price: None,
        }
    }

    /// The symbol this book belongs to.
    #[must_use]
    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Best bid price and aggregate quantity at that price.
    #[must_use]
    pub fn best_bid(&self) -> Option<(u128, u64)> {
        self.bids
            .last_key_value()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best ask price and aggregate quantity at that price.
    #[must_use]
    pub fn best_ask(&self) -> Option<(u128, u64)> {
        self.asks
            .first_key_value()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Current best bid and offer.
    #[must_use]
    pub fn bbo(&self) -> Bbo {
        Bbo {
            bid: self.best_bid(),
            ask: self.best_ask(),
        }
    }

    /// Price of the most recent trade, if any.
    #[must_use]
    #[inline]
    pub fn last_trade_price(&self) -> Option<u128> {
        self.last_trade_price
    }

    pub(crate) fn record_trade_price(&mut self, price: u128) {
        self.last_trade_price = Some(price);
    }

    /// Number of price levels on `side`.
    #[must_use]
    pub fn level_count(&self, side: Side) -> usize {
        self.side_levels(side).len()
    }

    /// Number of live orders across both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.order_locations.len()
    }

    /// Whether both sides are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Iterates levels on `side` from best toward worse.
    pub fn levels(&self, side: Side) -> impl Iterator<Item = &PriceLevel> {
        match side {
            Side::Buy => Either::Left(self.bids.values().rev()),
            Side::Sell => Either::Right(self.asks.values()),
        }
    }

    /// Top `depth` levels per side, best-first.
    #[must_use]
    pub fn depth(&self, depth: usize) -> (Vec<LevelDepth>, Vec<LevelDepth>) {
        let collect = |side: Side| -> Vec<LevelDepth> {
            self.levels(side)
                .take(depth)
                .map(|level| LevelDepth {
                    price: level.price(),
                    quantity: level.total_quantity(),
                    order_count: level.order_count(),
                })
                .collect()
        };
        (collect(Side::Buy), collect(Side::Sell))
    }

    /// Rests a limit order at the tail of its price level, creating the
    /// level on first use, and records it in the order index.
    pub fn insert_resting(&mut self, order: Order) {
        debug_assert!(order.remaining > 0);
        let price = order
            .price
            .expect("resting orders always carry a limit price");
        let side = order.side;
        let id = order.id;

        trace!("resting order {} {} {} @ {}", id, side, order.remaining, price);
        self.side_levels_mut(side)
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price, side))
            .append(order);
        self.order_locations.insert(id, (price, side));
    }

    /// Removes a resting order via the index, evicting its level when the
    /// level empties.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownOrder`] when the id is not resting.
    pub fn remove_order(&mut self, order_id: OrderId) -> Result<Order, EngineError> {
        let (price, side) = self
            .order_locations
            .remove(&order_id)
            .ok_or(EngineError::UnknownOrder { order_id })?;

        let levels = self.side_levels_mut(side);
        let level = levels
            .get_mut(&price)
            .expect("order index points at a live level");
        let order = level
            .remove(order_id)
            .expect("order index points at a live order");
        if level.is_empty() {
            levels.remove(&price);
        }

        trace!("removed order {} {} @ {}", order_id, side, price);
        Ok(order)
    }

    /// Whether the id is currently resting on the book.
    #[must_use]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.order_locations.contains_key(&order_id)
    }

    /// Returns a resting order by id via the index.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let (price, side) = self.order_locations.get(&order_id)?;
        self.side_levels(*side).get(price)?.order(order_id)
    }

    /// Location of a resting order, as recorded in the order index.
    #[must_use]
    pub fn order_location(&self, order_id: OrderId) -> Option<(u128, Side)> {
        self.order_locations.get(&order_id).copied()
    }

    /// Non-mutating feasibility scan for a taker on `taker_side`: sums
    /// opposing quantity strictly within `limit`, stopping early once
    /// `requested` is covered.
    #[must_use]
    pub fn available_within(
        &self,
        taker_side: Side,
        limit: Option<u128>,
        requested: u64,
    ) -> u64 {
        let mut available = 0u64;
        for level in self.levels(taker_side.opposite()) {
            if available >= requested {
                break;
            }
            if let Some(limit) = limit {
                match taker_side {
                    Side::Buy if level.price() > limit => break,
                    Side::Sell if level.price() < limit => break,
                    _ => {}
                }
            }
            available = available.saturating_add(level.total_quantity());
        }
        available
    }

    /// Best opposing price a taker on `taker_side` would match against.
    #[must_use]
    pub(crate) fn best_opposing_price(&self, taker_side: Side) -> Option<u128> {
        match taker_side {
            Side::Buy => self.best_ask().map(|(price, _)| price),
            Side::Sell => self.best_bid().map(|(price, _)| price),
        }
    }

    /// Whether the book is locked or crossed (`best_bid >= best_ask`).
    ///
    /// A crossed book after a completed matching cycle is an internal
    /// invariant violation, not a recoverable state.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => bid >= ask,
            _ => false,
        }
    }

    /// Drops an order index entry without touching its level; used by the
    /// matcher after a maker was exhausted and already removed from the
    /// level.
    pub(crate) fn unindex_order(&mut self, order_id: OrderId) {
        self.order_locations.remove(&order_id);
    }

    pub(crate) fn side_levels(&self, side: Side) -> &BTreeMap<u128, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(crate) fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<u128, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}
