//! Core domain types for the matching engine: identifiers, sides, order
//! kinds, order state, and per-symbol configuration.

use crate::utils::{FixedPointError, format_fixed, parse_fixed};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique order identifier, assigned at admission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random (v4) order identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID, e.g. when replaying a journal.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid side; matches against resting sell orders.
    Buy,
    /// Ask side; matches against resting buy orders.
    Sell,
}

impl Side {
    /// Returns the opposing side.
    #[must_use]
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Execution semantics of an incoming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Rests any residual quantity on the book after matching.
    Limit,
    /// Sweeps the opposing side without a price bound; never rests.
    Market,
    /// Limit semantics during the walk, residual cancelled instead of rested.
    ImmediateOrCancel,
    /// Executes fully or not at all; the book is untouched on reject.
    FillOrKill,
}

impl OrderKind {
    /// Whether residual quantity may rest on the book after matching.
    #[must_use]
    #[inline]
    pub fn may_rest(&self) -> bool {
        matches!(self, OrderKind::Limit)
    }

    /// Whether this kind requires a limit price.
    #[must_use]
    #[inline]
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderKind::Market)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::Market => write!(f, "market"),
            OrderKind::ImmediateOrCancel => write!(f, "ioc"),
            OrderKind::FillOrKill => write!(f, "fok"),
        }
    }
}

/// Lifecycle state of an order.
///
/// Transitions are monotonic: `New → PartiallyFilled → Filled`, with
/// `Cancelled` and `Rejected` as terminal states reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Admitted, no fills yet.
    New,
    /// At least one fill, remaining quantity above zero.
    PartiallyFilled,
    /// Remaining quantity reached zero.
    Filled,
    /// Removed from the book (or never rested) with remaining quantity.
    Cancelled,
    /// Refused before or during matching; no residual state.
    Rejected,
}

impl OrderStatus {
    /// Whether this is a terminal state.
    #[must_use]
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "new"),
            OrderStatus::PartiallyFilled => write!(f, "partially_filled"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An order as tracked by the engine.
///
/// Prices are scaled fixed-point integers (see [`SymbolConfig`]); the
/// submission sequence is the time key for price-time priority and is
/// assigned by the symbol engine in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier assigned at admission.
    pub id: OrderId,
    /// Buy or Sell.
    pub side: Side,
    /// Execution semantics.
    pub kind: OrderKind,
    /// Limit price in scaled units; `None` for market orders.
    pub price: Option<u128>,
    /// Original quantity in scaled units.
    pub quantity: u64,
    /// Unfilled quantity; invariant `remaining <= quantity`.
    pub remaining: u64,
    /// Arrival-order sequence within the symbol.
    pub submission_seq: u64,
    /// Current lifecycle state.
    pub status: OrderStatus,
}

impl Order {
    /// Quantity executed so far.
    #[must_use]
    #[inline]
    pub fn executed(&self) -> u64 {
        self.quantity - self.remaining
    }

    /// Applies a fill of `quantity` units, advancing the lifecycle state.
    ///
    /// Saturates at zero remaining; callers size fills with
    /// `min(taker.remaining, maker.remaining)` so saturation never fires in
    /// practice.
    pub(crate) fn fill(&mut self, quantity: u64) {
        self.remaining = self.remaining.saturating_sub(quantity);
        self.status = if self.remaining == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}

/// Static per-symbol configuration: scales, tick/lot sizes, fee currency.
///
/// `price_scale` and `qty_scale` give the number of decimal places carried
/// by the scaled integer representation; `tick` and `lot` are expressed in
/// those scaled units. A symbol quoted to 0.01 with `price_scale = 2` has
/// `tick = 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// The symbol this configuration applies to, e.g. `"BTC/USD"`.
    pub symbol: String,
    /// Decimal places in scaled prices.
    pub price_scale: u32,
    /// Decimal places in scaled quantities.
    pub qty_scale: u32,
    /// Minimum price increment, in scaled price units.
    pub tick: u128,
    /// Minimum quantity increment, in scaled quantity units.
    pub lot: u64,
    /// Currency in which trading fees are denominated.
    pub fee_currency: String,
}

impl SymbolConfig {
    /// Creates a new symbol configuration.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        price_scale: u32,
        qty_scale: u32,
        tick: u128,
        lot: u64,
        fee_currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price_scale,
            qty_scale,
            tick,
            lot,
            fee_currency: fee_currency.into(),
        }
    }

    /// Formats a scaled price as a decimal string, e.g. `10_000` → `"100.00"`.
    #[must_use]
    pub fn format_price(&self, price: u128) -> String {
        format_fixed(price, self.price_scale)
    }

    /// Formats a scaled quantity as a decimal string.
    #[must_use]
    pub fn format_qty(&self, quantity: u64) -> String {
        format_fixed(quantity as u128, self.qty_scale)
    }

    /// Parses a decimal price string into scaled units.
    ///
    /// # Errors
    ///
    /// Returns [`FixedPointError`] for malformed input or excess precision.
    pub fn parse_price(&self, input: &str) -> Result<u128, FixedPointError> {
        parse_fixed(input, self.price_scale)
    }

    /// Parses a decimal quantity string into scaled units.
    ///
    /// # Errors
    ///
    /// Returns [`FixedPointError`] for malformed input, excess precision, or
    /// values beyond the quantity range.
    pub fn parse_qty(&self, input: &str) -> Result<u64, FixedPointError> {
        let raw = parse_fixed(input, self.qty_scale)?;
        u64::try_from(raw).map_err(|_| FixedPointError::Malformed(input.to_string()))
    }
}

/// Best bid and offer with aggregated head-level quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bbo {
    /// Best bid price and total quantity at that level, if the side is
    /// non-empty.
    pub bid: Option<(u128, u64)>,
    /// Best ask price and total quantity at that level, if the side is
    /// non-empty.
    pub ask: Option<(u128, u64)>,
}

impl Bbo {
    /// Spread between best ask and best bid, when both sides are present.
    #[must_use]
    pub fn spread(&self) -> Option<u128> {
        match (self.bid, self.ask) {
            (Some((bid, _)), Some((ask, _))) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }
}
