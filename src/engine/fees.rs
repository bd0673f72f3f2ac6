//! Fee schedule: pure lookup from (symbol, liquidity role) to a fee rate.
//!
//! Fees are expressed in basis points (bps), where 1 bps = 0.01% = 0.0001.
//! Negative maker values represent rebates. Rates are attached to trades at
//! emission time and never recomputed later; fee *collection* is a
//! downstream concern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The liquidity role of a trade party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityRole {
    /// The resting side of a trade; provided liquidity.
    Maker,
    /// The incoming aggressor side; removed liquidity.
    Taker,
}

/// Maker/taker fee rates for one symbol, in basis points, with the
/// currency fees are denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Maker fee in basis points (negative = rebate).
    pub maker_fee_bps: i32,

    /// Taker fee in basis points.
    pub taker_fee_bps: i32,

    /// Currency the fee is denominated in.
    pub fee_currency: String,
}

impl FeeSchedule {
    /// Create a new fee schedule.
    ///
    /// # Examples
    ///
    /// ```
    /// use matchbook_rs::FeeSchedule;
    ///
    /// // 10 bps maker, 20 bps taker, denominated in USD
    /// let schedule = FeeSchedule::new(10, 20, "USD");
    /// assert_eq!(schedule.maker_fee_bps, 10);
    /// assert_eq!(schedule.taker_fee_bps, 20);
    /// ```
    #[must_use]
    pub fn new(maker_fee_bps: i32, taker_fee_bps: i32, fee_currency: impl Into<String>) -> Self {
        Self {
            maker_fee_bps,
            taker_fee_bps,
            fee_currency: fee_currency.into(),
        }
    }

    /// Create a zero-fee schedule.
    #[must_use]
    pub fn zero_fee(fee_currency: impl Into<String>) -> Self {
        Self::new(0, 0, fee_currency)
    }

    /// Create a schedule with maker rebates.
    ///
    /// `maker_rebate_bps` is given as a positive value and negated.
    #[must_use]
    pub fn with_maker_rebate(
        maker_rebate_bps: i32,
        taker_fee_bps: i32,
        fee_currency: impl Into<String>,
    ) -> Self {
        Self::new(-maker_rebate_bps.abs(), taker_fee_bps, fee_currency)
    }

    /// The rate in basis points for the given role.
    #[must_use]
    #[inline]
    pub fn rate_for(&self, role: LiquidityRole) -> i32 {
        match role {
            LiquidityRole::Maker => self.maker_fee_bps,
            LiquidityRole::Taker => self.taker_fee_bps,
        }
    }

    /// Whether this schedule provides maker rebates.
    #[must_use]
    #[inline]
    pub fn has_maker_rebate(&self) -> bool {
        self.maker_fee_bps < 0
    }

    /// Whether both rates are zero.
    #[must_use]
    #[inline]
    pub fn is_zero_fee(&self) -> bool {
        self.maker_fee_bps == 0 && self.taker_fee_bps == 0
    }

    /// Calculate the fee amount for a transaction of the given notional
    /// value (price × quantity in scaled units).
    ///
    /// Positive results are charges, negative results are rebates.
    #[must_use = "Fee calculation result must be used"]
    #[inline]
    pub fn calculate_fee(&self, notional: u128, role: LiquidityRole) -> i128 {
        let bps = self.rate_for(role);
        // notional can be large; bps is small. Dividing by 10_000 keeps the
        // result in range for any realistic input.
        (notional as i128)
            .checked_mul(bps as i128)
            .map(|product| product / 10_000)
            .unwrap_or(i128::MAX)
    }
}

/// Per-symbol fee schedules with a default fallback.
///
/// Deterministic: the table is read-only after startup and snapshotted into
/// each symbol engine, so the same (symbol, role) inputs always yield the
/// same rate within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTable {
    default: FeeSchedule,
    overrides: HashMap<String, FeeSchedule>,
}

impl FeeTable {
    /// Creates a table where every symbol uses `default`.
    #[must_use]
    pub fn new(default: FeeSchedule) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Sets a symbol-specific schedule.
    #[must_use]
    pub fn with_override(mut self, symbol: impl Into<String>, schedule: FeeSchedule) -> Self {
        self.overrides.insert(symbol.into(), schedule);
        self
    }

    /// The schedule for `symbol`, falling back to the default.
    #[must_use]
    pub fn schedule_for(&self, symbol: &str) -> &FeeSchedule {
        self.overrides.get(symbol).unwrap_or(&self.default)
    }
}

impl Default for FeeTable {
    fn default() -> Self {
        Self::new(FeeSchedule::zero_fee("USD"))
    }
}
