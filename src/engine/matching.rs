//! Core matching logic: applies an incoming order to the book under
//! price-time priority and reports the resulting fills and level changes.
//!
//! All trades print at the maker's resting price, never the taker's, so a
//! taker can only ever receive price improvement relative to its limit.

use crate::engine::book::OrderBook;
use crate::engine::error::EngineError;
use crate::engine::types::{Order, OrderId, OrderKind, OrderStatus, Side};
use tracing::trace;

/// A single execution against a resting maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// The resting order that provided liquidity.
    pub maker_order_id: OrderId,
    /// Execution price — always the maker's resting price.
    pub price: u128,
    /// Executed quantity.
    pub quantity: u64,
    /// Maker quantity left on the book after this fill; zero means the
    /// maker was exhausted and removed.
    pub maker_remaining: u64,
}

/// Aggregate quantity of one price level after a command touched it.
///
/// A `total_quantity` of zero signals level removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LevelUpdate {
    /// The side the level belongs to.
    pub side: Side,
    /// The level price in scaled units.
    pub price: u128,
    /// New aggregate quantity; zero when the level was removed.
    pub total_quantity: u64,
}

/// The full effect of applying one incoming order to the book.
#[derive(Debug, Clone)]
pub struct MatchExecution {
    /// Final taker state after the walk (status and remaining updated).
    pub taker: Order,
    /// Fills in the order they were produced.
    pub fills: Vec<Fill>,
    /// Aggregate changes per touched price level, walk order.
    pub level_updates: Vec<LevelUpdate>,
    /// Whether residual taker quantity was rested on the book.
    pub rested: bool,
    /// Whether a market taker ran out of opposing liquidity with residual
    /// quantity; the residual was cancelled.
    pub no_liquidity: bool,
}

impl MatchExecution {
    /// Quantity the taker executed across all fills.
    #[must_use]
    #[inline]
    pub fn executed(&self) -> u64 {
        self.taker.executed()
    }
}

impl OrderBook {
    /// Applies an incoming order to the book.
    ///
    /// Walks the opposing side from the best level toward worse, filling
    /// head makers FIFO within each level, until the taker is filled, the
    /// limit is breached, or the side is exhausted. Residual handling
    /// follows the order kind: limit rests, market and IOC cancel, FOK is
    /// feasibility-checked up front.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientLiquidity`] when a fill-or-kill
    /// order cannot fill completely; the book is left untouched.
    pub fn execute(&mut self, mut taker: Order) -> Result<MatchExecution, EngineError> {
        if taker.kind == OrderKind::FillOrKill {
            let available = self.available_within(taker.side, taker.price, taker.remaining);
            if available < taker.remaining {
                return Err(EngineError::InsufficientLiquidity {
                    side: taker.side,
                    requested: taker.remaining,
                    available,
                });
            }
        }

        let opposing = taker.side.opposite();
        let mut fills: Vec<Fill> = Vec::new();
        let mut level_updates: Vec<LevelUpdate> = Vec::new();
        let mut completed_makers: Vec<OrderId> = Vec::new();

        while taker.remaining > 0 {
            let Some(best) = self.best_opposing_price(taker.side) else {
                break;
            };
            if let Some(limit) = taker.price {
                match taker.side {
                    Side::Buy if best > limit => break,
                    Side::Sell if best < limit => break,
                    _ => {}
                }
            }

            let level = self
                .side_levels_mut(opposing)
                .get_mut(&best)
                .expect("best price points at a live level");

            while taker.remaining > 0 {
                let Some(head) = level.fill_head(taker.remaining) else {
                    break;
                };
                taker.fill(head.filled);
                fills.push(Fill {
                    maker_order_id: head.maker_id,
                    price: best,
                    quantity: head.filled,
                    maker_remaining: head.maker_remaining,
                });
                if head.maker_remaining == 0 {
                    completed_makers.push(head.maker_id);
                }
            }

            level_updates.push(LevelUpdate {
                side: opposing,
                price: best,
                total_quantity: level.total_quantity(),
            });
            if level.is_empty() {
                self.side_levels_mut(opposing).remove(&best);
            }
        }

        // Batch-remove exhausted makers from the order index.
        for maker_id in &completed_makers {
            self.unindex_order(*maker_id);
        }
        if let Some(last) = fills.last() {
            self.record_trade_price(last.price);
        }

        let mut rested = false;
        let mut no_liquidity = false;
        if taker.remaining > 0 {
            match taker.kind {
                OrderKind::Limit => {
                    let price = taker
                        .price
                        .expect("limit orders always carry a limit price");
                    self.insert_resting(taker.clone());
                    let total = self
                        .side_levels(taker.side)
                        .get(&price)
                        .map(|level| level.total_quantity())
                        .unwrap_or(0);
                    level_updates.push(LevelUpdate {
                        side: taker.side,
                        price,
                        total_quantity: total,
                    });
                    rested = true;
                }
                OrderKind::Market => {
                    no_liquidity = true;
                    taker.status = if fills.is_empty() {
                        OrderStatus::Cancelled
                    } else {
                        OrderStatus::Filled
                    };
                }
                OrderKind::ImmediateOrCancel => {
                    taker.status = OrderStatus::Cancelled;
                }
                OrderKind::FillOrKill => {
                    // The feasibility scan guarantees a full fill within
                    // this serialized command.
                    debug_assert!(false, "fill-or-kill residual after feasibility scan");
                    taker.status = OrderStatus::Cancelled;
                }
            }
        }

        debug_assert!(!self.is_crossed(), "book crossed after matching");
        trace!(
            "matched order {}: {} fills, executed {}, remaining {}",
            taker.id,
            fills.len(),
            taker.executed(),
            taker.remaining
        );

        Ok(MatchExecution {
            taker,
            fills,
            level_updates,
            rested,
            no_liquidity,
        })
    }
}
