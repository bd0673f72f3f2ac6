//! Matching engine error types

use crate::engine::types::{OrderId, OrderStatus, Side};
use std::fmt;

/// Errors surfaced to command submitters.
///
/// Every variant is a recoverable, client-visible condition; the engine
/// never panics on client-induced errors. Internal invariant violations
/// (a crossed book after matching) halt the symbol engine instead of
/// appearing here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// Admission invariants violated (bad price/quantity, tick or lot
    /// mismatch, price present or missing for the order kind).
    MalformedOrder {
        /// Description of the violated invariant.
        message: String,
    },

    /// The symbol is not hosted by this engine instance.
    UnknownSymbol {
        /// The symbol that was requested.
        symbol: String,
    },

    /// Cancel target absent from the order index and never seen before.
    UnknownOrder {
        /// The order ID that was requested.
        order_id: OrderId,
    },

    /// Cancel target exists historically but already reached a terminal
    /// state. Callers wanting idempotent cancel may treat this as success.
    AlreadyTerminal {
        /// The order ID that was requested.
        order_id: OrderId,
        /// The terminal state the order reached.
        status: OrderStatus,
    },

    /// Fill-or-kill feasibility scan found too little quantity within the
    /// limit; the book is untouched.
    InsufficientLiquidity {
        /// The side of the rejected order.
        side: Side,
        /// Quantity requested.
        requested: u64,
        /// Quantity available within the limit at scan time.
        available: u64,
    },

    /// A market order found the opposing side empty, possibly after
    /// partial fills. Surfaced as an ack annotation, not a reject; fills
    /// that occurred are real.
    NoLiquidity {
        /// The side of the market order.
        side: Side,
    },

    /// The symbol engine inbox is full; the client may retry.
    Backpressure {
        /// The symbol whose inbox rejected the command.
        symbol: String,
    },

    /// The symbol engine task is no longer running.
    EngineClosed {
        /// The symbol whose engine has shut down.
        symbol: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MalformedOrder { message } => {
                write!(f, "malformed order: {message}")
            }
            EngineError::UnknownSymbol { symbol } => {
                write!(f, "unknown symbol: {symbol}")
            }
            EngineError::UnknownOrder { order_id } => {
                write!(f, "unknown order: {order_id}")
            }
            EngineError::AlreadyTerminal { order_id, status } => {
                write!(f, "order {order_id} already terminal ({status})")
            }
            EngineError::InsufficientLiquidity {
                side,
                requested,
                available,
            } => {
                write!(
                    f,
                    "insufficient liquidity for {side} order: requested {requested}, available {available}"
                )
            }
            EngineError::NoLiquidity { side } => {
                write!(f, "no liquidity on the opposing side for {side} order")
            }
            EngineError::Backpressure { symbol } => {
                write!(f, "engine inbox full for {symbol}")
            }
            EngineError::EngineClosed { symbol } => {
                write!(f, "engine for {symbol} has shut down")
            }
        }
    }
}

impl std::error::Error for EngineError {}
