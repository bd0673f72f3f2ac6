//! Admission checks applied to incoming commands before they reach the
//! matcher.

use crate::engine::error::EngineError;
use crate::engine::types::{OrderKind, Side, SymbolConfig};
use serde::{Deserialize, Serialize};

/// A new-order command as delivered by the transport layer.
///
/// Prices and quantities are already in scaled integer units; decimal
/// parsing is a transport concern (see [`SymbolConfig::parse_price`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    /// Client-assigned identifier, echoed in the ack.
    pub client_order_id: Option<String>,
    /// Buy or Sell.
    pub side: Side,
    /// Execution semantics.
    pub kind: OrderKind,
    /// Limit price in scaled units; must be absent for market orders.
    pub price: Option<u128>,
    /// Quantity in scaled units.
    pub quantity: u64,
}

impl NewOrderRequest {
    /// A limit order request.
    #[must_use]
    pub fn limit(side: Side, price: u128, quantity: u64) -> Self {
        Self {
            client_order_id: None,
            side,
            kind: OrderKind::Limit,
            price: Some(price),
            quantity,
        }
    }

    /// A market order request.
    #[must_use]
    pub fn market(side: Side, quantity: u64) -> Self {
        Self {
            client_order_id: None,
            side,
            kind: OrderKind::Market,
            price: None,
            quantity,
        }
    }

    /// An immediate-or-cancel order request.
    #[must_use]
    pub fn ioc(side: Side, price: u128, quantity: u64) -> Self {
        Self {
            client_order_id: None,
            side,
            kind: OrderKind::ImmediateOrCancel,
            price: Some(price),
            quantity,
        }
    }

    /// A fill-or-kill order request.
    #[must_use]
    pub fn fok(side: Side, price: u128, quantity: u64) -> Self {
        Self {
            client_order_id: None,
            side,
            kind: OrderKind::FillOrKill,
            price: Some(price),
            quantity,
        }
    }

    /// Attaches a client order id.
    #[must_use]
    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }
}

/// Validates a new-order request against the symbol configuration.
///
/// Checked before the matcher ever sees the order: positive quantity on
/// lot boundaries, and a positive tick-aligned price present exactly when
/// the order kind requires one.
///
/// # Errors
///
/// Returns [`EngineError::MalformedOrder`] naming the violated invariant.
pub fn validate(config: &SymbolConfig, request: &NewOrderRequest) -> Result<(), EngineError> {
    let malformed = |message: String| EngineError::MalformedOrder { message };

    if request.quantity == 0 {
        return Err(malformed("quantity must be positive".to_string()));
    }
    if config.lot > 0 && request.quantity % config.lot != 0 {
        return Err(malformed(format!(
            "quantity {} is not a multiple of lot size {}",
            request.quantity, config.lot
        )));
    }

    match (request.kind.requires_price(), request.price) {
        (true, None) => {
            return Err(malformed(format!(
                "{} order requires a limit price",
                request.kind
            )));
        }
        (false, Some(_)) => {
            return Err(malformed("market order must not carry a price".to_string()));
        }
        (true, Some(price)) => {
            if price == 0 {
                return Err(malformed("price must be positive".to_string()));
            }
            if config.tick > 0 && price % config.tick != 0 {
                return Err(malformed(format!(
                    "price {} is not a multiple of tick size {}",
                    price, config.tick
                )));
            }
        }
        (false, None) => {}
    }

    Ok(())
}
