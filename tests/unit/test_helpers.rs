//! Shared helpers for the integration test suite.

use matchbook_rs::prelude::*;

/// The reference symbol: tick 0.01 (price scale 2), lot 0.001 (quantity
/// scale 3), fees in USD.
pub fn btc_usd() -> SymbolConfig {
    SymbolConfig::new("BTC/USD", 2, 3, 1, 1, "USD")
}

/// Maker 10 bps (0.0010), taker 20 bps (0.0020).
pub fn standard_fees() -> FeeSchedule {
    FeeSchedule::new(10, 20, "USD")
}

pub fn core() -> SymbolCore {
    SymbolCore::new(btc_usd(), standard_fees())
}

/// Parses a decimal price string into scaled units, e.g. `"100.00"`.
pub fn price(input: &str) -> u128 {
    btc_usd().parse_price(input).expect("valid test price")
}

/// Parses a decimal quantity string into scaled units, e.g. `"1.000"`.
pub fn qty(input: &str) -> u64 {
    btc_usd().parse_qty(input).expect("valid test quantity")
}

/// Submits a request that must pass admission, returning the assigned id,
/// final status, and executed quantity.
pub fn accept(core: &mut SymbolCore, request: NewOrderRequest) -> (OrderId, OrderStatus, u64) {
    match core.apply(Command::NewOrder(request)) {
        CommandReply::OrderAccepted {
            order_id,
            status,
            executed,
            ..
        } => (order_id, status, executed),
        other => panic!("expected acceptance, got {other:?}"),
    }
}

/// Drains every event currently queued on a subscription.
pub fn drain(subscription: &Subscription) -> Vec<MarketDataEvent> {
    subscription.receiver.try_iter().collect()
}

/// The trades among a batch of drained events.
pub fn trades_of(events: &[MarketDataEvent]) -> Vec<Trade> {
    events
        .iter()
        .filter_map(|event| match event {
            MarketDataEvent::Trade(trade) => Some(trade.clone()),
            _ => None,
        })
        .collect()
}
