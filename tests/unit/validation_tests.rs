//! Admission validation through the full command path.

use crate::test_helpers::*;
use matchbook_rs::prelude::*;

fn reject_message(core: &mut SymbolCore, request: NewOrderRequest) -> String {
    match core.apply(Command::NewOrder(request)) {
        CommandReply::Rejected {
            reason: EngineError::MalformedOrder { message },
        } => message,
        other => panic!("expected MalformedOrder, got {other:?}"),
    }
}

#[test]
fn test_tick_and_lot_enforcement() {
    // Tick 0.05, lot 0.010 in scaled units.
    let config = SymbolConfig::new("BTC/USD", 2, 3, 5, 10, "USD");
    let mut core = SymbolCore::new(config, standard_fees());

    let message = reject_message(
        &mut core,
        NewOrderRequest::limit(Side::Buy, 9_999, 100),
    );
    assert!(message.contains("tick size"));

    let message = reject_message(
        &mut core,
        NewOrderRequest::limit(Side::Buy, 10_000, 105),
    );
    assert!(message.contains("lot size"));

    // Conforming price and quantity pass.
    accept(&mut core, NewOrderRequest::limit(Side::Buy, 10_000, 100));
}

#[test]
fn test_price_presence_rules() {
    let mut core = core();

    let mut market_with_price = NewOrderRequest::market(Side::Buy, qty("1.000"));
    market_with_price.price = Some(price("100.00"));
    let message = reject_message(&mut core, market_with_price);
    assert!(message.contains("must not carry a price"));

    let mut limit_without_price = NewOrderRequest::limit(Side::Buy, price("100.00"), qty("1.000"));
    limit_without_price.price = None;
    let message = reject_message(&mut core, limit_without_price);
    assert!(message.contains("requires a limit price"));
}

#[test]
fn test_non_positive_values_rejected() {
    let mut core = core();

    let message = reject_message(&mut core, NewOrderRequest::limit(Side::Buy, price("99.00"), 0));
    assert!(message.contains("quantity must be positive"));

    let message = reject_message(&mut core, NewOrderRequest::limit(Side::Buy, 0, qty("1.000")));
    assert!(message.contains("price must be positive"));
}

#[test]
fn test_rejected_orders_leave_no_trace() {
    let mut core = core();
    let probe = core.subscribe(ChannelMask::ALL);

    reject_message(&mut core, NewOrderRequest::limit(Side::Buy, price("99.00"), 0));

    // No events, no sequence movement, no book change.
    assert!(drain(&probe)
        .iter()
        .all(|event| matches!(event, MarketDataEvent::Snapshot(_))));
    assert_eq!(core.last_seq(), 0);
    assert!(core.book().is_empty());
}

#[test]
fn test_client_order_id_is_echoed() {
    let mut core = core();
    let reply = core.apply(Command::NewOrder(
        NewOrderRequest::limit(Side::Buy, price("99.00"), qty("1.000"))
            .with_client_order_id("client-42"),
    ));
    let CommandReply::OrderAccepted {
        client_order_id, ..
    } = reply
    else {
        panic!("expected acceptance");
    };
    assert_eq!(client_order_id.as_deref(), Some("client-42"));
}
