//! End-to-end matching scenarios on the BTC/USD reference symbol.

use crate::test_helpers::*;
use matchbook_rs::prelude::*;

#[test]
fn test_simple_cross_empties_book() {
    let mut core = core();
    let bbo_sub = core.subscribe(ChannelMask::BBO);
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    let (sell_id, sell_status, _) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    assert_eq!(sell_status, OrderStatus::New);

    // BBO goes from empty to (∅, 100.00).
    let events = drain(&bbo_sub);
    assert_eq!(events.len(), 1);
    let MarketDataEvent::Bbo(update) = &events[0] else {
        panic!("expected a BBO update");
    };
    assert_eq!(update.bbo.bid, None);
    assert_eq!(update.bbo.ask, Some((price("100.00"), qty("1.000"))));

    let (buy_id, buy_status, executed) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("100.00"), qty("1.000")),
    );
    assert_eq!(buy_status, OrderStatus::Filled);
    assert_eq!(executed, qty("1.000"));

    let trades = trades_of(&drain(&trade_sub));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, price("100.00"));
    assert_eq!(trades[0].quantity, qty("1.000"));
    assert_eq!(trades[0].maker_order_id, sell_id);
    assert_eq!(trades[0].taker_order_id, buy_id);
    assert_eq!(trades[0].aggressor_side, Side::Buy);

    // BBO goes back to (∅, ∅) and the book is empty.
    let events = drain(&bbo_sub);
    assert_eq!(events.len(), 1);
    let MarketDataEvent::Bbo(update) = &events[0] else {
        panic!("expected a BBO update");
    };
    assert_eq!(update.bbo, Bbo::default());
    assert!(core.book().is_empty());
}

#[test]
fn test_price_time_priority_across_equal_prices() {
    let mut core = core();
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    let (a_id, _, _) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    let (b_id, _, _) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );

    let (_, status, executed) = accept(
        &mut core,
        NewOrderRequest::market(Side::Buy, qty("1.500")),
    );
    assert_eq!(status, OrderStatus::Filled);
    assert_eq!(executed, qty("1.500"));

    let trades = trades_of(&drain(&trade_sub));
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].maker_order_id, a_id);
    assert_eq!(trades[0].quantity, qty("1.000"));
    assert_eq!(trades[1].maker_order_id, b_id);
    assert_eq!(trades[1].quantity, qty("0.500"));

    // B remains with 0.500.
    let resting = core.book().order(b_id).expect("B still rests");
    assert_eq!(resting.remaining, qty("0.500"));
    assert_eq!(resting.status, OrderStatus::PartiallyFilled);
}

#[test]
fn test_price_improvement_accrues_to_taker() {
    let mut core = core();
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("99.50"), qty("2.000")),
    );
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("3.000")),
    );

    let (_, status, executed) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("100.50"), qty("1.000")),
    );
    assert_eq!(status, OrderStatus::Filled);
    assert_eq!(executed, qty("1.000"));

    let trades = trades_of(&drain(&trade_sub));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, price("99.50"));
    assert_eq!(trades[0].quantity, qty("1.000"));
}

#[test]
fn test_fok_rejects_without_touching_the_book() {
    let mut core = core();
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    let before = core.snapshot(usize::MAX);

    let reply = core.apply(Command::NewOrder(NewOrderRequest::fok(
        Side::Buy,
        price("100.00"),
        qty("2.000"),
    )));
    let CommandReply::Rejected { reason } = reply else {
        panic!("expected a reject");
    };
    assert_eq!(
        reason,
        EngineError::InsufficientLiquidity {
            side: Side::Buy,
            requested: qty("2.000"),
            available: qty("1.000"),
        }
    );

    let after = core.snapshot(usize::MAX);
    assert_eq!(before.bids, after.bids);
    assert_eq!(before.asks, after.asks);
    assert_eq!(before.last_seq, after.last_seq);
    assert!(trades_of(&drain(&trade_sub)).is_empty());
}

#[test]
fn test_ioc_partial_fill_cancels_residual() {
    let mut core = core();
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );

    let (ioc_id, status, executed) = accept(
        &mut core,
        NewOrderRequest::ioc(Side::Buy, price("100.00"), qty("3.000")),
    );
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(executed, qty("1.000"));
    assert!(!core.book().contains_order(ioc_id));

    let trades = trades_of(&drain(&trade_sub));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity, qty("1.000"));
    assert_eq!(trades[0].price, price("100.00"));
    assert!(core.book().is_empty());
}

#[test]
fn test_cancel_resting_then_cancel_again() {
    let mut core = core();
    let book_sub = core.subscribe(ChannelMask::ORDERBOOK);

    let (order_id, _, _) = accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("99.00"), qty("1.000")),
    );
    drain(&book_sub);

    let reply = core.apply(Command::Cancel { order_id });
    let CommandReply::Cancelled {
        order_id: cancelled, ..
    } = reply
    else {
        panic!("expected a cancel ack");
    };
    assert_eq!(cancelled, order_id);

    // The delta removes level 99.00.
    let events = drain(&book_sub);
    let MarketDataEvent::Delta(delta) = &events[0] else {
        panic!("expected a book delta");
    };
    assert_eq!(
        delta.changes,
        vec![LevelUpdate {
            side: Side::Buy,
            price: price("99.00"),
            total_quantity: 0,
        }]
    );

    // A second cancel reports the order as already terminal.
    let reply = core.apply(Command::Cancel { order_id });
    assert_eq!(
        reply,
        CommandReply::Rejected {
            reason: EngineError::AlreadyTerminal {
                order_id,
                status: OrderStatus::Cancelled,
            }
        }
    );

    // A cancel for an id never seen is unknown.
    let unknown = OrderId::new();
    assert_eq!(
        core.apply(Command::Cancel { order_id: unknown }),
        CommandReply::Rejected {
            reason: EngineError::UnknownOrder { order_id: unknown }
        }
    );
}

#[test]
fn test_market_order_with_no_liquidity() {
    let mut core = core();

    let reply = core.apply(Command::NewOrder(NewOrderRequest::market(
        Side::Buy,
        qty("1.000"),
    )));
    let CommandReply::OrderAccepted {
        status,
        executed,
        reason,
        ..
    } = reply
    else {
        panic!("expected an ack with terminal status");
    };
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(executed, 0);
    assert_eq!(reason, Some(EngineError::NoLiquidity { side: Side::Buy }));
}

#[test]
fn test_market_partial_fill_reports_no_liquidity() {
    let mut core = core();
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );

    let reply = core.apply(Command::NewOrder(NewOrderRequest::market(
        Side::Buy,
        qty("2.000"),
    )));
    let CommandReply::OrderAccepted {
        status,
        executed,
        reason,
        ..
    } = reply
    else {
        panic!("expected an ack");
    };
    // The fill is real; the residual was cancelled against an empty side.
    assert_eq!(status, OrderStatus::Filled);
    assert_eq!(executed, qty("1.000"));
    assert_eq!(reason, Some(EngineError::NoLiquidity { side: Side::Buy }));
}

#[test]
fn test_trades_carry_fee_rates_and_currency() {
    let mut core = core();
    let trade_sub = core.subscribe(ChannelMask::TRADES);

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("100.00"), qty("1.000")),
    );

    let trades = trades_of(&drain(&trade_sub));
    assert_eq!(trades[0].maker_fee_bps, 10);
    assert_eq!(trades[0].taker_fee_bps, 20);
    assert_eq!(trades[0].fee_currency, "USD");
    assert_eq!(trades[0].trade_id, 1);
}
