//! Market-data fanout behavior: channel filtering, BBO edge triggering,
//! slow-subscriber eviction, and periodic snapshots.

use crate::test_helpers::*;
use matchbook_rs::prelude::*;

#[test]
fn test_bbo_emitted_only_on_top_of_book_change() {
    let mut core = core();
    let bbo_sub = core.subscribe(ChannelMask::BBO);

    // New best ask → BBO event.
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    assert_eq!(drain(&bbo_sub).len(), 1);

    // New best bid → BBO event.
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("99.00"), qty("1.000")),
    );
    assert_eq!(drain(&bbo_sub).len(), 1);

    // A deeper bid leaves the top untouched → no BBO event.
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("98.00"), qty("1.000")),
    );
    assert!(drain(&bbo_sub).is_empty());

    // More quantity at the best bid changes the aggregate → BBO event.
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("99.00"), qty("0.500")),
    );
    let events = drain(&bbo_sub);
    assert_eq!(events.len(), 1);
    let MarketDataEvent::Bbo(update) = &events[0] else {
        panic!("expected a BBO update");
    };
    assert_eq!(update.bbo.bid, Some((price("99.00"), qty("1.500"))));
    assert_eq!(update.bbo.spread(), Some(price("1.00")));
}

#[test]
fn test_channels_are_isolated() {
    let mut core = core();
    let trades = core.subscribe(ChannelMask::TRADES);
    let books = core.subscribe(ChannelMask::ORDERBOOK);

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("100.00"), qty("1.000")),
    );

    let trade_events = drain(&trades);
    assert_eq!(trade_events.len(), 1);
    assert!(matches!(trade_events[0], MarketDataEvent::Trade(_)));

    let book_events = drain(&books);
    // Snapshot seed plus one delta per command.
    assert!(matches!(book_events[0], MarketDataEvent::Snapshot(_)));
    assert!(book_events[1..]
        .iter()
        .all(|event| matches!(event, MarketDataEvent::Delta(_))));
    assert_eq!(book_events.len(), 3);
}

#[test]
fn test_slow_subscriber_is_dropped_not_blocking() {
    let sequencer_config = SequencerConfig {
        subscriber_queue_capacity: 2,
        snapshot_interval: 0,
    };
    let mut core = SymbolCore::with_sequencer_config(btc_usd(), standard_fees(), sequencer_config);
    let slow = core.subscribe(ChannelMask::ORDERBOOK);

    // Each resting order produces one delta; the third overflows the
    // snapshot-seeded queue and evicts the subscriber.
    for step in 0..5u64 {
        accept(
            &mut core,
            NewOrderRequest::limit(Side::Buy, price("99.00") - step as u128, qty("1.000")),
        );
    }

    // The engine kept running; the subscriber got a clean prefix then a
    // disconnect.
    assert_eq!(core.book().level_count(Side::Buy), 5);
    let received = drain(&slow);
    assert!(received.len() <= 2);
    assert!(slow.receiver.recv().is_err());
}

#[test]
fn test_periodic_snapshots_on_orderbook_channel() {
    let sequencer_config = SequencerConfig {
        subscriber_queue_capacity: 64,
        snapshot_interval: 2,
    };
    let mut core = SymbolCore::with_sequencer_config(btc_usd(), standard_fees(), sequencer_config);
    let books = core.subscribe(ChannelMask::ORDERBOOK);

    for step in 0..4u64 {
        accept(
            &mut core,
            NewOrderRequest::limit(Side::Buy, price("99.00") - step as u128, qty("1.000")),
        );
    }

    let events = drain(&books);
    let snapshots: Vec<&MarketDataEvent> = events
        .iter()
        .filter(|event| matches!(event, MarketDataEvent::Snapshot(_)))
        .collect();
    // Seed snapshot plus one every two deltas.
    assert_eq!(snapshots.len(), 3);

    // Periodic snapshots reflect the sequencer position at emission.
    let MarketDataEvent::Snapshot(last) = snapshots[2] else {
        unreachable!();
    };
    assert_eq!(last.last_seq, core.last_seq());
}

#[test]
fn test_subscription_after_activity_sees_only_later_events() {
    let mut core = core();
    accept(
        &mut core,
        NewOrderRequest::limit(Side::Sell, price("100.00"), qty("1.000")),
    );

    let trades = core.subscribe(ChannelMask::TRADES);
    assert!(drain(&trades).is_empty());

    accept(
        &mut core,
        NewOrderRequest::limit(Side::Buy, price("100.00"), qty("1.000")),
    );
    assert_eq!(drain(&trades).len(), 1);
}
