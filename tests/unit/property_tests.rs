//! Property tests over arbitrary command sequences on a fresh engine.

use crate::test_helpers::{btc_usd, standard_fees};
use matchbook_rs::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    New {
        buy: bool,
        kind: u8,
        price: u128,
        quantity: u64,
    },
    Cancel {
        pick: usize,
    },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (any::<bool>(), 0u8..4, 9_900u128..10_100, 1u64..30).prop_map(
            |(buy, kind, price, quantity)| Step::New {
                buy,
                kind,
                price,
                quantity,
            }
        ),
        1 => (0usize..64).prop_map(|pick| Step::Cancel { pick }),
    ]
}

fn request_for(buy: bool, kind: u8, price: u128, quantity: u64) -> NewOrderRequest {
    let side = if buy { Side::Buy } else { Side::Sell };
    match kind % 4 {
        0 => NewOrderRequest::limit(side, price, quantity),
        1 => NewOrderRequest::market(side, quantity),
        2 => NewOrderRequest::ioc(side, price, quantity),
        _ => NewOrderRequest::fok(side, price, quantity),
    }
}

/// A core with periodic snapshots disabled and a queue deep enough that
/// the all-channels probe subscriber is never dropped.
fn probe_core() -> SymbolCore {
    let sequencer_config = SequencerConfig {
        subscriber_queue_capacity: 1 << 16,
        snapshot_interval: 0,
    };
    SymbolCore::with_sequencer_config(btc_usd(), standard_fees(), sequencer_config)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_over_arbitrary_command_sequences(
        steps in proptest::collection::vec(step_strategy(), 1..80)
    ) {
        let mut core = probe_core();
        let probe = core.subscribe(ChannelMask::ALL);

        let mut submitted: Vec<(OrderId, Side, Option<u128>)> = Vec::new();
        let mut total_acked_executed = 0u64;

        for step in steps {
            let before = core.snapshot(usize::MAX);

            match step {
                Step::New { buy, kind, price, quantity } => {
                    let request = request_for(buy, kind, price, quantity);
                    let side = request.side;
                    let limit = request.price;
                    let reply = core.apply(Command::NewOrder(request));

                    match reply {
                        CommandReply::OrderAccepted { order_id, executed, .. } => {
                            total_acked_executed += executed;
                            submitted.push((order_id, side, limit));
                        }
                        CommandReply::Rejected { reason } => {
                            // Only FOK shortfalls reject here; the book
                            // must be byte-identical to its prior state.
                            let is_insufficient_liquidity = matches!(
                                reason,
                                EngineError::InsufficientLiquidity { .. }
                            );
                            prop_assert!(is_insufficient_liquidity);
                            let after = core.snapshot(usize::MAX);
                            prop_assert_eq!(&before.bids, &after.bids);
                            prop_assert_eq!(&before.asks, &after.asks);
                            prop_assert_eq!(before.last_seq, after.last_seq);
                        }
                        other => prop_assert!(false, "unexpected reply {:?}", other),
                    }
                }
                Step::Cancel { pick } => {
                    if submitted.is_empty() {
                        continue;
                    }
                    let (order_id, _, _) = submitted[pick % submitted.len()];
                    let reply = core.apply(Command::Cancel { order_id });
                    let is_cancelled_or_rejected = matches!(
                        reply,
                        CommandReply::Cancelled { .. } | CommandReply::Rejected { .. }
                    );
                    prop_assert!(is_cancelled_or_rejected);
                }
            }

            // Invariant: the book is never crossed after a command.
            prop_assert!(!core.book().is_crossed());

            // Invariant: every indexed order is live, on the side and at
            // the price it was submitted with.
            for (order_id, side, limit) in &submitted {
                if core.book().contains_order(*order_id) {
                    let order = core.book().order(*order_id).expect("indexed order resolves");
                    prop_assert!(order.remaining > 0);
                    prop_assert_eq!(order.side, *side);
                    prop_assert_eq!(order.price, *limit);
                    let location = core.book().order_location(*order_id).expect("indexed");
                    prop_assert_eq!(Some(location.0), *limit);
                    prop_assert_eq!(location.1, *side);
                }
            }
        }

        let events: Vec<MarketDataEvent> = probe.receiver.try_iter().collect();

        // Invariant: sequence numbers are strictly increasing and
        // gap-free across the whole event stream. The subscribe-time
        // snapshot seed carries the pre-existing position and is not a
        // sequenced event of its own.
        let seqs: Vec<u64> = events
            .iter()
            .filter(|event| !matches!(event, MarketDataEvent::Snapshot(_)))
            .map(MarketDataEvent::seq)
            .collect();
        for (position, seq) in seqs.iter().enumerate() {
            prop_assert_eq!(*seq, position as u64 + 1);
        }

        // Invariant: conservation — every acked executed unit appears as
        // exactly one trade print, and vice versa.
        let mut total_traded = 0u64;
        let mut last_trade_id = 0u64;
        for event in &events {
            if let MarketDataEvent::Trade(trade) = event {
                total_traded += trade.quantity;
                prop_assert_eq!(trade.trade_id, last_trade_id + 1);
                last_trade_id = trade.trade_id;

                // Invariant: no trade-through — the print respects the
                // taker's limit, if any.
                let taker = submitted
                    .iter()
                    .find(|(order_id, _, _)| *order_id == trade.taker_order_id);
                if let Some((_, side, Some(limit))) = taker {
                    match side {
                        Side::Buy => prop_assert!(trade.price <= *limit),
                        Side::Sell => prop_assert!(trade.price >= *limit),
                    }
                }
            }
        }
        prop_assert_eq!(total_traded, total_acked_executed);
    }

    #[test]
    fn fifo_priority_within_a_price_level(
        quantities in proptest::collection::vec(1u64..100, 2..10)
    ) {
        let mut core = probe_core();
        let probe = core.subscribe(ChannelMask::TRADES);

        let mut makers = Vec::new();
        let mut total = 0u64;
        for quantity in &quantities {
            total += quantity;
            let reply = core.apply(Command::NewOrder(NewOrderRequest::limit(
                Side::Sell,
                10_000,
                *quantity,
            )));
            let CommandReply::OrderAccepted { order_id, .. } = reply else {
                panic!("maker rejected");
            };
            makers.push(order_id);
        }

        core.apply(Command::NewOrder(NewOrderRequest::market(Side::Buy, total)));

        // Makers must be consumed in submission order, exactly once each.
        let taken: Vec<OrderId> = probe
            .receiver
            .try_iter()
            .filter_map(|event| match event {
                MarketDataEvent::Trade(trade) => Some(trade.maker_order_id),
                _ => None,
            })
            .collect();
        prop_assert_eq!(taken, makers);
        prop_assert!(core.book().is_empty());
    }
}
