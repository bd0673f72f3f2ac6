//! Event sequencing and market-data fanout.
//!
//! The sequencer assigns a per-symbol strictly increasing sequence number
//! to every emitted event and a separate monotonic trade id to trades, then
//! fans events out to per-subscriber bounded queues. A subscriber that
//! cannot keep up is dropped rather than ever blocking the engine.

use crate::engine::events::MarketDataEvent;
use crate::engine::snapshot::BookSnapshot;
use bitflags::bitflags;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::Mutex;
use tracing::{trace, warn};
use uuid::Uuid;

bitflags! {
    /// Logical market-data channels a subscriber can attach to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u8 {
        /// Book deltas and full snapshots.
        const ORDERBOOK = 1 << 0;

        /// Trade prints.
        const TRADES = 1 << 1;

        /// Top-of-book changes.
        const BBO = 1 << 2;

        /// All channels.
        const ALL = Self::ORDERBOOK.bits() | Self::TRADES.bits() | Self::BBO.bits();
    }
}

/// Tuning knobs for the sequencer fanout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Capacity of each subscriber's bounded queue; overflow drops the
    /// subscriber.
    pub subscriber_queue_capacity: usize,

    /// Emit a full book snapshot on the orderbook channel every this many
    /// deltas; zero disables periodic snapshots.
    pub snapshot_interval: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: 1_024,
            snapshot_interval: 256,
        }
    }
}

/// A live market-data subscription.
///
/// Events arrive on `receiver` in sequence order. The stream ends (the
/// channel disconnects) when the subscriber falls behind and is dropped or
/// the engine shuts down.
#[derive(Debug)]
pub struct Subscription {
    /// Unique subscriber identifier.
    pub id: Uuid,
    /// The channels this subscription covers.
    pub channels: ChannelMask,
    /// The event stream.
    pub receiver: Receiver<MarketDataEvent>,
}

#[derive(Debug)]
struct SubscriberSlot {
    id: Uuid,
    channels: ChannelMask,
    sender: Sender<MarketDataEvent>,
}

/// Per-symbol event sequencer and fanout hub.
///
/// Owned by a symbol engine; sequence numbers and trade ids are assigned
/// on the single-writer path while the subscriber registry sits behind a
/// short lock taken only by the sequencer itself.
#[derive(Debug)]
pub struct EventSequencer {
    symbol: String,
    next_seq: u64,
    next_trade_id: u64,
    deltas_since_snapshot: u64,
    config: SequencerConfig,
    subscribers: Mutex<Vec<SubscriberSlot>>,
}

impl EventSequencer {
    /// Creates a sequencer for `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, config: SequencerConfig) -> Self {
        Self {
            symbol: symbol.into(),
            next_seq: 1,
            next_trade_id: 1,
            deltas_since_snapshot: 0,
            config,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Sequence number of the most recently assigned event, zero before
    /// the first event.
    #[must_use]
    #[inline]
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("registry lock poisoned").len()
    }

    /// Assigns the next event sequence number.
    pub(crate) fn assign_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Assigns the next trade id.
    pub(crate) fn assign_trade_id(&mut self) -> u64 {
        let trade_id = self.next_trade_id;
        self.next_trade_id += 1;
        trade_id
    }

    /// Counts one published delta; returns `true` when a periodic full
    /// snapshot is due on the orderbook channel.
    pub(crate) fn register_delta(&mut self) -> bool {
        if self.config.snapshot_interval == 0 {
            return false;
        }
        self.deltas_since_snapshot += 1;
        if self.deltas_since_snapshot >= self.config.snapshot_interval {
            self.deltas_since_snapshot = 0;
            return true;
        }
        false
    }

    /// Registers a subscriber for the given channels.
    ///
    /// When `snapshot` is provided and the subscription covers the
    /// orderbook channel, the snapshot is delivered as the first event,
    /// atomically with registration, so no delta can fall between the
    /// snapshot and the delta stream.
    pub fn subscribe(
        &self,
        channels: ChannelMask,
        snapshot: Option<BookSnapshot>,
    ) -> Subscription {
        let (sender, receiver) = channel::bounded(self.config.subscriber_queue_capacity);
        let id = Uuid::new_v4();

        let mut registry = self.subscribers.lock().expect("registry lock poisoned");
        if channels.contains(ChannelMask::ORDERBOOK)
            && let Some(snapshot) = snapshot
        {
            // The queue is freshly created and cannot be full here.
            let _ = sender.try_send(MarketDataEvent::Snapshot(snapshot));
        }
        registry.push(SubscriberSlot {
            id,
            channels,
            sender,
        });
        trace!("subscriber {} attached to {} ({:?})", id, self.symbol, channels);

        Subscription {
            id,
            channels,
            receiver,
        }
    }

    /// Fans a command's event batch out to all subscribers.
    ///
    /// The registry lock is held across the whole batch so every
    /// subscriber observes the batch contiguously. A full or disconnected
    /// queue drops its subscriber.
    pub(crate) fn publish_batch(&self, events: &[MarketDataEvent]) {
        if events.is_empty() {
            return;
        }

        let mut registry = self.subscribers.lock().expect("registry lock poisoned");
        registry.retain(|slot| {
            for event in events {
                if !slot.channels.intersects(Self::channel_of(event)) {
                    continue;
                }
                match slot.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            "dropping slow subscriber {} on {} at seq {}",
                            slot.id,
                            self.symbol,
                            event.seq()
                        );
                        return false;
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        trace!("subscriber {} on {} disconnected", slot.id, self.symbol);
                        return false;
                    }
                }
            }
            true
        });
    }

    fn channel_of(event: &MarketDataEvent) -> ChannelMask {
        match event {
            MarketDataEvent::Trade(_) => ChannelMask::TRADES,
            MarketDataEvent::Delta(_) | MarketDataEvent::Snapshot(_) => ChannelMask::ORDERBOOK,
            MarketDataEvent::Bbo(_) => ChannelMask::BBO,
        }
    }
}
