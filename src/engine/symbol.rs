//! The per-symbol engine: a single logical writer owning one order book,
//! serializing commands and emitting sequenced events.
//!
//! [`SymbolCore`] is the synchronous heart — admission, matching, event
//! building, journaling. [`SymbolEngine`] wraps a core in a dedicated Tokio
//! task behind a bounded inbox, making the single-writer discipline a
//! structural property rather than a convention.

use crate::engine::admission::{self, NewOrderRequest};
use crate::engine::book::OrderBook;
use crate::engine::error::EngineError;
use crate::engine::events::{BboUpdate, BookDelta, MarketDataEvent, Trade};
use crate::engine::fees::{FeeSchedule, LiquidityRole};
use crate::engine::matching::LevelUpdate;
use crate::engine::replay::{CommandRecord, Journal, JournaledOp};
use crate::engine::sequencer::{ChannelMask, EventSequencer, SequencerConfig, Subscription};
use crate::engine::snapshot::BookSnapshot;
use crate::engine::types::{Bbo, Order, OrderId, OrderStatus, SymbolConfig};
use crate::utils::monotonic_nanos;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Depth used for subscription-seeding and periodic snapshots.
const FULL_DEPTH: usize = usize::MAX;

/// A command submitted to a symbol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a new order for matching.
    NewOrder(NewOrderRequest),

    /// Cancel a resting order by id.
    Cancel {
        /// The order to cancel.
        order_id: OrderId,
    },

    /// Read an immutable depth snapshot; never mutates state.
    Query {
        /// Number of levels per side to include.
        depth: usize,
    },
}

/// The engine's answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// A new order passed admission and was processed.
    OrderAccepted {
        /// The engine-assigned order id.
        order_id: OrderId,
        /// The client id echoed back, if one was supplied.
        client_order_id: Option<String>,
        /// Order status after the matching cycle.
        status: OrderStatus,
        /// Quantity executed during the cycle.
        executed: u64,
        /// The sequencer position after the command's events.
        accepted_seq: u64,
        /// Set when a market order ran out of opposing liquidity; any
        /// fills reported in `executed` are real.
        reason: Option<EngineError>,
    },

    /// A resting order was cancelled.
    Cancelled {
        /// The cancelled order id.
        order_id: OrderId,
        /// The sequencer position after the cancel's events.
        cancelled_seq: u64,
    },

    /// Snapshot answer to a query.
    Snapshot(BookSnapshot),

    /// The command was refused; state is unchanged.
    Rejected {
        /// Why the command was refused.
        reason: EngineError,
    },
}

impl CommandReply {
    /// Whether this reply is a rejection.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandReply::Rejected { .. })
    }
}

/// Single-writer state for one symbol: book, sequencer, fee schedule, and
/// the terminal-status memory behind cancel semantics.
pub struct SymbolCore {
    config: SymbolConfig,
    fees: FeeSchedule,
    book: OrderBook,
    sequencer: EventSequencer,
    next_submission_seq: u64,
    next_command_seq: u64,
    terminal: HashMap<OrderId, OrderStatus>,
    journal: Option<Arc<dyn Journal>>,
}

impl SymbolCore {
    /// Creates a core with the default sequencer configuration.
    #[must_use]
    pub fn new(config: SymbolConfig, fees: FeeSchedule) -> Self {
        Self::with_sequencer_config(config, fees, SequencerConfig::default())
    }

    /// Creates a core with an explicit sequencer configuration.
    #[must_use]
    pub fn with_sequencer_config(
        config: SymbolConfig,
        fees: FeeSchedule,
        sequencer_config: SequencerConfig,
    ) -> Self {
        let book = OrderBook::new(config.symbol.clone());
        let sequencer = EventSequencer::new(config.symbol.clone(), sequencer_config);
        Self {
            config,
            fees,
            book,
            sequencer,
            next_submission_seq: 1,
            next_command_seq: 1,
            terminal: HashMap::new(),
            journal: None,
        }
    }

    /// Attaches a journal; every subsequent state-mutating command is
    /// appended after execution.
    pub fn set_journal(&mut self, journal: Arc<dyn Journal>) {
        self.journal = Some(journal);
    }

    /// The symbol configuration.
    #[must_use]
    pub fn config(&self) -> &SymbolConfig {
        &self.config
    }

    /// The fee schedule snapshotted into this core.
    #[must_use]
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Read access to the book, e.g. for invariant checks in tests.
    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// The sequencer position after the most recent event.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.sequencer.last_seq()
    }

    /// Applies one command, returning its reply. Events for the command
    /// are published to subscribers as one atomic batch before the reply
    /// is produced.
    pub fn apply(&mut self, command: Command) -> CommandReply {
        match command {
            Command::NewOrder(request) => self.apply_new_order(OrderId::new(), request, true),
            Command::Cancel { order_id } => self.apply_cancel(order_id, true),
            Command::Query { depth } => CommandReply::Snapshot(self.snapshot(depth)),
        }
    }

    /// Reconstructs state by re-applying journaled commands in order.
    ///
    /// Replay reuses the recorded order ids and runs the exact command
    /// path with journaling and fanout suppressed, so a replayed core is
    /// indistinguishable from the original: same book, same sequence
    /// numbers, same trade ids — and no subscriber observes the rebuild.
    pub fn replay<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = CommandRecord>,
    {
        for record in records {
            match record.op {
                JournaledOp::NewOrder { order_id, request } => {
                    self.apply_new_order(order_id, request, false);
                }
                JournaledOp::Cancel { order_id } => {
                    self.apply_cancel(order_id, false);
                }
            }
            self.next_command_seq = record.seq + 1;
        }
    }

    /// Registers a market-data subscriber.
    ///
    /// Orderbook subscriptions are seeded with a full snapshot carrying
    /// the current last sequence, delivered atomically with registration.
    pub fn subscribe(&self, channels: ChannelMask) -> Subscription {
        let snapshot = channels
            .contains(ChannelMask::ORDERBOOK)
            .then(|| self.snapshot(FULL_DEPTH));
        self.sequencer.subscribe(channels, snapshot)
    }

    /// An immutable snapshot of the top `depth` levels per side.
    #[must_use]
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let (bids, asks) = self.book.depth(depth);
        BookSnapshot {
            symbol: self.config.symbol.clone(),
            timestamp_ns: monotonic_nanos(),
            last_seq: self.sequencer.last_seq(),
            bids,
            asks,
            bbo: self.book.bbo(),
        }
    }

    /// `live` is `false` during replay: sequence, trade-id, and snapshot
    /// counters still advance so the rebuilt positions match the original
    /// run, but nothing reaches subscribers or the journal.
    fn apply_new_order(
        &mut self,
        order_id: OrderId,
        request: NewOrderRequest,
        live: bool,
    ) -> CommandReply {
        if let Err(reason) = admission::validate(&self.config, &request) {
            return CommandReply::Rejected { reason };
        }

        let client_order_id = request.client_order_id.clone();
        let submission_seq = self.next_submission_seq;
        self.next_submission_seq += 1;

        let order = Order {
            id: order_id,
            side: request.side,
            kind: request.kind,
            price: request.price,
            quantity: request.quantity,
            remaining: request.quantity,
            submission_seq,
            status: OrderStatus::New,
        };
        let bbo_before = self.book.bbo();

        let execution = match self.book.execute(order) {
            Ok(execution) => execution,
            Err(reason) => {
                // Fill-or-kill feasibility failure: the book is untouched
                // and no events are emitted, but the order id is
                // remembered as terminal.
                self.terminal.insert(order_id, OrderStatus::Rejected);
                if live {
                    self.journal_record(JournaledOp::NewOrder { order_id, request });
                }
                return CommandReply::Rejected { reason };
            }
        };

        let timestamp_ns = monotonic_nanos();
        let mut events: Vec<MarketDataEvent> = Vec::new();

        for fill in &execution.fills {
            let trade_id = self.sequencer.assign_trade_id();
            let seq = self.sequencer.assign_seq();
            events.push(MarketDataEvent::Trade(Trade {
                symbol: self.config.symbol.clone(),
                trade_id,
                price: fill.price,
                quantity: fill.quantity,
                maker_order_id: fill.maker_order_id,
                taker_order_id: order_id,
                aggressor_side: execution.taker.side,
                maker_fee_bps: self.fees.rate_for(LiquidityRole::Maker),
                taker_fee_bps: self.fees.rate_for(LiquidityRole::Taker),
                fee_currency: self.fees.fee_currency.clone(),
                timestamp_ns,
                seq,
            }));
            if fill.maker_remaining == 0 {
                self.terminal.insert(fill.maker_order_id, OrderStatus::Filled);
            }
        }

        let book_changed = !execution.level_updates.is_empty();
        if book_changed {
            let seq = self.sequencer.assign_seq();
            events.push(MarketDataEvent::Delta(BookDelta {
                symbol: self.config.symbol.clone(),
                changes: execution.level_updates.clone(),
                timestamp_ns,
                seq,
            }));
        }
        self.push_bbo_event(bbo_before, timestamp_ns, &mut events);
        if book_changed && self.sequencer.register_delta() {
            events.push(MarketDataEvent::Snapshot(self.snapshot(FULL_DEPTH)));
        }

        if live {
            self.sequencer.publish_batch(&events);
        }
        self.halt_if_crossed();

        if execution.taker.status.is_terminal() {
            self.terminal.insert(order_id, execution.taker.status);
        }
        if live {
            self.journal_record(JournaledOp::NewOrder { order_id, request });
        }

        let reason = execution.no_liquidity.then(|| EngineError::NoLiquidity {
            side: execution.taker.side,
        });
        CommandReply::OrderAccepted {
            order_id,
            client_order_id,
            status: execution.taker.status,
            executed: execution.executed(),
            accepted_seq: self.sequencer.last_seq(),
            reason,
        }
    }

    fn apply_cancel(&mut self, order_id: OrderId, live: bool) -> CommandReply {
        let Some((price, side)) = self.book.order_location(order_id) else {
            let reason = match self.terminal.get(&order_id) {
                Some(status) => EngineError::AlreadyTerminal {
                    order_id,
                    status: *status,
                },
                None => EngineError::UnknownOrder { order_id },
            };
            return CommandReply::Rejected { reason };
        };

        let bbo_before = self.book.bbo();
        self.book
            .remove_order(order_id)
            .expect("order index entry was just observed");
        let total_quantity = self
            .book
            .side_levels(side)
            .get(&price)
            .map(|level| level.total_quantity())
            .unwrap_or(0);

        let timestamp_ns = monotonic_nanos();
        let mut events = vec![MarketDataEvent::Delta(BookDelta {
            symbol: self.config.symbol.clone(),
            changes: vec![LevelUpdate {
                side,
                price,
                total_quantity,
            }],
            timestamp_ns,
            seq: self.sequencer.assign_seq(),
        })];
        self.push_bbo_event(bbo_before, timestamp_ns, &mut events);
        if self.sequencer.register_delta() {
            events.push(MarketDataEvent::Snapshot(self.snapshot(FULL_DEPTH)));
        }
        if live {
            self.sequencer.publish_batch(&events);
        }

        self.terminal.insert(order_id, OrderStatus::Cancelled);
        if live {
            self.journal_record(JournaledOp::Cancel { order_id });
        }

        CommandReply::Cancelled {
            order_id,
            cancelled_seq: self.sequencer.last_seq(),
        }
    }

    fn push_bbo_event(&mut self, bbo_before: Bbo, timestamp_ns: u64, events: &mut Vec<MarketDataEvent>) {
        let bbo_after = self.book.bbo();
        if bbo_after != bbo_before {
            events.push(MarketDataEvent::Bbo(BboUpdate {
                symbol: self.config.symbol.clone(),
                bbo: bbo_after,
                timestamp_ns,
                seq: self.sequencer.assign_seq(),
            }));
        }
    }

    fn journal_record(&mut self, op: JournaledOp) {
        let seq = self.next_command_seq;
        self.next_command_seq += 1;
        if let Some(journal) = &self.journal {
            let record = CommandRecord {
                seq,
                timestamp_ns: monotonic_nanos(),
                op,
            };
            if let Err(err) = journal.append(&record) {
                error!("journal append failed on {}: {}", self.config.symbol, err);
            }
        }
    }

    /// A crossed book after a completed matching cycle is an internal
    /// invariant violation; the symbol engine halts rather than serving
    /// from corrupt state.
    fn halt_if_crossed(&self) {
        if self.book.is_crossed() {
            error!("book crossed after matching on {}", self.config.symbol);
            panic!("book crossed after matching on {}", self.config.symbol);
        }
    }
}

enum EngineRequest {
    Command {
        command: Command,
        reply: oneshot::Sender<CommandReply>,
    },
    Subscribe {
        channels: ChannelMask,
        reply: oneshot::Sender<Subscription>,
    },
}

/// Handle to a symbol engine running on its own Tokio task.
///
/// The handle owns the task; share it behind the exchange router or an
/// `Arc` when multiple producers submit commands.
#[derive(Debug)]
pub struct SymbolEngine {
    symbol: String,
    inbox: mpsc::Sender<EngineRequest>,
    task: tokio::task::JoinHandle<()>,
}

impl SymbolEngine {
    /// Spawns the engine task for `core` with a bounded inbox.
    ///
    /// Commands queue in arrival order; once the inbox accepts a command
    /// it runs to completion on the engine task.
    #[must_use]
    pub fn spawn(core: SymbolCore, inbox_capacity: usize) -> Self {
        let symbol = core.config().symbol.clone();
        let task_symbol = symbol.clone();
        let (inbox, mut requests) = mpsc::channel(inbox_capacity);

        let task = tokio::spawn(async move {
            info!("symbol engine started for {}", task_symbol);
            let mut core = core;
            while let Some(request) = requests.recv().await {
                match request {
                    EngineRequest::Command { command, reply } => {
                        let _ = reply.send(core.apply(command));
                    }
                    EngineRequest::Subscribe { channels, reply } => {
                        let _ = reply.send(core.subscribe(channels));
                    }
                }
            }
            info!("symbol engine stopped for {}", task_symbol);
        });

        Self {
            symbol,
            inbox,
            task,
        }
    }

    /// The symbol this engine owns.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Submits a command, waiting for inbox capacity if necessary.
    pub async fn submit(&self, command: Command) -> CommandReply {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EngineRequest::Command {
            command,
            reply: reply_tx,
        };
        if self.inbox.send(request).await.is_err() {
            return self.closed();
        }
        reply_rx.await.unwrap_or_else(|_| self.closed())
    }

    /// Submits a command, failing fast with `Backpressure` when the inbox
    /// is full.
    pub async fn try_submit(&self, command: Command) -> CommandReply {
        match self.submit_nowait(command) {
            Ok(reply_rx) => reply_rx.await.unwrap_or_else(|_| self.closed()),
            Err(reason) => CommandReply::Rejected { reason },
        }
    }

    /// Enqueues a command without waiting for its reply.
    ///
    /// The returned receiver resolves once the engine task processes the
    /// command.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backpressure`] when the inbox is full and
    /// [`EngineError::EngineClosed`] when the engine task is gone.
    pub fn submit_nowait(
        &self,
        command: Command,
    ) -> Result<oneshot::Receiver<CommandReply>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EngineRequest::Command {
            command,
            reply: reply_tx,
        };
        match self.inbox.try_send(request) {
            Ok(()) => Ok(reply_rx),
            Err(TrySendError::Full(_)) => Err(EngineError::Backpressure {
                symbol: self.symbol.clone(),
            }),
            Err(TrySendError::Closed(_)) => Err(EngineError::EngineClosed {
                symbol: self.symbol.clone(),
            }),
        }
    }

    /// Attaches a market-data subscriber via the engine task, so snapshot
    /// seeding serializes with command processing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EngineClosed`] when the engine task is gone.
    pub async fn subscribe(&self, channels: ChannelMask) -> Result<Subscription, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EngineRequest::Subscribe {
            channels,
            reply: reply_tx,
        };
        let closed = || EngineError::EngineClosed {
            symbol: self.symbol.clone(),
        };
        self.inbox.send(request).await.map_err(|_| closed())?;
        reply_rx.await.map_err(|_| closed())
    }

    /// Stops the engine after draining queued commands.
    pub async fn shutdown(self) {
        drop(self.inbox);
        let _ = self.task.await;
    }

    fn closed(&self) -> CommandReply {
        CommandReply::Rejected {
            reason: EngineError::EngineClosed {
                symbol: self.symbol.clone(),
            },
        }
    }
}
