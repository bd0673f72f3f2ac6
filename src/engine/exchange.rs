//! Multi-symbol exchange router.
//!
//! Owns one [`SymbolEngine`] per hosted symbol and routes commands to the
//! right single-writer task. Symbol lookup and order-id routing use
//! concurrent maps so any number of transport tasks can submit without
//! funneling through a lock.

use crate::engine::admission::NewOrderRequest;
use crate::engine::error::EngineError;
use crate::engine::fees::FeeTable;
use crate::engine::sequencer::{ChannelMask, SequencerConfig, Subscription};
use crate::engine::snapshot::BookSnapshot;
use crate::engine::symbol::{Command, CommandReply, SymbolCore, SymbolEngine};
use crate::engine::types::{OrderId, SymbolConfig};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// Default bound of each symbol engine's command inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 1_024;

/// Routes commands and subscriptions across per-symbol engines.
///
/// The fee table is read-only after construction; each added symbol
/// snapshots its schedule into the engine core.
pub struct Exchange {
    engines: DashMap<String, Arc<SymbolEngine>>,
    order_symbols: DashMap<OrderId, String>,
    fees: FeeTable,
    sequencer_config: SequencerConfig,
    inbox_capacity: usize,
}

impl Exchange {
    /// Creates an exchange with the given fee table and default tuning.
    #[must_use]
    pub fn new(fees: FeeTable) -> Self {
        Self::with_tuning(fees, SequencerConfig::default(), DEFAULT_INBOX_CAPACITY)
    }

    /// Creates an exchange with explicit sequencer and inbox tuning.
    #[must_use]
    pub fn with_tuning(
        fees: FeeTable,
        sequencer_config: SequencerConfig,
        inbox_capacity: usize,
    ) -> Self {
        Self {
            engines: DashMap::new(),
            order_symbols: DashMap::new(),
            fees,
            sequencer_config,
            inbox_capacity,
        }
    }

    /// Starts hosting `config.symbol`, spawning its engine task.
    ///
    /// Replaces any previous engine for the same symbol.
    pub fn add_symbol(&self, config: SymbolConfig) {
        let symbol = config.symbol.clone();
        let fees = self.fees.schedule_for(&symbol).clone();
        let core = SymbolCore::with_sequencer_config(config, fees, self.sequencer_config);
        let engine = SymbolEngine::spawn(core, self.inbox_capacity);
        self.engines.insert(symbol.clone(), Arc::new(engine));
        info!("added symbol engine for {}", symbol);
    }

    /// Whether `symbol` is hosted here.
    #[must_use]
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.engines.contains_key(symbol)
    }

    /// The hosted symbols, in no particular order.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.engines.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of hosted symbols.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.engines.len()
    }

    /// Submits a new order to the engine owning `symbol`, waiting for
    /// inbox capacity if necessary.
    pub async fn submit_order(&self, symbol: &str, request: NewOrderRequest) -> CommandReply {
        let Some(engine) = self.engine(symbol) else {
            return Self::unknown_symbol(symbol);
        };
        let reply = engine.submit(Command::NewOrder(request)).await;
        self.index_reply(symbol, &reply);
        reply
    }

    /// Submits a new order, failing fast with `Backpressure` when the
    /// engine's inbox is full.
    pub async fn try_submit_order(&self, symbol: &str, request: NewOrderRequest) -> CommandReply {
        let Some(engine) = self.engine(symbol) else {
            return Self::unknown_symbol(symbol);
        };
        let reply = engine.try_submit(Command::NewOrder(request)).await;
        self.index_reply(symbol, &reply);
        reply
    }

    /// Cancels an order, routing by the id recorded at submission.
    pub async fn cancel(&self, order_id: OrderId) -> CommandReply {
        let Some(symbol) = self
            .order_symbols
            .get(&order_id)
            .map(|entry| entry.value().clone())
        else {
            return CommandReply::Rejected {
                reason: EngineError::UnknownOrder { order_id },
            };
        };
        let Some(engine) = self.engine(&symbol) else {
            return CommandReply::Rejected {
                reason: EngineError::UnknownOrder { order_id },
            };
        };
        engine.submit(Command::Cancel { order_id }).await
    }

    /// Reads a depth snapshot for `symbol`.
    pub async fn query(&self, symbol: &str, depth: usize) -> Result<BookSnapshot, EngineError> {
        let Some(engine) = self.engine(symbol) else {
            return Err(EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        };
        match engine.submit(Command::Query { depth }).await {
            CommandReply::Snapshot(snapshot) => Ok(snapshot),
            CommandReply::Rejected { reason } => Err(reason),
            _ => unreachable!("query commands only answer with snapshots"),
        }
    }

    /// Attaches a market-data subscriber on `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSymbol`] or
    /// [`EngineError::EngineClosed`].
    pub async fn subscribe(
        &self,
        symbol: &str,
        channels: ChannelMask,
    ) -> Result<Subscription, EngineError> {
        let Some(engine) = self.engine(symbol) else {
            return Err(EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        };
        engine.subscribe(channels).await
    }

    /// Stops every symbol engine after draining queued commands.
    pub async fn shutdown(self) {
        let symbols = self.symbols();
        for symbol in symbols {
            if let Some((_, engine)) = self.engines.remove(&symbol)
                && let Ok(engine) = Arc::try_unwrap(engine)
            {
                engine.shutdown().await;
            }
        }
        info!("exchange shut down");
    }

    fn engine(&self, symbol: &str) -> Option<Arc<SymbolEngine>> {
        self.engines.get(symbol).map(|entry| entry.value().clone())
    }

    fn unknown_symbol(symbol: &str) -> CommandReply {
        CommandReply::Rejected {
            reason: EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            },
        }
    }

    /// Records order-id routing so a later `Cancel { order_id }` can find
    /// its engine. Runs before the reply reaches the caller, so a client
    /// can never observe an ack for an unroutable id.
    fn index_reply(&self, symbol: &str, reply: &CommandReply) {
        if let CommandReply::OrderAccepted { order_id, .. } = reply {
            self.order_symbols.insert(*order_id, symbol.to_string());
        }
    }
}
