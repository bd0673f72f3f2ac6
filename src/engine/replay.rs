//! Append-only command journal for deterministic replay.
//!
//! The engine's sequenced command log is the authoritative record of a
//! symbol's history: replaying the same commands in the same order onto a
//! fresh engine reconstructs identical book state, sequence numbers, and
//! trade ids. Durable storage of the log is an external concern; the
//! [`Journal`] trait is the seam, and [`MemoryJournal`] the in-process
//! implementation used for tests and embedding.

use crate::engine::admission::NewOrderRequest;
use crate::engine::types::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// A state-mutating operation as recorded in the journal.
///
/// New orders carry the order id assigned at admission so replay
/// reproduces identical identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournaledOp {
    /// A new order admitted into the engine.
    NewOrder {
        /// The id assigned at admission.
        order_id: OrderId,
        /// The validated request as received.
        request: NewOrderRequest,
    },

    /// A cancel accepted by the engine.
    Cancel {
        /// The cancelled order id.
        order_id: OrderId,
    },
}

/// A single journal entry: one command in per-symbol arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Per-symbol command sequence, gap-free from 1.
    pub seq: u64,
    /// Monotonic engine timestamp at execution.
    pub timestamp_ns: u64,
    /// The operation that was executed.
    pub op: JournaledOp,
}

/// Iterator over journal entries in sequence order.
pub type JournalReadIter = Box<dyn Iterator<Item = Result<CommandRecord, JournalError>>>;

/// An append-only, ordered store of [`CommandRecord`]s.
///
/// `Send + Sync` so a journal can be shared across task boundaries; the
/// intended pattern is single-writer (the symbol engine) with concurrent
/// readers.
pub trait Journal: Send + Sync {
    /// Appends a record to the journal.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the record cannot be persisted.
    fn append(&self, record: &CommandRecord) -> Result<(), JournalError>;

    /// Reads records starting at `seq` (inclusive), in order.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the store cannot be read.
    fn read_from(&self, seq: u64) -> Result<JournalReadIter, JournalError>;

    /// Sequence of the last record, or `None` when empty.
    fn last_sequence(&self) -> Option<u64>;
}

/// Errors from journal implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JournalError {
    /// A record could not be serialized for storage.
    SerializationError {
        /// Underlying error message.
        message: String,
    },

    /// A stored record could not be decoded.
    DeserializationError {
        /// Sequence of the bad record.
        sequence: u64,
        /// Underlying error message.
        message: String,
    },

    /// An internal lock was poisoned.
    MutexPoisoned,
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalError::SerializationError { message } => {
                write!(f, "journal serialization error: {message}")
            }
            JournalError::DeserializationError { sequence, message } => {
                write!(
                    f,
                    "journal deserialization error at sequence {sequence}: {message}"
                )
            }
            JournalError::MutexPoisoned => write!(f, "journal internal mutex poisoned"),
        }
    }
}

impl std::error::Error for JournalError {}

/// In-memory journal backed by a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<CommandRecord>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out all records, in order.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::MutexPoisoned`] if a writer panicked.
    pub fn records(&self) -> Result<Vec<CommandRecord>, JournalError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| JournalError::MutexPoisoned)?
            .clone())
    }
}

impl Journal for MemoryJournal {
    fn append(&self, record: &CommandRecord) -> Result<(), JournalError> {
        self.entries
            .lock()
            .map_err(|_| JournalError::MutexPoisoned)?
            .push(record.clone());
        Ok(())
    }

    fn read_from(&self, seq: u64) -> Result<JournalReadIter, JournalError> {
        let entries: Vec<CommandRecord> = self
            .entries
            .lock()
            .map_err(|_| JournalError::MutexPoisoned)?
            .iter()
            .filter(|record| record.seq >= seq)
            .cloned()
            .collect();
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn last_sequence(&self) -> Option<u64> {
        self.entries
            .lock()
            .ok()?
            .last()
            .map(|record| record.seq)
    }
}
