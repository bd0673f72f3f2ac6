//! Depth snapshots of the book, with a checksummed package format for
//! handing consistent state to external consumers.

use crate::engine::book::LevelDepth;
use crate::engine::types::Bbo;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format version for checksummed snapshot packages.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// An immutable view of the top of the book at one sequencer position.
///
/// Levels are best-first on both sides. `last_seq` is the sequence number
/// of the last event emitted before the snapshot was taken; deltas with a
/// greater sequence apply on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// The symbol this snapshot belongs to.
    pub symbol: String,

    /// Monotonic engine timestamp when the snapshot was taken.
    pub timestamp_ns: u64,

    /// Sequence number of the last event preceding this snapshot.
    pub last_seq: u64,

    /// Bid levels, highest price first.
    pub bids: Vec<LevelDepth>,

    /// Ask levels, lowest price first.
    pub asks: Vec<LevelDepth>,

    /// Best bid and offer at snapshot time.
    pub bbo: Bbo,
}

impl BookSnapshot {
    /// Best bid price and quantity.
    #[must_use]
    pub fn best_bid(&self) -> Option<(u128, u64)> {
        self.bbo.bid
    }

    /// Best ask price and quantity.
    #[must_use]
    pub fn best_ask(&self) -> Option<(u128, u64)> {
        self.bbo.ask
    }

    /// Spread between best ask and best bid.
    #[must_use]
    pub fn spread(&self) -> Option<u128> {
        self.bbo.spread()
    }

    /// Total visible quantity on the bid side of the snapshot.
    #[must_use]
    pub fn total_bid_volume(&self) -> u64 {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    /// Total visible quantity on the ask side of the snapshot.
    #[must_use]
    pub fn total_ask_volume(&self) -> u64 {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}

/// Wrapper that adds integrity validation to a [`BookSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPackage {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub snapshot: BookSnapshot,
    /// Hex-encoded SHA-256 of the serialized snapshot.
    pub checksum: String,
}

impl SnapshotPackage {
    /// Creates a package, computing the checksum of the snapshot contents.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialization`] when the payload cannot be
    /// encoded.
    pub fn new(snapshot: BookSnapshot) -> Result<Self, SnapshotError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(Self {
            version: SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialization`] when encoding fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|error| SnapshotError::Serialization {
            message: error.to_string(),
        })
    }

    /// Deserializes a package from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Deserialization`] when decoding fails.
    pub fn from_json(data: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(data).map_err(|error| SnapshotError::Deserialization {
            message: error.to_string(),
        })
    }

    /// Validates the format version and checksum.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnsupportedVersion`] or
    /// [`SnapshotError::ChecksumMismatch`].
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                version: self.version,
            });
        }
        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(SnapshotError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    /// Consumes the package and returns the validated snapshot.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::validate`] failures.
    pub fn into_snapshot(self) -> Result<BookSnapshot, SnapshotError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &BookSnapshot) -> Result<String, SnapshotError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| SnapshotError::Serialization {
                message: error.to_string(),
            })?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Errors for snapshot packaging and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    /// The payload could not be serialized.
    Serialization {
        /// Underlying error message.
        message: String,
    },

    /// The payload could not be deserialized.
    Deserialization {
        /// Underlying error message.
        message: String,
    },

    /// The package format version is not supported.
    UnsupportedVersion {
        /// The version found in the package.
        version: u32,
    },

    /// Integrity check failed.
    ChecksumMismatch {
        /// Checksum stored in the package.
        expected: String,
        /// Checksum computed over the payload.
        actual: String,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Serialization { message } => {
                write!(f, "snapshot serialization error: {message}")
            }
            SnapshotError::Deserialization { message } => {
                write!(f, "snapshot deserialization error: {message}")
            }
            SnapshotError::UnsupportedVersion { version } => {
                write!(
                    f,
                    "unsupported snapshot version: {version} (expected {SNAPSHOT_FORMAT_VERSION})"
                )
            }
            SnapshotError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected}, but computed {actual}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}
