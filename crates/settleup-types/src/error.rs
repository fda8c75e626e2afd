//! Error types for the SettleUp settlement engine.
//!
//! All errors use the `SU_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Input errors (identifiers, amounts)
//! - 2xx: Consistency errors (zero-sum, matching, conservation)
//! - 3xx: Ledger store errors
//! - 4xx: Concurrency errors
//! - 9xx: General / internal errors
//!
//! Every variant is fatal for the settlement run that produced it. The engine
//! never retries internally; the caller re-derives the obligation set and
//! re-runs from scratch.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{GroupId, LedgerRecordId, LedgerVersion};

/// Central error enum for all SettleUp operations.
#[derive(Debug, Error)]
pub enum SettleupError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// A participant reference could not be normalized to a canonical id.
    #[error("SU_ERR_100: Invalid participant reference: {reason}")]
    InvalidParticipant { reason: String },

    /// An amount is outside the allowed range (e.g. a non-positive transfer).
    #[error("SU_ERR_101: Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Decimal, reason: String },

    /// A transfer or ledger record names the same participant on both sides.
    #[error("SU_ERR_102: Self-transfer rejected for participant {0}")]
    SelfTransfer(String),

    // =================================================================
    // Consistency Errors (2xx)
    // =================================================================
    /// Net balances do not sum to zero beyond tolerance.
    #[error("SU_ERR_200: Obligations do not balance: net sum {sum} exceeds tolerance {tolerance}")]
    UnbalancedObligations { sum: Decimal, tolerance: Decimal },

    /// The matcher could not pair the remaining balances.
    #[error("SU_ERR_201: Matching failed: {reason}")]
    MatchingFailed { reason: String },

    /// The computed transfers do not zero the balances they were derived from.
    #[error("SU_ERR_202: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Store Errors (3xx)
    // =================================================================
    /// The ledger store failed a read or write.
    #[error("SU_ERR_300: Ledger store error: {0}")]
    Store(String),

    /// No ledger record exists with this id.
    #[error("SU_ERR_301: Ledger record not found: {0}")]
    RecordNotFound(LedgerRecordId),

    /// The group's ledger changed between read and write.
    #[error("SU_ERR_302: Ledger version conflict for group {group}: expected {expected}, found {actual}")]
    VersionConflict {
        group: GroupId,
        expected: LedgerVersion,
        actual: LedgerVersion,
    },

    /// The ledger record was already marked settled.
    #[error("SU_ERR_303: Ledger record already settled: {0}")]
    AlreadySettled(LedgerRecordId),

    // =================================================================
    // Concurrency Errors (4xx)
    // =================================================================
    /// Another settlement run held the group lock for too long.
    #[error("SU_ERR_400: Timed out after {timeout_ms}ms waiting for settlement lock on group {group}")]
    LockTimeout { group: GroupId, timeout_ms: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SU_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SU_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("SU_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("SU_ERR_903: I/O error: {0}")]
    Io(String),
}

impl SettleupError {
    /// Shorthand for an invalid participant reference.
    pub fn invalid_participant(reason: impl Into<String>) -> Self {
        Self::InvalidParticipant {
            reason: reason.into(),
        }
    }

    /// Whether the failure came from a concurrent writer rather than from the
    /// input itself. Such runs can be re-derived and re-run by the caller.
    #[must_use]
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::LockTimeout { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SettleupError>;

impl From<std::io::Error> for SettleupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettleupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
