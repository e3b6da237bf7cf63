//! Ledger error taxonomy.

use thiserror::Error;

use crate::money::Money;

/// Result type used across the ledger domain.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant
/// is surfaced to the immediate caller with enough structure to produce a
/// user-facing message; none are swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed input to a posting rule (non-positive amount, identical
    /// transfer endpoints, missing required ids).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced account/sale/purchase does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Requested return quantity exceeds the remaining returnable quantity
    /// for the original sale/purchase.
    #[error("return quantity {requested} exceeds remaining returnable quantity {remaining}")]
    OverReturn { requested: i64, remaining: i64 },

    /// Payment amount exceeds the counterparty's outstanding exposure.
    #[error("payment of {amount} exceeds outstanding balance of {outstanding}")]
    Overpayment { amount: Money, outstanding: Money },

    /// A constructed posting's debits and credits do not sum equal.
    ///
    /// This indicates a defect in posting-rule construction, not bad user
    /// input; the whole posting is aborted with no partial writes.
    #[error("imbalanced posting: debits {debits} != credits {credits}")]
    ImbalancedPosting { debits: Money, credits: Money },

    /// Lock/transaction contention; the caller may retry the whole posting.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The ledger was not initialized correctly (e.g. missing system account).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
