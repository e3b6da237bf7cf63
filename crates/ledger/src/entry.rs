//! Ledger entries and balanced postings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopbooks_core::{AccountId, EntryId, LedgerError, LedgerResult, Money};

/// The business event class an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Purchase,
    Payment,
    SalesReturn,
    PurchaseReturn,
    Adjustment,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::Payment => "payment",
            Self::SalesReturn => "sales_return",
            Self::PurchaseReturn => "purchase_return",
            Self::Adjustment => "adjustment",
            Self::Transfer => "transfer",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link back to the originating business record (sale, purchase, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: TransactionType,
    pub id: Uuid,
}

impl SourceRef {
    pub fn new(kind: TransactionType, id: impl Into<Uuid>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// One side of a balanced posting, as stored.
///
/// Exactly one of `debit_amount`/`credit_amount` is non-zero. Entries are
/// immutable once created; corrections are made via new offsetting entries,
/// never by editing history. `balance_after` is the account's running balance
/// immediately after this entry was applied, computed at post time — it is a
/// snapshot and is never recomputed when later corrections are posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub entry_date: NaiveDate,
    pub transaction_type: TransactionType,
    pub narration: String,
    pub debit_amount: Money,
    pub credit_amount: Money,
    pub balance_after: Money,
    pub reference: Option<SourceRef>,
    /// Store-assigned insertion position; the tie-break for same-day ordering.
    pub sequence: u64,
}

impl LedgerEntry {
    /// Debits minus credits: positive for debit entries, negative for credits.
    pub fn signed_amount(&self) -> Money {
        self.debit_amount - self.credit_amount
    }
}

/// An entry as constructed by a posting rule, before the store assigns its
/// id, sequence and `balance_after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub account_id: AccountId,
    pub entry_date: NaiveDate,
    pub transaction_type: TransactionType,
    pub narration: String,
    pub debit_amount: Money,
    pub credit_amount: Money,
    pub reference: Option<SourceRef>,
}

impl EntryDraft {
    pub fn debit(
        account_id: AccountId,
        entry_date: NaiveDate,
        transaction_type: TransactionType,
        narration: impl Into<String>,
        amount: Money,
        reference: Option<SourceRef>,
    ) -> Self {
        Self {
            account_id,
            entry_date,
            transaction_type,
            narration: narration.into(),
            debit_amount: amount,
            credit_amount: Money::ZERO,
            reference,
        }
    }

    pub fn credit(
        account_id: AccountId,
        entry_date: NaiveDate,
        transaction_type: TransactionType,
        narration: impl Into<String>,
        amount: Money,
        reference: Option<SourceRef>,
    ) -> Self {
        Self {
            account_id,
            entry_date,
            transaction_type,
            narration: narration.into(),
            debit_amount: Money::ZERO,
            credit_amount: amount,
            reference,
        }
    }

    pub fn signed_amount(&self) -> Money {
        self.debit_amount - self.credit_amount
    }

    fn validate(&self) -> LedgerResult<()> {
        if self.debit_amount.is_negative() || self.credit_amount.is_negative() {
            return Err(LedgerError::validation("entry amounts must not be negative"));
        }
        let debit_set = !self.debit_amount.is_zero();
        let credit_set = !self.credit_amount.is_zero();
        if debit_set == credit_set {
            return Err(LedgerError::validation(
                "exactly one of debit/credit must be non-zero",
            ));
        }
        Ok(())
    }
}

/// A balanced set of entries representing a single business event: the unit
/// of atomicity. Construction validates the balance, so a `Posting` in hand
/// is known to sum debits equal to credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    entries: Vec<EntryDraft>,
}

impl Posting {
    pub fn new(entries: Vec<EntryDraft>) -> LedgerResult<Self> {
        if entries.len() < 2 {
            return Err(LedgerError::validation(
                "a posting must contain at least two entries",
            ));
        }
        for entry in &entries {
            entry.validate()?;
        }
        let debits: Money = entries.iter().map(|e| e.debit_amount).sum();
        let credits: Money = entries.iter().map(|e| e.credit_amount).sum();
        if debits != credits {
            return Err(LedgerError::ImbalancedPosting { debits, credits });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[EntryDraft] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<EntryDraft> {
        self.entries
    }

    pub fn debit_total(&self) -> Money {
        self.entries.iter().map(|e| e.debit_amount).sum()
    }
}
