//! Append-only entry log with cached running balances.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopbooks_core::{AccountId, EntryId, LedgerError, LedgerResult, Money};

use crate::directory::AccountDirectory;
use crate::entry::{LedgerEntry, Posting, TransactionType};

/// Inclusive date bounds for entry queries. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Filter for general-ledger listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub account_id: Option<AccountId>,
    pub transaction_type: Option<TransactionType>,
    pub range: DateRange,
}

/// Source of truth for balances: the append-only ledger.
///
/// `append` is the only write path in the system; it runs under a store-wide
/// mutex so concurrent postings against the same account cannot interleave
/// their read-modify-write of the cached balance. Reads take the directory's
/// shared lock only and may run concurrently with postings.
#[derive(Debug)]
pub struct LedgerStore {
    directory: Arc<AccountDirectory>,
    inner: Mutex<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: Vec<LedgerEntry>,
    next_sequence: u64,
}

impl LedgerStore {
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        Self {
            directory,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub fn directory(&self) -> &Arc<AccountDirectory> {
        &self.directory
    }

    /// Apply a balanced posting: write all rows and update each affected
    /// account's cached balance, all or nothing.
    ///
    /// The posting is already balance-checked by construction; here we verify
    /// every referenced account exists before mutating anything, so a failure
    /// leaves no partial state. Entries touching the same account apply in
    /// list order, and each gets the balance immediately after it applied.
    pub fn append(&self, posting: Posting) -> LedgerResult<Vec<LedgerEntry>> {
        let mut inner = self.lock()?;

        let drafts = posting.into_entries();
        for draft in &drafts {
            if !self.directory.contains(draft.account_id)? {
                return Err(LedgerError::not_found(format!(
                    "account {}",
                    draft.account_id
                )));
            }
        }

        let mut written = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let balance_after = self
                .directory
                .apply_delta(draft.account_id, draft.signed_amount())?;
            let entry = LedgerEntry {
                id: EntryId::new(),
                account_id: draft.account_id,
                entry_date: draft.entry_date,
                transaction_type: draft.transaction_type,
                narration: draft.narration,
                debit_amount: draft.debit_amount,
                credit_amount: draft.credit_amount,
                balance_after,
                reference: draft.reference,
                sequence: inner.next_sequence,
            };
            inner.next_sequence += 1;
            inner.entries.push(entry.clone());
            written.push(entry);
        }

        tracing::debug!(entries = written.len(), "posting appended");
        Ok(written)
    }

    /// Entries for one account, chronological by `entry_date`, insertion
    /// order for same-day ties. Each call re-queries the log.
    pub fn entries_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        if !self.directory.contains(account_id)? {
            return Err(LedgerError::not_found(format!("account {account_id}")));
        }
        let inner = self.lock()?;
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .iter()
            .filter(|e| e.account_id == account_id && range.contains(e.entry_date))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.entry_date, e.sequence));
        Ok(entries)
    }

    /// General-ledger listing across all accounts, with optional account,
    /// transaction-type and date filters.
    pub fn entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<LedgerEntry>> {
        let inner = self.lock()?;
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .iter()
            .filter(|e| {
                filter.account_id.is_none_or(|id| e.account_id == id)
                    && filter
                        .transaction_type
                        .is_none_or(|t| e.transaction_type == t)
                    && filter.range.contains(e.entry_date)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.entry_date, e.sequence));
        Ok(entries)
    }

    /// Re-derive an account's balance by summing all of its entries.
    ///
    /// Must equal the cached balance at all times; used for integrity checks
    /// and repair tooling, not on the hot read path.
    pub fn recompute_balance(&self, account_id: AccountId) -> LedgerResult<Money> {
        if !self.directory.contains(account_id)? {
            return Err(LedgerError::not_found(format!("account {account_id}")));
        }
        let inner = self.lock()?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(LedgerEntry::signed_amount)
            .sum())
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::conflict("ledger store lock poisoned"))
    }
}
