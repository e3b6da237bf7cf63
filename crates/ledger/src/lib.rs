//! Double-entry ledger: accounts, posting rules, append-only entry log.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! account balance cache is owned by this crate; the only write path is
//! [`LedgerStore::append`], which the [`PostingEngine`] drives with balanced
//! postings derived from business events.

pub mod account;
pub mod directory;
pub mod engine;
pub mod entry;
pub mod event;
mod returns;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use account::{Account, AccountType, SystemAccount};
pub use directory::AccountDirectory;
pub use engine::{PostingEngine, PostingReceipt};
pub use entry::{EntryDraft, LedgerEntry, Posting, SourceRef, TransactionType};
pub use event::{
    AdjustmentEvent, BusinessEvent, Counterparty, PaymentEvent, PaymentMethod, PurchaseEvent,
    PurchaseReturnEvent, Refund, SaleEvent, SalesReturnEvent, TransferEvent,
};
pub use store::{DateRange, EntryFilter, LedgerStore};
