//! Read models over the ledger: balance summaries and account statements.
//!
//! Pure reads, recomputed on demand; nothing here mutates ledger state.

pub mod statement;
pub mod summary;

pub use statement::{ActivityBreakdown, Statement, StatementGenerator};
pub use summary::{BalanceProjector, Summary};
