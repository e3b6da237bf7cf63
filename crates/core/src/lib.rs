//! `shopbooks-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the ledger error taxonomy, and fixed-point money.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, CustomerId, EntryId, PurchaseId, SaleId, SupplierId};
pub use money::Money;
pub use value_object::ValueObject;
