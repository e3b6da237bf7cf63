//! Business events the posting engine translates into balanced postings.
//!
//! Each event is a required-field struct behind a tagged [`BusinessEvent`]
//! variant; posting construction dispatches via exhaustive matching.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopbooks_core::{AccountId, CustomerId, Money, PurchaseId, SaleId, SupplierId};

use crate::account::SystemAccount;
use crate::entry::TransactionType;

/// How money moved: through the till or through the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn system_account(&self) -> SystemAccount {
        match self {
            Self::Cash => SystemAccount::Cash,
            Self::Bank => SystemAccount::Bank,
        }
    }
}

/// How a return is refunded: money out now, or a credit against the
/// counterparty's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Refund {
    Cash,
    Bank,
    Credit,
}

/// The party a payment settles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counterparty {
    Customer(CustomerId),
    Supplier(SupplierId),
}

/// A sale: receivable raised against the customer, revenue recognized,
/// any amount paid now moved into cash/bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub sale_id: SaleId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub quantity: i64,
    pub selling_price: Money,
    /// Unit cost, retained for profit adjustment on later returns.
    pub cost_price: Money,
    pub paid_amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// A purchase: payable raised against the supplier, expense recognized,
/// any amount paid now moved out of cash/bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub purchase_id: PurchaseId,
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub quantity: i64,
    pub purchase_price: Money,
    pub paid_amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// A standalone payment settling part of an outstanding balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub counterparty: Counterparty,
    pub amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// Goods coming back from a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReturnEvent {
    pub sale_id: SaleId,
    pub return_quantity: i64,
    pub refund: Refund,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// Goods going back to a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturnEvent {
    pub purchase_id: PurchaseId,
    pub return_quantity: i64,
    pub refund: Refund,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// Money moved between two existing accounts (privileged user action).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Money,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// Manual balanced entry pair for corrections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentEvent {
    pub debit_account: AccountId,
    pub credit_account: AccountId,
    pub amount: Money,
    pub date: NaiveDate,
    pub narration: Option<String>,
}

/// The tagged union of everything the posting engine knows how to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessEvent {
    Sale(SaleEvent),
    Purchase(PurchaseEvent),
    Payment(PaymentEvent),
    SalesReturn(SalesReturnEvent),
    PurchaseReturn(PurchaseReturnEvent),
    Transfer(TransferEvent),
    Adjustment(AdjustmentEvent),
}

impl BusinessEvent {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Sale(_) => TransactionType::Sale,
            Self::Purchase(_) => TransactionType::Purchase,
            Self::Payment(_) => TransactionType::Payment,
            Self::SalesReturn(_) => TransactionType::SalesReturn,
            Self::PurchaseReturn(_) => TransactionType::PurchaseReturn,
            Self::Transfer(_) => TransactionType::Transfer,
            Self::Adjustment(_) => TransactionType::Adjustment,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Sale(e) => e.date,
            Self::Purchase(e) => e.date,
            Self::Payment(e) => e.date,
            Self::SalesReturn(e) => e.date,
            Self::PurchaseReturn(e) => e.date,
            Self::Transfer(e) => e.date,
            Self::Adjustment(e) => e.date,
        }
    }
}
