//! Ledger accounts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopbooks_core::{AccountId, Entity, Money};

/// High-level account classification.
///
/// One internal sign convention applies to every type: `balance = Σ(debit −
/// credit)`. Customer receivables are positive when the customer owes us;
/// supplier payables are negative when we owe the supplier; revenue runs
/// negative (credit-normal). Display-side sign flips belong to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Cash,
    Bank,
    Customer,
    Supplier,
    Revenue,
    Expense,
    Equity,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Equity => "equity",
        }
    }

    /// Whether accounts of this type are derived from a business party record.
    pub fn is_party(&self) -> bool {
        matches!(self, Self::Customer | Self::Supplier)
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The singleton accounts seeded at directory construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemAccount {
    Cash,
    Bank,
    Revenue,
    Expense,
}

impl SystemAccount {
    pub const ALL: [SystemAccount; 4] = [Self::Cash, Self::Bank, Self::Revenue, Self::Expense];

    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Cash => AccountType::Cash,
            Self::Bank => AccountType::Bank,
            Self::Revenue => AccountType::Revenue,
            Self::Expense => AccountType::Expense,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Bank => "Bank",
            Self::Revenue => "Revenue",
            Self::Expense => "Expense",
        }
    }
}

/// One ledger participant: a named bucket whose balance is the running sum of
/// its entries.
///
/// `balance` is denormalized from the entry log for fast reads and must always
/// equal the sum of signed entry amounts posted to this account. It is only
/// mutable from within this crate (the store's append path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub is_system: bool,
    /// Back-reference to the owning customer/supplier record, if any.
    /// Lookup only; the account does not own the business record.
    pub reference_id: Option<Uuid>,
    balance: Money,
}

impl Account {
    pub(crate) fn system(kind: SystemAccount) -> Self {
        Self {
            id: AccountId::new(),
            name: kind.display_name().to_string(),
            account_type: kind.account_type(),
            is_system: true,
            reference_id: None,
            balance: Money::ZERO,
        }
    }

    pub(crate) fn for_customer(customer_id: Uuid, name: &str) -> Self {
        Self {
            id: AccountId::new(),
            name: format!("Customer: {name}"),
            account_type: AccountType::Customer,
            is_system: false,
            reference_id: Some(customer_id),
            balance: Money::ZERO,
        }
    }

    pub(crate) fn for_supplier(supplier_id: Uuid, name: &str) -> Self {
        Self {
            id: AccountId::new(),
            name: format!("Supplier: {name}"),
            account_type: AccountType::Supplier,
            is_system: false,
            reference_id: Some(supplier_id),
            balance: Money::ZERO,
        }
    }

    /// Cached current balance (debits minus credits).
    pub fn balance(&self) -> Money {
        self.balance
    }

    pub(crate) fn apply_delta(&mut self, delta: Money) -> Money {
        self.balance += delta;
        self.balance
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &AccountId {
        &self.id
    }
}
