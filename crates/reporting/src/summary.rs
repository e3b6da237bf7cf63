//! Current-position summary derived from account balances.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shopbooks_core::{LedgerResult, Money};
use shopbooks_ledger::{Account, AccountDirectory, AccountType, SystemAccount};

/// The dashboard numbers: money on hand plus what is owed each way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub cash_balance: Money,
    pub bank_balance: Money,
    /// Sum of positive customer-account balances.
    pub total_receivables: Money,
    /// Sum of supplier debt magnitudes (supplier balances run negative
    /// when we owe them).
    pub total_payables: Money,
}

/// Derives balance aggregates from the account directory on demand.
///
/// Not cached independently: the directory's balances are the source, so a
/// summary is as fresh as the moment it was computed.
#[derive(Debug)]
pub struct BalanceProjector {
    directory: Arc<AccountDirectory>,
}

impl BalanceProjector {
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        Self { directory }
    }

    pub fn summary(&self) -> LedgerResult<Summary> {
        let cash = self.directory.system_account(SystemAccount::Cash)?;
        let bank = self.directory.system_account(SystemAccount::Bank)?;

        let total_receivables = self
            .directory
            .list_all(Some(AccountType::Customer))?
            .iter()
            .map(Account::balance)
            .filter(Money::is_positive)
            .sum();
        let total_payables = self
            .directory
            .list_all(Some(AccountType::Supplier))?
            .iter()
            .map(Account::balance)
            .filter(Money::is_negative)
            .map(|b| b.abs())
            .sum();

        Ok(Summary {
            cash_balance: cash.balance(),
            bank_balance: bank.balance(),
            total_receivables,
            total_payables,
        })
    }

    /// Customers owing the most, largest receivable first, ties by account
    /// id ascending for a deterministic order.
    pub fn top_debtors(&self, n: usize) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .directory
            .list_all(Some(AccountType::Customer))?
            .into_iter()
            .filter(|a| a.balance().is_positive())
            .collect();
        accounts.sort_by(|a, b| {
            b.balance()
                .abs()
                .cmp(&a.balance().abs())
                .then(a.id.cmp(&b.id))
        });
        accounts.truncate(n);
        Ok(accounts)
    }

    /// Suppliers we owe the most, largest payable first, same tie-break.
    pub fn top_creditors(&self, n: usize) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .directory
            .list_all(Some(AccountType::Supplier))?
            .into_iter()
            .filter(|a| a.balance().is_negative())
            .collect();
        accounts.sort_by(|a, b| {
            b.balance()
                .abs()
                .cmp(&a.balance().abs())
                .then(a.id.cmp(&b.id))
        });
        accounts.truncate(n);
        Ok(accounts)
    }
}
