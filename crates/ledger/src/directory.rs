//! Account registry: system accounts plus lazily-created party accounts.

use std::collections::HashMap;
use std::sync::RwLock;

use shopbooks_core::{AccountId, CustomerId, LedgerError, LedgerResult, Money, SupplierId};

use crate::account::{Account, AccountType, SystemAccount};

/// Registry of ledger accounts.
///
/// System accounts (Cash, Bank, Revenue, Expense) are created once at
/// construction. Customer and supplier accounts are created lazily on first
/// use — insert-if-absent under the write lock, so two simultaneous first
/// sales to a brand-new customer cannot create two accounts — and are never
/// deleted, because historical entries must remain attributable.
///
/// Balance writes are `pub(crate)`: the only mutation path is the ledger
/// store's append.
#[derive(Debug)]
pub struct AccountDirectory {
    inner: RwLock<DirectoryInner>,
}

#[derive(Debug, Default)]
struct DirectoryInner {
    accounts: HashMap<AccountId, Account>,
    system: HashMap<SystemAccount, AccountId>,
    customers: HashMap<CustomerId, AccountId>,
    suppliers: HashMap<SupplierId, AccountId>,
}

impl AccountDirectory {
    /// Create a directory with all system accounts seeded.
    pub fn new() -> Self {
        let mut inner = DirectoryInner::default();
        for kind in SystemAccount::ALL {
            let account = Account::system(kind);
            inner.system.insert(kind, account.id);
            inner.accounts.insert(account.id, account);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Return the existing account for this customer, or create one.
    ///
    /// Idempotent by customer id: repeated calls return the same account.
    pub fn get_or_create_customer_account(
        &self,
        customer_id: CustomerId,
        name: &str,
    ) -> LedgerResult<Account> {
        let mut inner = self.write()?;
        if let Some(account_id) = inner.customers.get(&customer_id) {
            return Ok(inner.accounts[account_id].clone());
        }
        let account = Account::for_customer(customer_id.into(), name);
        tracing::debug!(account_id = %account.id, customer_id = %customer_id, "created customer account");
        inner.customers.insert(customer_id, account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Return the existing account for this supplier, or create one.
    pub fn get_or_create_supplier_account(
        &self,
        supplier_id: SupplierId,
        name: &str,
    ) -> LedgerResult<Account> {
        let mut inner = self.write()?;
        if let Some(account_id) = inner.suppliers.get(&supplier_id) {
            return Ok(inner.accounts[account_id].clone());
        }
        let account = Account::for_supplier(supplier_id.into(), name);
        tracing::debug!(account_id = %account.id, supplier_id = %supplier_id, "created supplier account");
        inner.suppliers.insert(supplier_id, account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// The singleton account for Cash, Bank, Revenue or Expense.
    pub fn system_account(&self, kind: SystemAccount) -> LedgerResult<Account> {
        let inner = self.read()?;
        let account_id = inner.system.get(&kind).ok_or_else(|| {
            LedgerError::configuration(format!("system account {kind:?} not initialized"))
        })?;
        Ok(inner.accounts[account_id].clone())
    }

    pub fn system_account_id(&self, kind: SystemAccount) -> LedgerResult<AccountId> {
        self.system_account(kind).map(|a| a.id)
    }

    /// The existing account for a customer, without creating one.
    pub fn customer_account(&self, customer_id: CustomerId) -> LedgerResult<Account> {
        let inner = self.read()?;
        inner
            .customers
            .get(&customer_id)
            .map(|id| inner.accounts[id].clone())
            .ok_or_else(|| {
                LedgerError::not_found(format!("no ledger account for customer {customer_id}"))
            })
    }

    /// The existing account for a supplier, without creating one.
    pub fn supplier_account(&self, supplier_id: SupplierId) -> LedgerResult<Account> {
        let inner = self.read()?;
        inner
            .suppliers
            .get(&supplier_id)
            .map(|id| inner.accounts[id].clone())
            .ok_or_else(|| {
                LedgerError::not_found(format!("no ledger account for supplier {supplier_id}"))
            })
    }

    /// Snapshot of one account.
    pub fn account(&self, account_id: AccountId) -> LedgerResult<Account> {
        let inner = self.read()?;
        inner
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(format!("account {account_id}")))
    }

    /// Cached balance of one account.
    pub fn balance(&self, account_id: AccountId) -> LedgerResult<Money> {
        self.account(account_id).map(|a| a.balance())
    }

    pub fn contains(&self, account_id: AccountId) -> LedgerResult<bool> {
        Ok(self.read()?.accounts.contains_key(&account_id))
    }

    /// All accounts, optionally filtered by type, ordered by account id.
    pub fn list_all(&self, filter: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let inner = self.read()?;
        let mut accounts: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| filter.is_none_or(|t| a.account_type == t))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    /// Apply a signed balance delta, returning the new balance.
    ///
    /// Crate-private: all mutation funnels through `LedgerStore::append`.
    pub(crate) fn apply_delta(&self, account_id: AccountId, delta: Money) -> LedgerResult<Money> {
        let mut inner = self.write()?;
        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| LedgerError::not_found(format!("account {account_id}")))?;
        Ok(account.apply_delta(delta))
    }

    fn read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, DirectoryInner>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::conflict("account directory lock poisoned"))
    }

    fn write(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, DirectoryInner>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::conflict("account directory lock poisoned"))
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn system_accounts_are_seeded_at_construction() {
        let directory = AccountDirectory::new();
        for kind in SystemAccount::ALL {
            let account = directory.system_account(kind).unwrap();
            assert_eq!(account.account_type, kind.account_type());
            assert!(account.is_system);
        }
        assert_eq!(directory.list_all(None).unwrap().len(), 4);
    }

    #[test]
    fn customer_account_creation_is_idempotent() {
        let directory = AccountDirectory::new();
        let customer_id = CustomerId::new();

        let first = directory
            .get_or_create_customer_account(customer_id, "Asha Traders")
            .unwrap();
        let second = directory
            .get_or_create_customer_account(customer_id, "Asha Traders")
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(
            directory
                .list_all(Some(AccountType::Customer))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn concurrent_first_use_creates_a_single_account() {
        let directory = Arc::new(AccountDirectory::new());
        let customer_id = CustomerId::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let directory = Arc::clone(&directory);
                std::thread::spawn(move || {
                    directory
                        .get_or_create_customer_account(customer_id, "Asha Traders")
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: Vec<AccountId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(
            directory
                .list_all(Some(AccountType::Customer))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn list_all_filters_by_type() {
        let directory = AccountDirectory::new();
        directory
            .get_or_create_supplier_account(SupplierId::new(), "Metro Wholesale")
            .unwrap();

        let suppliers = directory.list_all(Some(AccountType::Supplier)).unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].name, "Supplier: Metro Wholesale");

        assert!(
            directory
                .list_all(Some(AccountType::Equity))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn unknown_account_lookup_is_not_found() {
        let directory = AccountDirectory::new();
        let err = directory.account(AccountId::new()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }
}
