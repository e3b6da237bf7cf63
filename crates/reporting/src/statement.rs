//! Point-in-time account statements.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopbooks_core::{AccountId, LedgerResult, Money};
use shopbooks_ledger::{
    AccountDirectory, AccountType, DateRange, LedgerEntry, LedgerStore, TransactionType,
};

/// Per-transaction-type totals for customer/supplier statements.
///
/// For a customer account `opening + total_sales − total_payments −
/// total_returns == closing` (and symmetrically for suppliers), which is the
/// identity the original debt views present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub total_sales: Money,
    pub total_purchases: Money,
    pub total_payments: Money,
    pub total_returns: Money,
}

/// A date-filtered, chronologically ordered reconstruction of one account's
/// entries with opening/closing balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub account_id: AccountId,
    pub account_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Account balance immediately before the first included entry.
    pub opening_balance: Money,
    /// Last included entry's stored `balance_after`, or the opening balance
    /// if the range is empty.
    pub closing_balance: Money,
    pub total_debits: Money,
    pub total_credits: Money,
    /// Present for customer and supplier accounts only.
    pub breakdown: Option<ActivityBreakdown>,
    pub entries: Vec<LedgerEntry>,
}

/// Builds statements from the ledger store's entry log.
#[derive(Debug)]
pub struct StatementGenerator {
    directory: Arc<AccountDirectory>,
    store: Arc<LedgerStore>,
}

impl StatementGenerator {
    pub fn new(directory: Arc<AccountDirectory>, store: Arc<LedgerStore>) -> Self {
        Self { directory, store }
    }

    pub fn statement(&self, account_id: AccountId, range: DateRange) -> LedgerResult<Statement> {
        let account = self.directory.account(account_id)?;

        // Opening balance is the sum of everything dated before the range;
        // entries carry their immutable balance_after snapshots.
        let opening_balance = match range.start {
            Some(start) => self
                .store
                .entries_for_account(
                    account_id,
                    DateRange::new(None, start.pred_opt()),
                )?
                .iter()
                .map(LedgerEntry::signed_amount)
                .sum(),
            None => Money::ZERO,
        };

        let entries = self.store.entries_for_account(account_id, range)?;
        let closing_balance = entries
            .last()
            .map(|e| e.balance_after)
            .unwrap_or(opening_balance);
        let total_debits: Money = entries.iter().map(|e| e.debit_amount).sum();
        let total_credits: Money = entries.iter().map(|e| e.credit_amount).sum();

        let breakdown = match account.account_type {
            AccountType::Customer => Some(customer_breakdown(&entries)),
            AccountType::Supplier => Some(supplier_breakdown(&entries)),
            _ => None,
        };

        Ok(Statement {
            account_id,
            account_name: account.name,
            start_date: range.start,
            end_date: range.end,
            opening_balance,
            closing_balance,
            total_debits,
            total_credits,
            breakdown,
            entries,
        })
    }
}

fn customer_breakdown(entries: &[LedgerEntry]) -> ActivityBreakdown {
    let mut breakdown = ActivityBreakdown::default();
    for entry in entries {
        match entry.transaction_type {
            // The receivable raised by the sale.
            TransactionType::Sale => {
                breakdown.total_sales += entry.debit_amount;
                // Paid-at-sale legs credit the customer within the same posting.
                breakdown.total_payments += entry.credit_amount;
            }
            TransactionType::Payment => breakdown.total_payments += entry.credit_amount,
            TransactionType::SalesReturn => breakdown.total_returns += entry.credit_amount,
            _ => {}
        }
    }
    breakdown
}

fn supplier_breakdown(entries: &[LedgerEntry]) -> ActivityBreakdown {
    let mut breakdown = ActivityBreakdown::default();
    for entry in entries {
        match entry.transaction_type {
            TransactionType::Purchase => {
                breakdown.total_purchases += entry.credit_amount;
                breakdown.total_payments += entry.debit_amount;
            }
            TransactionType::Payment => breakdown.total_payments += entry.debit_amount,
            TransactionType::PurchaseReturn => breakdown.total_returns += entry.debit_amount,
            _ => {}
        }
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shopbooks_core::{CustomerId, LedgerError, SaleId};
    use shopbooks_ledger::{
        AdjustmentEvent, BusinessEvent, Counterparty, PaymentEvent, PaymentMethod, PostingEngine,
        Refund, SaleEvent, SalesReturnEvent, SystemAccount,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Arc<AccountDirectory>, PostingEngine, StatementGenerator) {
        let directory = Arc::new(AccountDirectory::new());
        let store = Arc::new(LedgerStore::new(Arc::clone(&directory)));
        let engine = PostingEngine::new(Arc::clone(&directory), Arc::clone(&store));
        let generator = StatementGenerator::new(Arc::clone(&directory), store);
        (directory, engine, generator)
    }

    /// Seed one account with debit 100 on Jan 1, credit 30 on Jan 15 and
    /// debit 20 on Feb 1 via adjustments against the bank account.
    fn seed_dated_entries(directory: &AccountDirectory, engine: &PostingEngine) -> AccountId {
        let cash = directory.system_account_id(SystemAccount::Cash).unwrap();
        let bank = directory.system_account_id(SystemAccount::Bank).unwrap();

        let adjust = |debit, credit, amount, on| {
            engine
                .post(BusinessEvent::Adjustment(AdjustmentEvent {
                    debit_account: debit,
                    credit_account: credit,
                    amount,
                    date: on,
                    narration: None,
                }))
                .unwrap();
        };
        adjust(cash, bank, Money::from_major(100), date(2024, 1, 1));
        adjust(bank, cash, Money::from_major(30), date(2024, 1, 15));
        adjust(cash, bank, Money::from_major(20), date(2024, 2, 1));
        cash
    }

    #[test]
    fn january_statement_excludes_february_and_closes_at_seventy() {
        let (directory, engine, generator) = setup();
        let cash = seed_dated_entries(&directory, &engine);

        let statement = generator
            .statement(
                cash,
                DateRange::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31))),
            )
            .unwrap();

        assert_eq!(statement.entries.len(), 2);
        assert_eq!(statement.opening_balance, Money::ZERO);
        assert_eq!(statement.closing_balance, Money::from_major(70));
        assert_eq!(statement.total_debits, Money::from_major(100));
        assert_eq!(statement.total_credits, Money::from_major(30));
        assert!(statement.breakdown.is_none());
    }

    #[test]
    fn unbounded_statement_closes_at_the_current_balance() {
        let (directory, engine, generator) = setup();
        let cash = seed_dated_entries(&directory, &engine);

        let statement = generator.statement(cash, DateRange::default()).unwrap();
        assert_eq!(statement.entries.len(), 3);
        assert_eq!(statement.closing_balance, Money::from_major(90));
        assert_eq!(statement.closing_balance, directory.balance(cash).unwrap());
    }

    #[test]
    fn opening_balance_carries_prior_activity_into_the_range() {
        let (directory, engine, generator) = setup();
        let cash = seed_dated_entries(&directory, &engine);

        let statement = generator
            .statement(
                cash,
                DateRange::new(Some(date(2024, 2, 1)), None),
            )
            .unwrap();

        assert_eq!(statement.opening_balance, Money::from_major(70));
        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.closing_balance, Money::from_major(90));
    }

    #[test]
    fn empty_range_closes_at_the_opening_balance() {
        let (directory, engine, generator) = setup();
        let cash = seed_dated_entries(&directory, &engine);

        let statement = generator
            .statement(
                cash,
                DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 3, 31))),
            )
            .unwrap();

        assert!(statement.entries.is_empty());
        assert_eq!(statement.opening_balance, Money::from_major(90));
        assert_eq!(statement.closing_balance, Money::from_major(90));
    }

    #[test]
    fn unknown_account_is_not_found() {
        let (_, _, generator) = setup();
        let err = generator
            .statement(AccountId::new(), DateRange::default())
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn customer_statement_breakdown_reconciles_with_the_closing_balance() {
        let (directory, engine, generator) = setup();
        let customer_id = CustomerId::new();
        let sale_id = SaleId::new();

        engine
            .post(BusinessEvent::Sale(SaleEvent {
                sale_id,
                customer_id,
                customer_name: "Asha Traders".to_string(),
                quantity: 10,
                selling_price: Money::new(dec!(20.00)),
                cost_price: Money::new(dec!(12.00)),
                paid_amount: Money::new(dec!(50.00)),
                method: PaymentMethod::Cash,
                date: date(2024, 8, 1),
                narration: None,
            }))
            .unwrap();
        engine
            .post(BusinessEvent::Payment(PaymentEvent {
                counterparty: Counterparty::Customer(customer_id),
                amount: Money::new(dec!(40.00)),
                method: PaymentMethod::Bank,
                date: date(2024, 8, 5),
                narration: None,
            }))
            .unwrap();
        engine
            .post(BusinessEvent::SalesReturn(SalesReturnEvent {
                sale_id,
                return_quantity: 2,
                refund: Refund::Credit,
                date: date(2024, 8, 9),
                narration: None,
            }))
            .unwrap();

        let account = directory.customer_account(customer_id).unwrap();
        let statement = generator
            .statement(account.id, DateRange::default())
            .unwrap();

        let breakdown = statement.breakdown.unwrap();
        assert_eq!(breakdown.total_sales, Money::from_major(200));
        assert_eq!(breakdown.total_payments, Money::from_major(90));
        assert_eq!(breakdown.total_returns, Money::from_major(40));
        assert_eq!(breakdown.total_purchases, Money::ZERO);

        // opening + sales - payments - returns == closing
        assert_eq!(
            statement.opening_balance + breakdown.total_sales
                - breakdown.total_payments
                - breakdown.total_returns,
            statement.closing_balance
        );
        assert_eq!(statement.closing_balance, Money::from_major(70));
    }
}
