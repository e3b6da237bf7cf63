//! Translates business events into balanced postings and applies them.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use shopbooks_core::{LedgerError, LedgerResult, Money, SaleId};

use crate::account::SystemAccount;
use crate::directory::AccountDirectory;
use crate::entry::{EntryDraft, LedgerEntry, Posting, SourceRef, TransactionType};
use crate::event::{
    AdjustmentEvent, BusinessEvent, Counterparty, PaymentEvent, PurchaseEvent,
    PurchaseReturnEvent, Refund, SaleEvent, SalesReturnEvent, TransferEvent,
};
use crate::returns::ReturnTracker;
use crate::store::LedgerStore;

/// What a successful posting produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    pub transaction_type: TransactionType,
    pub entries: Vec<LedgerEntry>,
    /// For sales returns: return quantity times the original unit cost.
    /// Reported to the caller for P&L correction, not posted to the ledger.
    pub profit_adjustment: Option<Money>,
}

/// Translates each business event into a balanced set of ledger entries and
/// applies them to account balances in one atomic unit.
///
/// All validation happens before any write; `LedgerStore::append` is
/// all-or-nothing, so a failed posting leaves no partial state. Postings are
/// serialized through the engine so a return's check-then-commit against the
/// remaining-returnable quantity cannot interleave with another return.
#[derive(Debug)]
pub struct PostingEngine {
    directory: Arc<AccountDirectory>,
    store: Arc<LedgerStore>,
    returns: Mutex<ReturnTracker>,
}

impl PostingEngine {
    pub fn new(directory: Arc<AccountDirectory>, store: Arc<LedgerStore>) -> Self {
        Self {
            directory,
            store,
            returns: Mutex::new(ReturnTracker::default()),
        }
    }

    /// Post one business event.
    ///
    /// Either every entry is written and every affected balance updated, or
    /// the event is rejected with a typed error and nothing changes.
    pub fn post(&self, event: BusinessEvent) -> LedgerResult<PostingReceipt> {
        let transaction_type = event.transaction_type();
        let mut tracker = self.lock_returns()?;

        let receipt = match event {
            BusinessEvent::Sale(e) => self.post_sale(&mut tracker, e),
            BusinessEvent::Purchase(e) => self.post_purchase(&mut tracker, e),
            BusinessEvent::Payment(e) => self.post_payment(e),
            BusinessEvent::SalesReturn(e) => self.post_sales_return(&mut tracker, e),
            BusinessEvent::PurchaseReturn(e) => self.post_purchase_return(&mut tracker, e),
            BusinessEvent::Transfer(e) => self.post_transfer(e),
            BusinessEvent::Adjustment(e) => self.post_adjustment(e),
        }?;

        tracing::info!(
            %transaction_type,
            entries = receipt.entries.len(),
            "business event posted"
        );
        Ok(receipt)
    }

    /// Remaining returnable quantity for a posted sale.
    pub fn remaining_returnable(&self, sale_id: SaleId) -> LedgerResult<i64> {
        self.lock_returns()?.remaining_sale_quantity(sale_id)
    }

    fn post_sale(
        &self,
        tracker: &mut ReturnTracker,
        event: SaleEvent,
    ) -> LedgerResult<PostingReceipt> {
        validate_quantity(event.quantity)?;
        validate_unit_price(event.selling_price, "selling_price")?;
        if event.cost_price.is_negative() {
            return Err(LedgerError::validation("cost_price must not be negative"));
        }
        if event.paid_amount.is_negative() {
            return Err(LedgerError::validation("paid_amount must not be negative"));
        }

        let total = event.selling_price.times(event.quantity);
        if event.paid_amount > total {
            return Err(LedgerError::Overpayment {
                amount: event.paid_amount,
                outstanding: total,
            });
        }

        let customer = self
            .directory
            .get_or_create_customer_account(event.customer_id, &event.customer_name)?;
        let revenue = self.directory.system_account_id(SystemAccount::Revenue)?;
        let settlement = self
            .directory
            .system_account_id(event.method.system_account())?;

        let narration = event.narration.unwrap_or_else(|| {
            format!(
                "Sale of {} x {} to {}",
                event.quantity, event.selling_price, event.customer_name
            )
        });
        let reference = Some(SourceRef::new(TransactionType::Sale, event.sale_id));

        let mut drafts = vec![
            EntryDraft::debit(
                customer.id,
                event.date,
                TransactionType::Sale,
                narration.clone(),
                total,
                reference,
            ),
            EntryDraft::credit(
                revenue,
                event.date,
                TransactionType::Sale,
                narration.clone(),
                total,
                reference,
            ),
        ];
        if event.paid_amount.is_positive() {
            drafts.push(EntryDraft::debit(
                settlement,
                event.date,
                TransactionType::Sale,
                narration.clone(),
                event.paid_amount,
                reference,
            ));
            drafts.push(EntryDraft::credit(
                customer.id,
                event.date,
                TransactionType::Sale,
                narration,
                event.paid_amount,
                reference,
            ));
        }

        // Reject duplicate sale ids before writing anything.
        tracker.check_sale_unposted(event.sale_id)?;
        let entries = self.store.append(Posting::new(drafts)?)?;
        tracker.register_sale(
            event.sale_id,
            customer.id,
            event.selling_price,
            event.cost_price,
            event.quantity,
        )?;

        Ok(PostingReceipt {
            transaction_type: TransactionType::Sale,
            entries,
            profit_adjustment: None,
        })
    }

    fn post_purchase(
        &self,
        tracker: &mut ReturnTracker,
        event: PurchaseEvent,
    ) -> LedgerResult<PostingReceipt> {
        validate_quantity(event.quantity)?;
        validate_unit_price(event.purchase_price, "purchase_price")?;
        if event.paid_amount.is_negative() {
            return Err(LedgerError::validation("paid_amount must not be negative"));
        }

        let total = event.purchase_price.times(event.quantity);
        if event.paid_amount > total {
            return Err(LedgerError::Overpayment {
                amount: event.paid_amount,
                outstanding: total,
            });
        }

        let supplier = self
            .directory
            .get_or_create_supplier_account(event.supplier_id, &event.supplier_name)?;
        let expense = self.directory.system_account_id(SystemAccount::Expense)?;
        let settlement = self
            .directory
            .system_account_id(event.method.system_account())?;

        let narration = event.narration.unwrap_or_else(|| {
            format!(
                "Purchase of {} x {} from {}",
                event.quantity, event.purchase_price, event.supplier_name
            )
        });
        let reference = Some(SourceRef::new(
            TransactionType::Purchase,
            event.purchase_id,
        ));

        let mut drafts = vec![
            EntryDraft::debit(
                expense,
                event.date,
                TransactionType::Purchase,
                narration.clone(),
                total,
                reference,
            ),
            EntryDraft::credit(
                supplier.id,
                event.date,
                TransactionType::Purchase,
                narration.clone(),
                total,
                reference,
            ),
        ];
        if event.paid_amount.is_positive() {
            drafts.push(EntryDraft::debit(
                supplier.id,
                event.date,
                TransactionType::Purchase,
                narration.clone(),
                event.paid_amount,
                reference,
            ));
            drafts.push(EntryDraft::credit(
                settlement,
                event.date,
                TransactionType::Purchase,
                narration,
                event.paid_amount,
                reference,
            ));
        }

        tracker.check_purchase_unposted(event.purchase_id)?;
        let entries = self.store.append(Posting::new(drafts)?)?;
        tracker.register_purchase(
            event.purchase_id,
            supplier.id,
            event.purchase_price,
            event.quantity,
        )?;

        Ok(PostingReceipt {
            transaction_type: TransactionType::Purchase,
            entries,
            profit_adjustment: None,
        })
    }

    fn post_payment(&self, event: PaymentEvent) -> LedgerResult<PostingReceipt> {
        if !event.amount.is_positive() {
            return Err(LedgerError::validation("payment amount must be positive"));
        }
        let settlement = self
            .directory
            .system_account_id(event.method.system_account())?;

        let drafts;
        match event.counterparty {
            Counterparty::Customer(customer_id) => {
                let account = self.directory.customer_account(customer_id)?;
                // Receivable: what the customer still owes.
                let outstanding = account.balance();
                if event.amount > outstanding {
                    return Err(LedgerError::Overpayment {
                        amount: event.amount,
                        outstanding,
                    });
                }
                let narration = event
                    .narration
                    .unwrap_or_else(|| format!("Payment received from {}", account.name));
                drafts = vec![
                    EntryDraft::debit(
                        settlement,
                        event.date,
                        TransactionType::Payment,
                        narration.clone(),
                        event.amount,
                        None,
                    ),
                    EntryDraft::credit(
                        account.id,
                        event.date,
                        TransactionType::Payment,
                        narration,
                        event.amount,
                        None,
                    ),
                ];
            }
            Counterparty::Supplier(supplier_id) => {
                let account = self.directory.supplier_account(supplier_id)?;
                // Payable: supplier balances run negative when we owe them.
                let outstanding = -account.balance();
                if event.amount > outstanding {
                    return Err(LedgerError::Overpayment {
                        amount: event.amount,
                        outstanding,
                    });
                }
                let narration = event
                    .narration
                    .unwrap_or_else(|| format!("Payment made to {}", account.name));
                drafts = vec![
                    EntryDraft::debit(
                        account.id,
                        event.date,
                        TransactionType::Payment,
                        narration.clone(),
                        event.amount,
                        None,
                    ),
                    EntryDraft::credit(
                        settlement,
                        event.date,
                        TransactionType::Payment,
                        narration,
                        event.amount,
                        None,
                    ),
                ];
            }
        }

        let entries = self.store.append(Posting::new(drafts)?)?;
        Ok(PostingReceipt {
            transaction_type: TransactionType::Payment,
            entries,
            profit_adjustment: None,
        })
    }

    fn post_sales_return(
        &self,
        tracker: &mut ReturnTracker,
        event: SalesReturnEvent,
    ) -> LedgerResult<PostingReceipt> {
        let returnable = tracker.check_sale_return(event.sale_id, event.return_quantity)?;
        let refund_amount = returnable.unit_price.times(event.return_quantity);
        let profit_adjustment = returnable
            .cost_price
            .map(|cost| cost.times(event.return_quantity));
        let customer_account = returnable.account_id;

        let revenue = self.directory.system_account_id(SystemAccount::Revenue)?;
        let narration = event
            .narration
            .unwrap_or_else(|| format!("Return of {} units sold", event.return_quantity));
        let reference = Some(SourceRef::new(TransactionType::SalesReturn, event.sale_id));

        // Reverse the sale's revenue; settle either in money or against the
        // customer's receivable.
        let settlement = match event.refund {
            Refund::Cash => self.directory.system_account_id(SystemAccount::Cash)?,
            Refund::Bank => self.directory.system_account_id(SystemAccount::Bank)?,
            Refund::Credit => customer_account,
        };
        let drafts = vec![
            EntryDraft::debit(
                revenue,
                event.date,
                TransactionType::SalesReturn,
                narration.clone(),
                refund_amount,
                reference,
            ),
            EntryDraft::credit(
                settlement,
                event.date,
                TransactionType::SalesReturn,
                narration,
                refund_amount,
                reference,
            ),
        ];

        let entries = self.store.append(Posting::new(drafts)?)?;
        tracker.commit_sale_return(event.sale_id, event.return_quantity);

        Ok(PostingReceipt {
            transaction_type: TransactionType::SalesReturn,
            entries,
            profit_adjustment,
        })
    }

    fn post_purchase_return(
        &self,
        tracker: &mut ReturnTracker,
        event: PurchaseReturnEvent,
    ) -> LedgerResult<PostingReceipt> {
        let returnable =
            tracker.check_purchase_return(event.purchase_id, event.return_quantity)?;
        let refund_amount = returnable.unit_price.times(event.return_quantity);
        let supplier_account = returnable.account_id;

        let expense = self.directory.system_account_id(SystemAccount::Expense)?;
        let narration = event
            .narration
            .unwrap_or_else(|| format!("Return of {} units purchased", event.return_quantity));
        let reference = Some(SourceRef::new(
            TransactionType::PurchaseReturn,
            event.purchase_id,
        ));

        // Reverse the purchase's expense; take the refund in money or as a
        // reduction of what we owe the supplier.
        let settlement = match event.refund {
            Refund::Cash => self.directory.system_account_id(SystemAccount::Cash)?,
            Refund::Bank => self.directory.system_account_id(SystemAccount::Bank)?,
            Refund::Credit => supplier_account,
        };
        let drafts = vec![
            EntryDraft::debit(
                settlement,
                event.date,
                TransactionType::PurchaseReturn,
                narration.clone(),
                refund_amount,
                reference,
            ),
            EntryDraft::credit(
                expense,
                event.date,
                TransactionType::PurchaseReturn,
                narration,
                refund_amount,
                reference,
            ),
        ];

        let entries = self.store.append(Posting::new(drafts)?)?;
        tracker.commit_purchase_return(event.purchase_id, event.return_quantity);

        Ok(PostingReceipt {
            transaction_type: TransactionType::PurchaseReturn,
            entries,
            profit_adjustment: None,
        })
    }

    fn post_transfer(&self, event: TransferEvent) -> LedgerResult<PostingReceipt> {
        if event.from_account == event.to_account {
            return Err(LedgerError::validation(
                "transfer endpoints must be distinct accounts",
            ));
        }
        if !event.amount.is_positive() {
            return Err(LedgerError::validation("transfer amount must be positive"));
        }
        for account_id in [event.from_account, event.to_account] {
            if !self.directory.contains(account_id)? {
                return Err(LedgerError::not_found(format!("account {account_id}")));
            }
        }

        let narration = event
            .narration
            .unwrap_or_else(|| format!("Transfer of {}", event.amount));
        let drafts = vec![
            EntryDraft::debit(
                event.to_account,
                event.date,
                TransactionType::Transfer,
                narration.clone(),
                event.amount,
                None,
            ),
            EntryDraft::credit(
                event.from_account,
                event.date,
                TransactionType::Transfer,
                narration,
                event.amount,
                None,
            ),
        ];

        let entries = self.store.append(Posting::new(drafts)?)?;
        Ok(PostingReceipt {
            transaction_type: TransactionType::Transfer,
            entries,
            profit_adjustment: None,
        })
    }

    fn post_adjustment(&self, event: AdjustmentEvent) -> LedgerResult<PostingReceipt> {
        if event.debit_account == event.credit_account {
            return Err(LedgerError::validation(
                "adjustment must involve two distinct accounts",
            ));
        }
        if !event.amount.is_positive() {
            return Err(LedgerError::validation(
                "adjustment amount must be positive",
            ));
        }
        for account_id in [event.debit_account, event.credit_account] {
            if !self.directory.contains(account_id)? {
                return Err(LedgerError::not_found(format!("account {account_id}")));
            }
        }

        let narration = event
            .narration
            .unwrap_or_else(|| "Manual adjustment".to_string());
        let drafts = vec![
            EntryDraft::debit(
                event.debit_account,
                event.date,
                TransactionType::Adjustment,
                narration.clone(),
                event.amount,
                None,
            ),
            EntryDraft::credit(
                event.credit_account,
                event.date,
                TransactionType::Adjustment,
                narration,
                event.amount,
                None,
            ),
        ];

        let entries = self.store.append(Posting::new(drafts)?)?;
        Ok(PostingReceipt {
            transaction_type: TransactionType::Adjustment,
            entries,
            profit_adjustment: None,
        })
    }

    fn lock_returns(&self) -> LedgerResult<MutexGuard<'_, ReturnTracker>> {
        self.returns
            .lock()
            .map_err(|_| LedgerError::conflict("return tracker lock poisoned"))
    }
}

fn validate_quantity(quantity: i64) -> LedgerResult<()> {
    if quantity <= 0 {
        return Err(LedgerError::validation("quantity must be positive"));
    }
    Ok(())
}

fn validate_unit_price(price: Money, field: &str) -> LedgerResult<()> {
    if !price.is_positive() {
        return Err(LedgerError::validation(format!(
            "{field} must be positive"
        )));
    }
    Ok(())
}
