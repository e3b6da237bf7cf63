//! Remaining-returnable bookkeeping for sales and purchases.

use std::collections::HashMap;

use shopbooks_core::{AccountId, LedgerError, LedgerResult, Money, PurchaseId, SaleId};

/// What the engine remembers about a posted sale or purchase so later
/// returns can be priced and bounded.
#[derive(Debug, Clone)]
pub(crate) struct Returnable {
    pub account_id: AccountId,
    pub unit_price: Money,
    /// Unit cost at sale time; `None` for purchases.
    pub cost_price: Option<Money>,
    pub quantity: i64,
    pub returned: i64,
}

impl Returnable {
    pub fn remaining(&self) -> i64 {
        self.quantity - self.returned
    }
}

/// Tracks returnable quantity per originating sale/purchase: original
/// quantity minus quantity already returned across all prior returns.
#[derive(Debug, Default)]
pub(crate) struct ReturnTracker {
    sales: HashMap<SaleId, Returnable>,
    purchases: HashMap<PurchaseId, Returnable>,
}

impl ReturnTracker {
    pub fn register_sale(
        &mut self,
        sale_id: SaleId,
        account_id: AccountId,
        unit_price: Money,
        cost_price: Money,
        quantity: i64,
    ) -> LedgerResult<()> {
        if self.sales.contains_key(&sale_id) {
            return Err(LedgerError::validation(format!(
                "sale {sale_id} already posted"
            )));
        }
        self.sales.insert(
            sale_id,
            Returnable {
                account_id,
                unit_price,
                cost_price: Some(cost_price),
                quantity,
                returned: 0,
            },
        );
        Ok(())
    }

    pub fn register_purchase(
        &mut self,
        purchase_id: PurchaseId,
        account_id: AccountId,
        unit_price: Money,
        quantity: i64,
    ) -> LedgerResult<()> {
        if self.purchases.contains_key(&purchase_id) {
            return Err(LedgerError::validation(format!(
                "purchase {purchase_id} already posted"
            )));
        }
        self.purchases.insert(
            purchase_id,
            Returnable {
                account_id,
                unit_price,
                cost_price: None,
                quantity,
                returned: 0,
            },
        );
        Ok(())
    }

    /// Verify a sale id has not been posted yet (checked before any write).
    pub fn check_sale_unposted(&self, sale_id: SaleId) -> LedgerResult<()> {
        if self.sales.contains_key(&sale_id) {
            return Err(LedgerError::validation(format!(
                "sale {sale_id} already posted"
            )));
        }
        Ok(())
    }

    pub fn check_purchase_unposted(&self, purchase_id: PurchaseId) -> LedgerResult<()> {
        if self.purchases.contains_key(&purchase_id) {
            return Err(LedgerError::validation(format!(
                "purchase {purchase_id} already posted"
            )));
        }
        Ok(())
    }

    /// Look up a sale and verify the requested quantity is still returnable.
    pub fn check_sale_return(&self, sale_id: SaleId, quantity: i64) -> LedgerResult<&Returnable> {
        let returnable = self
            .sales
            .get(&sale_id)
            .ok_or_else(|| LedgerError::not_found(format!("sale {sale_id}")))?;
        Self::check_bound(returnable, quantity)
    }

    pub fn check_purchase_return(
        &self,
        purchase_id: PurchaseId,
        quantity: i64,
    ) -> LedgerResult<&Returnable> {
        let returnable = self
            .purchases
            .get(&purchase_id)
            .ok_or_else(|| LedgerError::not_found(format!("purchase {purchase_id}")))?;
        Self::check_bound(returnable, quantity)
    }

    /// Record a committed return. Call only after the posting was applied.
    pub fn commit_sale_return(&mut self, sale_id: SaleId, quantity: i64) {
        if let Some(returnable) = self.sales.get_mut(&sale_id) {
            returnable.returned += quantity;
        }
    }

    pub fn commit_purchase_return(&mut self, purchase_id: PurchaseId, quantity: i64) {
        if let Some(returnable) = self.purchases.get_mut(&purchase_id) {
            returnable.returned += quantity;
        }
    }

    pub fn remaining_sale_quantity(&self, sale_id: SaleId) -> LedgerResult<i64> {
        self.sales
            .get(&sale_id)
            .map(Returnable::remaining)
            .ok_or_else(|| LedgerError::not_found(format!("sale {sale_id}")))
    }

    fn check_bound(returnable: &Returnable, quantity: i64) -> LedgerResult<&Returnable> {
        if quantity <= 0 {
            return Err(LedgerError::validation(
                "return quantity must be positive",
            ));
        }
        let remaining = returnable.remaining();
        if quantity > remaining {
            return Err(LedgerError::OverReturn {
                requested: quantity,
                remaining,
            });
        }
        Ok(returnable)
    }
}
