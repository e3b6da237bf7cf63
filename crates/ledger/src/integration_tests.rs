//! End-to-end scenarios across the directory, engine and store.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use shopbooks_core::{CustomerId, LedgerError, Money, SaleId, SupplierId};

use crate::account::SystemAccount;
use crate::directory::AccountDirectory;
use crate::engine::PostingEngine;
use crate::event::{
    BusinessEvent, Counterparty, PaymentEvent, PaymentMethod, PurchaseEvent, Refund, SaleEvent,
    SalesReturnEvent, TransferEvent,
};
use crate::store::{DateRange, LedgerStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (Arc<AccountDirectory>, Arc<LedgerStore>, PostingEngine) {
    shopbooks_observability::init();
    let directory = Arc::new(AccountDirectory::new());
    let store = Arc::new(LedgerStore::new(Arc::clone(&directory)));
    let engine = PostingEngine::new(Arc::clone(&directory), Arc::clone(&store));
    (directory, store, engine)
}

fn sale(customer_id: CustomerId, on: NaiveDate, paid: Money) -> BusinessEvent {
    BusinessEvent::Sale(SaleEvent {
        sale_id: SaleId::new(),
        customer_id,
        customer_name: "Asha Traders".to_string(),
        quantity: 5,
        selling_price: Money::new(dec!(20.00)),
        cost_price: Money::new(dec!(12.00)),
        paid_amount: paid,
        method: PaymentMethod::Cash,
        date: on,
        narration: None,
    })
}

#[test]
fn a_trading_day_keeps_every_balance_consistent_with_the_log() {
    let (directory, store, engine) = setup();
    let customer_id = CustomerId::new();
    let supplier_id = SupplierId::new();

    engine
        .post(BusinessEvent::Purchase(PurchaseEvent {
            purchase_id: shopbooks_core::PurchaseId::new(),
            supplier_id,
            supplier_name: "Metro Wholesale".to_string(),
            quantity: 20,
            purchase_price: Money::new(dec!(12.00)),
            paid_amount: Money::new(dec!(100.00)),
            method: PaymentMethod::Bank,
            date: date(2024, 5, 1),
            narration: None,
        }))
        .unwrap();
    engine
        .post(sale(customer_id, date(2024, 5, 2), Money::new(dec!(40.00))))
        .unwrap();
    engine
        .post(BusinessEvent::Payment(PaymentEvent {
            counterparty: Counterparty::Customer(customer_id),
            amount: Money::new(dec!(60.00)),
            method: PaymentMethod::Cash,
            date: date(2024, 5, 3),
            narration: None,
        }))
        .unwrap();
    engine
        .post(BusinessEvent::Payment(PaymentEvent {
            counterparty: Counterparty::Supplier(supplier_id),
            amount: Money::new(dec!(140.00)),
            method: PaymentMethod::Bank,
            date: date(2024, 5, 4),
            narration: None,
        }))
        .unwrap();

    let mut system_total = Money::ZERO;
    for account in directory.list_all(None).unwrap() {
        assert_eq!(
            store.recompute_balance(account.id).unwrap(),
            account.balance(),
            "cached balance diverged for {}",
            account.name
        );
        system_total += account.balance();
    }
    assert_eq!(system_total, Money::ZERO);

    // Customer settled in full, supplier paid exactly what was owed.
    assert_eq!(
        directory.customer_account(customer_id).unwrap().balance(),
        Money::ZERO
    );
    assert_eq!(
        directory.supplier_account(supplier_id).unwrap().balance(),
        Money::ZERO
    );
}

#[test]
fn failed_postings_leave_no_trace_in_the_log() {
    let (directory, store, engine) = setup();
    let customer_id = CustomerId::new();
    engine
        .post(sale(customer_id, date(2024, 5, 2), Money::ZERO))
        .unwrap();
    let baseline = store
        .entries(&crate::store::EntryFilter::default())
        .unwrap()
        .len();

    // Overpayment, over-return and bad transfer all rejected.
    assert!(
        engine
            .post(BusinessEvent::Payment(PaymentEvent {
                counterparty: Counterparty::Customer(customer_id),
                amount: Money::new(dec!(500.00)),
                method: PaymentMethod::Cash,
                date: date(2024, 5, 3),
                narration: None,
            }))
            .is_err()
    );
    let cash = directory.system_account_id(SystemAccount::Cash).unwrap();
    assert!(
        engine
            .post(BusinessEvent::Transfer(TransferEvent {
                from_account: cash,
                to_account: cash,
                amount: Money::from_major(5),
                date: date(2024, 5, 3),
                narration: None,
            }))
            .is_err()
    );

    assert_eq!(
        store
            .entries(&crate::store::EntryFilter::default())
            .unwrap()
            .len(),
        baseline
    );
}

#[test]
fn balance_after_snapshots_are_immutable_history() {
    let (_, store, engine) = setup();
    let customer_id = CustomerId::new();

    let first = engine
        .post(sale(customer_id, date(2024, 5, 2), Money::ZERO))
        .unwrap();
    let customer_account = first.entries[0].account_id;
    assert_eq!(first.entries[0].balance_after, Money::from_major(100));

    // A later correction does not rewrite the earlier snapshot.
    engine
        .post(sale(customer_id, date(2024, 5, 3), Money::ZERO))
        .unwrap();
    let entries = store
        .entries_for_account(customer_account, DateRange::default())
        .unwrap();
    assert_eq!(entries[0].balance_after, Money::from_major(100));
    assert_eq!(entries[1].balance_after, Money::from_major(200));
}

#[test]
fn sales_return_after_partial_return_respects_the_remaining_bound() {
    let (_, _, engine) = setup();
    let customer_id = CustomerId::new();
    let event = sale(customer_id, date(2024, 5, 2), Money::ZERO);
    let sale_id = match &event {
        BusinessEvent::Sale(e) => e.sale_id,
        _ => unreachable!(),
    };
    engine.post(event).unwrap();

    engine
        .post(BusinessEvent::SalesReturn(SalesReturnEvent {
            sale_id,
            return_quantity: 3,
            refund: Refund::Credit,
            date: date(2024, 5, 4),
            narration: None,
        }))
        .unwrap();
    assert_eq!(engine.remaining_returnable(sale_id).unwrap(), 2);

    let err = engine
        .post(BusinessEvent::SalesReturn(SalesReturnEvent {
            sale_id,
            return_quantity: 3,
            refund: Refund::Credit,
            date: date(2024, 5, 5),
            narration: None,
        }))
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::OverReturn {
            requested: 3,
            remaining: 2
        }
    );
}

#[test]
fn concurrent_payments_against_one_customer_serialize_without_lost_updates() {
    let (directory, _, engine) = setup();
    let engine = Arc::new(engine);
    let customer_id = CustomerId::new();

    // 100.00 outstanding, ten threads each trying to pay 10.00.
    engine
        .post(sale(customer_id, date(2024, 5, 2), Money::ZERO))
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.post(BusinessEvent::Payment(PaymentEvent {
                    counterparty: Counterparty::Customer(customer_id),
                    amount: Money::new(dec!(10.00)),
                    method: PaymentMethod::Cash,
                    date: date(2024, 5, 3),
                    narration: None,
                }))
            })
        })
        .collect();
    for handle in handles {
        // Every payment fits within the outstanding balance.
        handle.join().unwrap().unwrap();
    }

    assert_eq!(
        directory.customer_account(customer_id).unwrap().balance(),
        Money::ZERO
    );
}

#[test]
fn concurrent_sales_to_a_new_customer_share_one_account() {
    let (directory, _, engine) = setup();
    let engine = Arc::new(engine);
    let customer_id = CustomerId::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .post(sale(customer_id, date(2024, 5, 2), Money::ZERO))
                    .unwrap()
            })
        })
        .collect();
    let receipts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let account_ids: Vec<_> = receipts.iter().map(|r| r.entries[0].account_id).collect();
    assert!(account_ids.iter().all(|id| *id == account_ids[0]));
    assert_eq!(
        directory
            .list_all(Some(crate::account::AccountType::Customer))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        directory.customer_account(customer_id).unwrap().balance(),
        Money::from_major(800)
    );
}
