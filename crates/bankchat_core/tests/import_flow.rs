//! Bulk import tests: create-if-absent semantics, defaulting, and the
//! unsupported-type rejection.

mod support;

use std::sync::Arc;

use rust_decimal::Decimal;

use bankchat_core::domain::{FileType, PaymentMethod};
use bankchat_core::import::{ImportService, InvestmentRow, RowSet, TransactionRow};
use bankchat_core::ports::{PortError, RecordStore};

use support::{customer, MemoryStore};

fn transaction_row(id: &str) -> TransactionRow {
    TransactionRow {
        transaction_id: id.to_string(),
        date: "2024-02-01".parse().unwrap(),
        category: "groceries".to_string(),
        merchant: "Big Bazaar".to_string(),
        amount: Decimal::from(450),
        payment_method: None,
        description: None,
    }
}

fn investment_row(id: &str) -> InvestmentRow {
    InvestmentRow {
        investment_id: id.to_string(),
        product_type: "mutual_fund".to_string(),
        product_name: "Bluechip Growth".to_string(),
        purchase_date: "2023-07-01".parse().unwrap(),
        invested_amount: Decimal::from(10000),
        current_value: Decimal::from(11500),
        units: None,
        purchase_nav: None,
        current_nav: None,
        returns_absolute: Decimal::from(1500),
        returns_percentage: "15.00".parse().unwrap(),
        risk_level: "medium".parse().unwrap(),
    }
}

#[tokio::test]
async fn importing_the_same_row_twice_is_a_counted_no_op() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let import = ImportService::new(store.clone());

    let first = import
        .import_rows(
            FileType::Transaction,
            "C1",
            RowSet::Transactions(vec![transaction_row("T1")]),
        )
        .await
        .unwrap();
    let stored_before = store.stored_transaction("T1").unwrap();

    let second = import
        .import_rows(
            FileType::Transaction,
            "C1",
            RowSet::Transactions(vec![transaction_row("T1")]),
        )
        .await
        .unwrap();

    // Both calls count the row even though the second was a no-op.
    assert_eq!(first, 1);
    assert_eq!(second, 1);
    assert_eq!(store.transaction_count(), 1);

    let stored_after = store.stored_transaction("T1").unwrap();
    assert_eq!(stored_before.created_at, stored_after.created_at);
    assert_eq!(stored_before.amount, stored_after.amount);
}

#[tokio::test]
async fn absent_optional_fields_take_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let import = ImportService::new(store.clone());

    import
        .import_rows(
            FileType::Transaction,
            "C1",
            RowSet::Transactions(vec![transaction_row("T1")]),
        )
        .await
        .unwrap();
    import
        .import_rows(
            FileType::Investment,
            "C1",
            RowSet::Investments(vec![investment_row("I1")]),
        )
        .await
        .unwrap();

    let transaction = store.stored_transaction("T1").unwrap();
    assert_eq!(transaction.payment_method, PaymentMethod::Upi);
    assert_eq!(transaction.description, "");
    assert_eq!(transaction.customer_id, "C1");

    let investment = store.stored_investment("I1").unwrap();
    assert_eq!(investment.units, Decimal::ZERO);
    assert_eq!(investment.purchase_nav, Decimal::ZERO);
    assert_eq!(investment.current_nav, Decimal::ZERO);
    // Supplied returns are stored verbatim, never recomputed.
    assert_eq!(investment.returns_percentage, "15.00".parse().unwrap());
}

#[tokio::test]
async fn mixed_batches_count_every_row() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let import = ImportService::new(store.clone());

    let rows = vec![
        transaction_row("T1"),
        transaction_row("T2"),
        transaction_row("T1"), // duplicate inside one batch
    ];
    let count = import
        .import_rows(FileType::Transaction, "C1", RowSet::Transactions(rows))
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(store.transaction_count(), 2);
}

#[tokio::test]
async fn unsupported_file_types_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let import = ImportService::new(store);

    let result = import
        .import_rows(
            FileType::Document,
            "C1",
            RowSet::Transactions(vec![transaction_row("T1")]),
        )
        .await;

    assert!(matches!(result, Err(PortError::Invalid(_))));
}

#[tokio::test]
async fn row_kind_must_match_the_declared_type() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let import = ImportService::new(store);

    let result = import
        .import_rows(
            FileType::Investment,
            "C1",
            RowSet::Transactions(vec![transaction_row("T1")]),
        )
        .await;

    assert!(matches!(result, Err(PortError::Invalid(_))));
}
