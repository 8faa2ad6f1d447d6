//! crates/bankchat_core/src/import.rs
//!
//! Bulk import: upserts already-parsed tabular rows into the record store
//! under a per-row identity key. Rows reach this module fully coerced; the
//! ingestion layer owns string-to-value conversion.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{FileType, Investment, PaymentMethod, RiskLevel, Transaction};
use crate::ports::{PortError, PortResult, RecordStore};

/// A parsed transaction row. Optional fields take documented defaults when
/// absent from the source file.
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub category: String,
    pub merchant: String,
    pub amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
}

/// A parsed investment row.
#[derive(Debug, Clone)]
pub struct InvestmentRow {
    pub investment_id: String,
    pub product_type: String,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub invested_amount: Decimal,
    pub current_value: Decimal,
    pub units: Option<Decimal>,
    pub purchase_nav: Option<Decimal>,
    pub current_nav: Option<Decimal>,
    pub returns_absolute: Decimal,
    pub returns_percentage: Decimal,
    pub risk_level: RiskLevel,
}

/// Rows of one uploaded file, already typed per file kind.
#[derive(Debug, Clone)]
pub enum RowSet {
    Transactions(Vec<TransactionRow>),
    Investments(Vec<InvestmentRow>),
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::Transactions(rows) => rows.len(),
            RowSet::Investments(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn RecordStore>,
}

impl ImportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Upserts every row with create-if-absent semantics: a row whose
    /// identity key already exists is a no-op, but still counts toward the
    /// returned total. Row processing is sequential; the first storage error
    /// fails the whole call.
    pub async fn import_rows(
        &self,
        file_type: FileType,
        customer_id: &str,
        rows: RowSet,
    ) -> PortResult<u32> {
        let count = match (file_type, rows) {
            (FileType::Transaction, RowSet::Transactions(rows)) => {
                self.import_transactions(customer_id, rows).await?
            }
            (FileType::Investment, RowSet::Investments(rows)) => {
                self.import_investments(customer_id, rows).await?
            }
            (file_type, _) => {
                return Err(PortError::Invalid(format!(
                    "unsupported import file type '{}'",
                    file_type.as_str()
                )))
            }
        };

        info!("imported {count} rows for customer {customer_id}");
        Ok(count)
    }

    async fn import_transactions(
        &self,
        customer_id: &str,
        rows: Vec<TransactionRow>,
    ) -> PortResult<u32> {
        let mut count = 0u32;
        for row in rows {
            let transaction = Transaction {
                transaction_id: row.transaction_id,
                customer_id: customer_id.to_string(),
                date: row.date,
                category: row.category,
                merchant: row.merchant,
                amount: row.amount,
                payment_method: row.payment_method.unwrap_or(PaymentMethod::Upi),
                description: row.description.unwrap_or_default(),
                created_at: Utc::now(),
            };
            self.store.insert_transaction_if_absent(transaction).await?;
            count += 1;
        }
        Ok(count)
    }

    async fn import_investments(
        &self,
        customer_id: &str,
        rows: Vec<InvestmentRow>,
    ) -> PortResult<u32> {
        let now = Utc::now();
        let mut count = 0u32;
        for row in rows {
            let investment = Investment {
                investment_id: row.investment_id,
                customer_id: customer_id.to_string(),
                product_type: row.product_type,
                product_name: row.product_name,
                purchase_date: row.purchase_date,
                invested_amount: row.invested_amount,
                current_value: row.current_value,
                units: row.units.unwrap_or(Decimal::ZERO),
                purchase_nav: row.purchase_nav.unwrap_or(Decimal::ZERO),
                current_nav: row.current_nav.unwrap_or(Decimal::ZERO),
                returns_absolute: row.returns_absolute,
                returns_percentage: row.returns_percentage,
                risk_level: row.risk_level,
                created_at: now,
                updated_at: now,
            };
            self.store.insert_investment_if_absent(investment).await?;
            count += 1;
        }
        Ok(count)
    }
}
