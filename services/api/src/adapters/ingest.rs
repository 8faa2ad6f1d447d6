//! services/api/src/adapters/ingest.rs
//!
//! CSV ingestion for bulk imports. Raw rows are read with string-typed
//! columns and coerced into the core row types exactly once here; a row
//! missing a required field or carrying an unparseable value fails the whole
//! file.

use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;

use bankchat_core::domain::FileType;
use bankchat_core::import::{InvestmentRow, RowSet, TransactionRow};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row parse error: {0}")]
    Parse(String),
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
}

#[derive(Deserialize)]
struct RawTransactionRow {
    transaction_id: String,
    date: String,
    category: String,
    merchant: String,
    amount: String,
    payment_method: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawInvestmentRow {
    investment_id: String,
    product_type: String,
    product_name: String,
    purchase_date: String,
    invested_amount: String,
    current_value: String,
    units: Option<String>,
    purchase_nav: Option<String>,
    current_nav: Option<String>,
    returns_absolute: String,
    returns_percentage: String,
    risk_level: String,
}

/// Parses an uploaded file's bytes into typed rows for the import service.
pub fn parse_rows(file_type: FileType, data: &[u8]) -> Result<RowSet, IngestError> {
    match file_type {
        FileType::Transaction => Ok(RowSet::Transactions(parse_transactions(data)?)),
        FileType::Investment => Ok(RowSet::Investments(parse_investments(data)?)),
        other => Err(IngestError::Unsupported(other.as_str().to_string())),
    }
}

fn parse_transactions(data: &[u8]) -> Result<Vec<TransactionRow>, IngestError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
    let mut rows = Vec::new();

    for record in reader.deserialize::<RawTransactionRow>() {
        let raw = record?;
        rows.push(TransactionRow {
            date: parse_date(&raw.date, "date")?,
            amount: parse_decimal(&raw.amount, "amount")?,
            payment_method: match non_empty(raw.payment_method) {
                Some(value) => Some(
                    value
                        .parse()
                        .map_err(|e: String| IngestError::Parse(e))?,
                ),
                None => None,
            },
            transaction_id: raw.transaction_id,
            category: raw.category,
            merchant: raw.merchant,
            description: non_empty(raw.description),
        });
    }
    Ok(rows)
}

fn parse_investments(data: &[u8]) -> Result<Vec<InvestmentRow>, IngestError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
    let mut rows = Vec::new();

    for record in reader.deserialize::<RawInvestmentRow>() {
        let raw = record?;
        rows.push(InvestmentRow {
            purchase_date: parse_date(&raw.purchase_date, "purchase_date")?,
            invested_amount: parse_decimal(&raw.invested_amount, "invested_amount")?,
            current_value: parse_decimal(&raw.current_value, "current_value")?,
            units: parse_optional_decimal(raw.units, "units")?,
            purchase_nav: parse_optional_decimal(raw.purchase_nav, "purchase_nav")?,
            current_nav: parse_optional_decimal(raw.current_nav, "current_nav")?,
            returns_absolute: parse_decimal(&raw.returns_absolute, "returns_absolute")?,
            returns_percentage: parse_decimal(&raw.returns_percentage, "returns_percentage")?,
            risk_level: raw
                .risk_level
                .parse()
                .map_err(|e: String| IngestError::Parse(e))?,
            investment_id: raw.investment_id,
            product_type: raw.product_type,
            product_name: raw.product_name,
        });
    }
    Ok(rows)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_date(value: &str, column: &str) -> Result<chrono::NaiveDate, IngestError> {
    value
        .trim()
        .parse()
        .map_err(|e| IngestError::Parse(format!("{column}: {e}")))
}

fn parse_decimal(value: &str, column: &str) -> Result<Decimal, IngestError> {
    value
        .trim()
        .parse()
        .map_err(|e| IngestError::Parse(format!("{column}: {e}")))
}

fn parse_optional_decimal(
    value: Option<String>,
    column: &str,
) -> Result<Option<Decimal>, IngestError> {
    match non_empty(value) {
        Some(raw) => Ok(Some(parse_decimal(&raw, column)?)),
        None => Ok(None),
    }
}
