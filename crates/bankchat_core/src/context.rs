//! crates/bankchat_core/src/context.rs
//!
//! The context aggregator: reads a customer's recent transactions and
//! investment holdings through the `RecordStore` port and computes the
//! derived summaries used to ground generated responses.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{display_label, Customer, Investment, RiskLevel, Transaction};
use crate::ports::{
    InvestmentFilter, PortError, PortResult, RecordStore, TransactionFilter,
};

/// Transactions are aggregated over this trailing window.
pub const CONTEXT_WINDOW_DAYS: i64 = 180;
/// At most this many recent transactions enter the snapshot.
pub const RECENT_TRANSACTION_CAP: i64 = 50;
/// Number of top spend categories surfaced in the summary.
const TOP_CATEGORY_COUNT: usize = 3;
/// Rollup windows are month-sized blocks of days, not calendar months.
const DAYS_PER_MONTH: i64 = 30;

//=========================================================================================
// Snapshot Types
//=========================================================================================

/// The customer fields embedded in prompts and context responses.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub name: String,
    pub age: i32,
    pub risk_level: RiskLevel,
    pub annual_income: Decimal,
    pub financial_goals: String,
}

impl From<&Customer> for CustomerProfile {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_id: customer.customer_id.clone(),
            name: customer.name.clone(),
            age: customer.age,
            risk_level: customer.risk_level,
            annual_income: customer.annual_income,
            financial_goals: customer.financial_goals.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionBrief {
    pub transaction_id: String,
    pub date: chrono::NaiveDate,
    pub category: String,
    pub merchant: String,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentBrief {
    pub investment_id: String,
    pub product_type: String,
    pub product_name: String,
    pub invested_amount: Decimal,
    pub current_value: Decimal,
    pub returns_percentage: Decimal,
    pub risk_level: RiskLevel,
}

/// Derived analytics over the retrieved transaction window. Absent entirely
/// (rather than zero-filled) when the window holds no transactions.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub total_spent: Decimal,
    pub monthly_average: Decimal,
    pub top_categories: Vec<String>,
    pub category_breakdown: BTreeMap<String, Decimal>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestPerformer {
    pub name: String,
    #[serde(rename = "return")]
    pub return_percentage: Decimal,
}

/// Derived analytics over all holdings. Absent when there are none.
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentSummary {
    pub total_invested: Decimal,
    pub current_value: Decimal,
    pub total_returns: Decimal,
    pub return_percentage: Decimal,
    pub product_types: BTreeMap<String, i64>,
    pub investment_count: usize,
    pub best_performer: Option<BestPerformer>,
}

/// The aggregated, derived view of a customer's finances used to ground a
/// generated response.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub customer: CustomerProfile,
    pub transactions: Vec<TransactionBrief>,
    pub investments: Vec<InvestmentBrief>,
    pub transaction_summary: Option<TransactionSummary>,
    pub investment_summary: Option<InvestmentSummary>,
}

impl ContextSnapshot {
    /// A snapshot with no financial data, for customers without records.
    pub fn empty(customer: &Customer) -> Self {
        Self {
            customer: customer.into(),
            transactions: Vec::new(),
            investments: Vec::new(),
            transaction_summary: None,
            investment_summary: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub total: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendingByCategory {
    pub period: String,
    pub categories: Vec<CategorySpend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationSlice {
    pub product_type: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioAllocation {
    pub total_value: Decimal,
    pub allocation: Vec<AllocationSlice>,
}

//=========================================================================================
// Context Service
//=========================================================================================

#[derive(Clone)]
pub struct ContextService {
    store: Arc<dyn RecordStore>,
}

impl ContextService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Builds the full financial context snapshot for a customer.
    ///
    /// Fails softly: an unknown customer yields `Ok(None)` rather than an
    /// error, so callers can degrade to an empty context.
    pub async fn customer_context(
        &self,
        customer_id: &str,
    ) -> PortResult<Option<ContextSnapshot>> {
        let customer = match self.store.get_customer(customer_id).await {
            Ok(customer) => customer,
            Err(PortError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let since = Utc::now().date_naive() - Duration::days(CONTEXT_WINDOW_DAYS);
        let transactions = self
            .store
            .recent_transactions(customer_id, since, RECENT_TRANSACTION_CAP)
            .await?;
        let investments = self.store.investments_for_customer(customer_id).await?;

        Ok(Some(ContextSnapshot {
            customer: (&customer).into(),
            transactions: transactions.iter().map(transaction_brief).collect(),
            investments: investments.iter().map(investment_brief).collect(),
            transaction_summary: transaction_summary(&transactions),
            investment_summary: investment_summary(&investments),
        }))
    }

    /// Filtered transaction query, newest first.
    pub async fn query_transactions(
        &self,
        customer_id: &str,
        filter: &TransactionFilter,
    ) -> PortResult<Vec<Transaction>> {
        self.store.query_transactions(customer_id, filter).await
    }

    /// Filtered investment query, best returns first.
    pub async fn query_investments(
        &self,
        customer_id: &str,
        filter: &InvestmentFilter,
    ) -> PortResult<Vec<Investment>> {
        self.store.query_investments(customer_id, filter).await
    }

    /// Category-wise spend over a trailing window of `months * 30` days.
    pub async fn spending_by_category(
        &self,
        customer_id: &str,
        months: u32,
    ) -> PortResult<SpendingByCategory> {
        let since =
            Utc::now().date_naive() - Duration::days(i64::from(months) * DAYS_PER_MONTH);
        let rows = self.store.spending_by_category(customer_id, since).await?;

        Ok(SpendingByCategory {
            period: format!("Last {months} months"),
            categories: rows
                .into_iter()
                .map(|row| CategorySpend {
                    category: display_label(&row.category),
                    total: row.total,
                    transaction_count: row.count,
                })
                .collect(),
        })
    }

    /// Each product type's share of the portfolio's current value.
    pub async fn portfolio_allocation(
        &self,
        customer_id: &str,
    ) -> PortResult<PortfolioAllocation> {
        let rows = self.store.portfolio_value_by_type(customer_id).await?;
        let total_value: Decimal = rows.iter().map(|row| row.total_value).sum();

        let allocation = rows
            .into_iter()
            .map(|row| {
                let percentage = if total_value > Decimal::ZERO {
                    (row.total_value / total_value * Decimal::from(100)).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                AllocationSlice {
                    product_type: display_label(&row.product_type),
                    value: row.total_value,
                    percentage,
                }
            })
            .collect();

        Ok(PortfolioAllocation {
            total_value,
            allocation,
        })
    }
}

fn transaction_brief(t: &Transaction) -> TransactionBrief {
    TransactionBrief {
        transaction_id: t.transaction_id.clone(),
        date: t.date,
        category: t.category.clone(),
        merchant: t.merchant.clone(),
        amount: t.amount,
        description: t.description.clone(),
    }
}

fn investment_brief(i: &Investment) -> InvestmentBrief {
    InvestmentBrief {
        investment_id: i.investment_id.clone(),
        product_type: i.product_type.clone(),
        product_name: i.product_name.clone(),
        invested_amount: i.invested_amount,
        current_value: i.current_value,
        returns_percentage: i.returns_percentage,
        risk_level: i.risk_level,
    }
}

//=========================================================================================
// Summary Computation
//=========================================================================================

/// Computes spend analytics over the retrieved window. `transactions` must
/// already be in retrieval order (newest first); that order breaks ties
/// between equally-sized categories.
pub fn transaction_summary(transactions: &[Transaction]) -> Option<TransactionSummary> {
    if transactions.is_empty() {
        return None;
    }

    let total_spent: Decimal = transactions.iter().map(|t| t.amount).sum();

    // Per-raw-category totals, in first-encountered order.
    let mut category_totals: Vec<(String, Decimal)> = Vec::new();
    for t in transactions {
        match category_totals.iter_mut().find(|(c, _)| *c == t.category) {
            Some((_, sum)) => *sum += t.amount,
            None => category_totals.push((t.category.clone(), t.amount)),
        }
    }

    // Stable sort keeps the first-encountered order for equal totals.
    let mut ranked = category_totals.clone();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top_categories = ranked
        .iter()
        .take(TOP_CATEGORY_COUNT)
        .map(|(category, _)| display_label(category))
        .collect();

    let mut category_breakdown = BTreeMap::new();
    for (category, total) in &category_totals {
        *category_breakdown
            .entry(display_label(category))
            .or_insert(Decimal::ZERO) += *total;
    }

    // Monthly average over the span actually covered by the window, with a
    // floor of one month so a single-day set never divides by zero.
    let newest = transactions.iter().map(|t| t.date).max().expect("non-empty");
    let oldest = transactions.iter().map(|t| t.date).min().expect("non-empty");
    let span_days = (newest - oldest).num_days();
    let mut months = Decimal::from(span_days) / Decimal::from(DAYS_PER_MONTH);
    if months < Decimal::ONE {
        months = Decimal::ONE;
    }
    let monthly_average = total_spent / months;

    Some(TransactionSummary {
        total_spent,
        monthly_average,
        top_categories,
        category_breakdown,
        transaction_count: transactions.len(),
    })
}

/// Computes portfolio analytics over all holdings. The stored
/// `returns_percentage` is trusted; the aggregate percentage is derived from
/// the summed amounts.
pub fn investment_summary(investments: &[Investment]) -> Option<InvestmentSummary> {
    if investments.is_empty() {
        return None;
    }

    let total_invested: Decimal = investments.iter().map(|i| i.invested_amount).sum();
    let current_value: Decimal = investments.iter().map(|i| i.current_value).sum();
    let total_returns = current_value - total_invested;
    let return_percentage = if total_invested > Decimal::ZERO {
        total_returns / total_invested * Decimal::from(100)
    } else {
        Decimal::ZERO
    };

    let mut product_types = BTreeMap::new();
    for i in investments {
        *product_types
            .entry(display_label(&i.product_type))
            .or_insert(0) += 1;
    }

    // Strictly-greater comparison keeps the first-encountered holding on ties.
    let mut best: Option<&Investment> = None;
    for i in investments {
        if best.map_or(true, |b| i.returns_percentage > b.returns_percentage) {
            best = Some(i);
        }
    }

    Some(InvestmentSummary {
        total_invested,
        current_value,
        total_returns,
        return_percentage,
        product_types,
        investment_count: investments.len(),
        best_performer: best.map(|i| BestPerformer {
            name: i.product_name.clone(),
            return_percentage: i.returns_percentage,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(id: &str, date: &str, category: &str, amount: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            customer_id: "C1".to_string(),
            date: date.parse::<NaiveDate>().unwrap(),
            category: category.to_string(),
            merchant: format!("{category} store"),
            amount: Decimal::from(amount),
            payment_method: crate::domain::PaymentMethod::Upi,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    fn holding(id: &str, product_type: &str, invested: i64, current: i64, pct: &str) -> Investment {
        Investment {
            investment_id: id.to_string(),
            customer_id: "C1".to_string(),
            product_type: product_type.to_string(),
            product_name: format!("{id} fund"),
            purchase_date: "2023-03-01".parse().unwrap(),
            invested_amount: Decimal::from(invested),
            current_value: Decimal::from(current),
            units: Decimal::ZERO,
            purchase_nav: Decimal::ZERO,
            current_nav: Decimal::ZERO,
            returns_absolute: Decimal::from(current - invested),
            returns_percentage: pct.parse().unwrap(),
            risk_level: RiskLevel::Medium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window_yields_no_summary() {
        assert!(transaction_summary(&[]).is_none());
        assert!(investment_summary(&[]).is_none());
    }

    #[test]
    fn groceries_and_dining_scenario() {
        let transactions = vec![
            txn("T2", "2024-01-20", "Dining", 500),
            txn("T1", "2024-01-05", "Groceries", 1000),
        ];
        let summary = transaction_summary(&transactions).unwrap();

        assert_eq!(summary.total_spent, Decimal::from(1500));
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.top_categories, vec!["Groceries", "Dining"]);
        assert_eq!(
            summary.category_breakdown.get("Groceries"),
            Some(&Decimal::from(1000))
        );
        assert_eq!(
            summary.category_breakdown.get("Dining"),
            Some(&Decimal::from(500))
        );
        // 15-day span floors to one month.
        assert_eq!(summary.monthly_average, Decimal::from(1500));
    }

    #[test]
    fn monthly_average_spans_months() {
        let transactions = vec![
            txn("T2", "2024-03-01", "Travel", 900),
            txn("T1", "2024-01-01", "Travel", 300),
        ];
        let summary = transaction_summary(&transactions).unwrap();
        // 60-day span = 2 months.
        assert_eq!(summary.monthly_average, Decimal::from(600));
    }

    #[test]
    fn top_category_ties_keep_retrieval_order() {
        let transactions = vec![
            txn("T1", "2024-02-10", "dining_out", 400),
            txn("T2", "2024-02-09", "groceries", 400),
            txn("T3", "2024-02-08", "fuel", 400),
            txn("T4", "2024-02-07", "rent", 100),
        ];
        let summary = transaction_summary(&transactions).unwrap();
        assert_eq!(summary.top_categories, vec!["Dining Out", "Groceries", "Fuel"]);
    }

    #[test]
    fn category_labels_are_normalized() {
        let transactions = vec![txn("T1", "2024-02-01", "utility_bills", 250)];
        let summary = transaction_summary(&transactions).unwrap();
        assert_eq!(summary.top_categories, vec!["Utility Bills"]);
        assert!(summary.category_breakdown.contains_key("Utility Bills"));
    }

    #[test]
    fn investment_summary_math() {
        let investments = vec![
            holding("I1", "mutual_fund", 10000, 12000, "20.00"),
            holding("I2", "fixed_deposit", 5000, 5250, "5.00"),
        ];
        let summary = investment_summary(&investments).unwrap();

        assert_eq!(summary.total_invested, Decimal::from(15000));
        assert_eq!(summary.current_value, Decimal::from(17250));
        assert_eq!(summary.total_returns, Decimal::from(2250));
        assert_eq!(summary.return_percentage, Decimal::from(15));
        assert_eq!(summary.product_types.get("Mutual Fund"), Some(&1));
        assert_eq!(summary.product_types.get("Fixed Deposit"), Some(&1));
        assert_eq!(summary.best_performer.as_ref().unwrap().name, "I1 fund");
    }

    #[test]
    fn zero_invested_never_divides() {
        let investments = vec![holding("I1", "bonus_units", 0, 500, "0.00")];
        let summary = investment_summary(&investments).unwrap();
        assert_eq!(summary.return_percentage, Decimal::ZERO);
    }

    #[test]
    fn best_performer_tie_keeps_first_encountered() {
        let investments = vec![
            holding("I1", "equity", 1000, 1100, "10.00"),
            holding("I2", "equity", 2000, 2200, "10.00"),
        ];
        let summary = investment_summary(&investments).unwrap();
        assert_eq!(summary.best_performer.unwrap().name, "I1 fund");
    }
}
