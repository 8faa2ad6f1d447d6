//! services/api/src/bin/seed_demo.rs
//!
//! Loads a small demo data set (customers, transactions, investments) so the
//! chat endpoints have something to talk about. Safe to run repeatedly;
//! every record is inserted create-if-absent.

use api_lib::{adapters::PgStore, config::Config, error::ApiError};
use bankchat_core::domain::{Customer, Investment, PaymentMethod, RiskLevel, Transaction};
use bankchat_core::ports::{PortError, RecordStore};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn customer(
    customer_id: &str,
    name: &str,
    age: i32,
    risk_level: RiskLevel,
    annual_income: i64,
    financial_goals: &str,
) -> Customer {
    let now = Utc::now();
    Customer {
        customer_id: customer_id.to_string(),
        name: name.to_string(),
        age,
        risk_level,
        annual_income: Decimal::from(annual_income),
        financial_goals: financial_goals.to_string(),
        account_opening_date: "2020-01-15".parse().unwrap(),
        email: format!("{}@example.com", customer_id.to_lowercase()),
        phone: "9876543210".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn transaction(
    transaction_id: &str,
    customer_id: &str,
    days_ago: i64,
    category: &str,
    merchant: &str,
    amount: i64,
    payment_method: PaymentMethod,
) -> Transaction {
    Transaction {
        transaction_id: transaction_id.to_string(),
        customer_id: customer_id.to_string(),
        date: Utc::now().date_naive() - Duration::days(days_ago),
        category: category.to_string(),
        merchant: merchant.to_string(),
        amount: Decimal::from(amount),
        payment_method,
        description: format!("{merchant} purchase"),
        created_at: Utc::now(),
    }
}

#[allow(clippy::too_many_arguments)]
fn investment(
    investment_id: &str,
    customer_id: &str,
    product_type: &str,
    product_name: &str,
    invested: i64,
    current: i64,
    returns_percentage: &str,
    risk_level: RiskLevel,
) -> Investment {
    let now = Utc::now();
    Investment {
        investment_id: investment_id.to_string(),
        customer_id: customer_id.to_string(),
        product_type: product_type.to_string(),
        product_name: product_name.to_string(),
        purchase_date: "2023-04-01".parse().unwrap(),
        invested_amount: Decimal::from(invested),
        current_value: Decimal::from(current),
        units: Decimal::ZERO,
        purchase_nav: Decimal::ZERO,
        current_nav: Decimal::ZERO,
        returns_absolute: Decimal::from(current - invested),
        returns_percentage: returns_percentage.parse().unwrap(),
        risk_level,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(pool));
    store.run_migrations().await?;

    let customers = vec![
        customer("CUST001", "Priya Sharma", 32, RiskLevel::Medium, 1_500_000, "retirement_planning"),
        customer("CUST002", "Rahul Verma", 45, RiskLevel::Low, 2_400_000, "child_education"),
        customer("CUST003", "Ananya Iyer", 27, RiskLevel::High, 900_000, "wealth_creation"),
    ];
    let mut loaded = 0;
    for record in customers {
        match store.create_customer(record).await {
            Ok(_) => loaded += 1,
            Err(PortError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    info!("Loaded {loaded} customers");

    let transactions = vec![
        transaction("TXN001", "CUST001", 5, "groceries", "Big Bazaar", 3200, PaymentMethod::Upi),
        transaction("TXN002", "CUST001", 12, "dining_out", "Cafe Coffee Day", 850, PaymentMethod::CreditCard),
        transaction("TXN003", "CUST001", 20, "utility_bills", "BESCOM", 2100, PaymentMethod::NetBanking),
        transaction("TXN004", "CUST001", 34, "groceries", "DMart", 2750, PaymentMethod::DebitCard),
        transaction("TXN005", "CUST002", 3, "fuel", "Indian Oil", 2500, PaymentMethod::CreditCard),
        transaction("TXN006", "CUST002", 18, "shopping", "Amazon", 5600, PaymentMethod::Upi),
        transaction("TXN007", "CUST003", 8, "entertainment", "PVR Cinemas", 1200, PaymentMethod::Upi),
        transaction("TXN008", "CUST003", 25, "travel", "IRCTC", 4300, PaymentMethod::NetBanking),
    ];
    let mut loaded = 0;
    for record in transactions {
        if store.insert_transaction_if_absent(record).await? {
            loaded += 1;
        }
    }
    info!("Loaded {loaded} transactions");

    let investments = vec![
        investment("INV001", "CUST001", "mutual_fund", "Bluechip Equity Fund", 200_000, 236_000, "18.00", RiskLevel::Medium),
        investment("INV002", "CUST001", "fixed_deposit", "SmartBank FD 2026", 300_000, 315_000, "5.00", RiskLevel::Low),
        investment("INV003", "CUST002", "fixed_deposit", "SmartBank FD 2025", 500_000, 527_500, "5.50", RiskLevel::Low),
        investment("INV004", "CUST003", "equity", "NiftyBees ETF", 150_000, 196_500, "31.00", RiskLevel::High),
        investment("INV005", "CUST003", "gold", "Sovereign Gold Bond", 100_000, 112_000, "12.00", RiskLevel::Medium),
    ];
    let mut loaded = 0;
    for record in investments {
        if store.insert_investment_if_absent(record).await? {
            loaded += 1;
        }
    }
    info!("Loaded {loaded} investments");

    info!("Demo data load complete");
    Ok(())
}
