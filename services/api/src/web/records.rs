//! services/api/src/web/records.rs
//!
//! CRUD handlers for the customer, transaction and investment records, plus
//! their filtered list endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use bankchat_core::domain::{Customer, Investment, PaymentMethod, RiskLevel, Transaction};
use bankchat_core::ports::{InvestmentFilter, TransactionFilter};

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// Payload Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CustomerPayload {
    pub customer_id: String,
    pub name: String,
    pub age: i32,
    #[schema(value_type = String)]
    pub risk_level: RiskLevel,
    pub annual_income: Decimal,
    pub financial_goals: String,
    pub account_opening_date: NaiveDate,
    pub email: String,
    pub phone: String,
}

impl CustomerPayload {
    fn into_domain(self) -> Customer {
        let now = Utc::now();
        Customer {
            customer_id: self.customer_id,
            name: self.name,
            age: self.age,
            risk_level: self.risk_level,
            annual_income: self.annual_income,
            financial_goals: self.financial_goals,
            account_opening_date: self.account_opening_date,
            email: self.email,
            phone: self.phone,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct TransactionPayload {
    pub transaction_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub category: String,
    pub merchant: String,
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: Option<String>,
}

impl TransactionPayload {
    fn into_domain(self) -> Transaction {
        Transaction {
            transaction_id: self.transaction_id,
            customer_id: self.customer_id,
            date: self.date,
            category: self.category,
            merchant: self.merchant,
            amount: self.amount,
            payment_method: self.payment_method,
            description: self.description.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct InvestmentPayload {
    pub investment_id: String,
    pub customer_id: String,
    pub product_type: String,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub invested_amount: Decimal,
    pub current_value: Decimal,
    #[serde(default)]
    pub units: Option<Decimal>,
    #[serde(default)]
    pub purchase_nav: Option<Decimal>,
    #[serde(default)]
    pub current_nav: Option<Decimal>,
    pub returns_absolute: Decimal,
    pub returns_percentage: Decimal,
    #[schema(value_type = String)]
    pub risk_level: RiskLevel,
}

impl InvestmentPayload {
    fn into_domain(self) -> Investment {
        let now = Utc::now();
        Investment {
            investment_id: self.investment_id,
            customer_id: self.customer_id,
            product_type: self.product_type,
            product_name: self.product_name,
            purchase_date: self.purchase_date,
            invested_amount: self.invested_amount,
            current_value: self.current_value,
            units: self.units.unwrap_or(Decimal::ZERO),
            purchase_nav: self.purchase_nav.unwrap_or(Decimal::ZERO),
            current_nav: self.current_nav.unwrap_or(Decimal::ZERO),
            returns_absolute: self.returns_absolute,
            returns_percentage: self.returns_percentage,
            risk_level: self.risk_level,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Deserialize)]
pub struct TransactionListParams {
    pub customer_id: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct InvestmentListParams {
    pub customer_id: Option<String>,
    pub product_type: Option<String>,
    pub risk_level: Option<RiskLevel>,
}

//=========================================================================================
// Customer Handlers
//=========================================================================================

pub async fn create_customer_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let customer = state
        .store
        .create_customer(payload.into_domain())
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let customers = state
        .store
        .list_customers()
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(customers)))
}

pub async fn get_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let customer = state
        .store
        .get_customer(&customer_id)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn update_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    // The identity key is immutable; the path wins over the payload, and the
    // original creation timestamp is preserved.
    let existing = state
        .store
        .get_customer(&customer_id)
        .await
        .map_err(port_error_response)?;

    let customer = Customer {
        customer_id,
        created_at: existing.created_at,
        updated_at: Utc::now(),
        ..payload.into_domain()
    };
    let customer = state
        .store
        .update_customer(customer)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn delete_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    state
        .store
        .delete_customer(&customer_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Transaction Handlers
//=========================================================================================

pub async fn create_transaction_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TransactionPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let transaction = state
        .store
        .create_transaction(payload.into_domain())
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Transactions newest first. With a `customer_id`, the full conjunctive
/// filter set (category, inclusive date range, minimum amount) applies.
pub async fn list_transactions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionListParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let transactions = match &params.customer_id {
        Some(customer_id) => {
            let filter = TransactionFilter {
                category: params.category.clone(),
                start_date: params.start_date,
                end_date: params.end_date,
                min_amount: params.min_amount,
            };
            state
                .context
                .query_transactions(customer_id, &filter)
                .await
                .map_err(port_error_response)?
        }
        None => state
            .store
            .list_transactions(None, params.category.as_deref())
            .await
            .map_err(port_error_response)?,
    };
    Ok((StatusCode::OK, Json(transactions)))
}

pub async fn get_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let transaction = state
        .store
        .get_transaction(&transaction_id)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn update_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
    Json(payload): Json<TransactionPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let existing = state
        .store
        .get_transaction(&transaction_id)
        .await
        .map_err(port_error_response)?;

    let transaction = Transaction {
        transaction_id,
        created_at: existing.created_at,
        ..payload.into_domain()
    };
    let transaction = state
        .store
        .update_transaction(transaction)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn delete_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    state
        .store
        .delete_transaction(&transaction_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Investment Handlers
//=========================================================================================

pub async fn create_investment_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InvestmentPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let investment = state
        .store
        .create_investment(payload.into_domain())
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(investment)))
}

/// Investments ordered by returns percentage descending. With a
/// `customer_id`, product type and risk level filters apply.
pub async fn list_investments_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InvestmentListParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let investments = match &params.customer_id {
        Some(customer_id) => {
            let filter = InvestmentFilter {
                product_type: params.product_type.clone(),
                risk_level: params.risk_level,
            };
            state
                .context
                .query_investments(customer_id, &filter)
                .await
                .map_err(port_error_response)?
        }
        None => state
            .store
            .list_investments(None)
            .await
            .map_err(port_error_response)?,
    };
    Ok((StatusCode::OK, Json(investments)))
}

pub async fn get_investment_handler(
    State(state): State<Arc<AppState>>,
    Path(investment_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let investment = state
        .store
        .get_investment(&investment_id)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(investment)))
}

pub async fn update_investment_handler(
    State(state): State<Arc<AppState>>,
    Path(investment_id): Path<String>,
    Json(payload): Json<InvestmentPayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let existing = state
        .store
        .get_investment(&investment_id)
        .await
        .map_err(port_error_response)?;

    let investment = Investment {
        investment_id,
        created_at: existing.created_at,
        updated_at: Utc::now(),
        ..payload.into_domain()
    };
    let investment = state
        .store
        .update_investment(investment)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(investment)))
}

pub async fn delete_investment_handler(
    State(state): State<Arc<AppState>>,
    Path(investment_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    state
        .store
        .delete_investment(&investment_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
