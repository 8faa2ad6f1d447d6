//! services/api/src/web/context.rs
//!
//! Axum handlers for the context snapshot and the category/allocation
//! rollups.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::web::port_error_response;
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct SpendingParams {
    /// Trailing window in month-sized blocks of 30 days.
    pub months: Option<u32>,
}

/// GET /api/context/{customer_id} - the full financial context snapshot.
///
/// An unknown customer yields an empty object, mirroring the aggregator's
/// soft-failure contract.
#[utoipa::path(
    get,
    path = "/api/context/{customer_id}",
    responses(
        (status = 200, description = "Context snapshot, or an empty object for an unknown customer")
    ),
    params(("customer_id" = String, Path, description = "Customer identity key"))
)]
pub async fn customer_context_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let snapshot = state
        .context
        .customer_context(&customer_id)
        .await
        .map_err(port_error_response)?;

    match snapshot {
        Some(snapshot) => Ok((StatusCode::OK, Json(json!(snapshot)))),
        None => Ok((StatusCode::OK, Json(json!({})))),
    }
}

/// GET /api/analytics/spending/{customer_id} - category-wise spend rollup.
#[utoipa::path(
    get,
    path = "/api/analytics/spending/{customer_id}",
    responses((status = 200, description = "Per-category totals over the trailing window")),
    params(
        ("customer_id" = String, Path, description = "Customer identity key"),
        ("months" = Option<u32>, Query, description = "Trailing window size, default 6")
    )
)]
pub async fn spending_by_category_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Query(params): Query<SpendingParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let months = params.months.unwrap_or(6);
    let rollup = state
        .context
        .spending_by_category(&customer_id, months)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(rollup)))
}

/// GET /api/analytics/portfolio/{customer_id} - portfolio allocation shares.
#[utoipa::path(
    get,
    path = "/api/analytics/portfolio/{customer_id}",
    responses((status = 200, description = "Current value share per product type")),
    params(("customer_id" = String, Path, description = "Customer identity key"))
)]
pub async fn portfolio_allocation_handler(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let allocation = state
        .context
        .portfolio_allocation(&customer_id)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::OK, Json(allocation)))
}
