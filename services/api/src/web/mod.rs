pub mod chat;
pub mod context;
pub mod records;
pub mod rest;
pub mod state;
pub mod upload;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use bankchat_core::ports::PortError;

pub use chat::{chat_handler, conversation_history_handler};
pub use context::{
    customer_context_handler, portfolio_allocation_handler, spending_by_category_handler,
};
pub use upload::upload_handler;

/// The uniform error body used by every handler.
pub(crate) fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "error": message.into() }))
}

/// Maps a port error onto the HTTP error taxonomy.
pub(crate) fn port_error_response(e: PortError) -> (StatusCode, Json<Value>) {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, error_body(message)),
        PortError::Invalid(message) => (StatusCode::BAD_REQUEST, error_body(message)),
        PortError::Conflict(message) => (StatusCode::CONFLICT, error_body(message)),
        PortError::Unexpected(message) => {
            tracing::error!("request failed: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal server error"),
            )
        }
    }
}
