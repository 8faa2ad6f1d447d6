//! services/api/src/web/chat.rs
//!
//! Axum handlers for the chat endpoint and the conversation-history lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use bankchat_core::domain::{Intent, Role};

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The incoming chat request. Required fields are validated explicitly so
/// the caller gets per-field detail instead of a bare deserialization error.
#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub customer_id: Option<String>,
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
struct MessageView {
    id: Uuid,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    intent: Option<Intent>,
    data_sources: Vec<String>,
}

#[derive(Serialize)]
struct ConversationHistoryResponse {
    conversation_id: String,
    customer: String,
    customer_name: String,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    is_active: bool,
    messages: Vec<MessageView>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/chat - one context-aware chat turn for a customer.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply with intent, suggestions and data context"),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let mut field_errors = serde_json::Map::new();
    if request.customer_id.as_deref().map_or(true, str::is_empty) {
        field_errors.insert("customer_id".to_string(), json!("This field is required."));
    }
    if request.message.as_deref().map_or(true, str::is_empty) {
        field_errors.insert("message".to_string(), json!("This field is required."));
    }
    if !field_errors.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": field_errors })),
        ));
    }

    let customer_id = request.customer_id.as_deref().unwrap_or_default();
    let message = request.message.as_deref().unwrap_or_default();

    let outcome = state
        .chat
        .handle(customer_id, message, request.conversation_id.as_deref())
        .await
        .map_err(port_error_response)?;

    info!(
        "chat turn for {customer_id} classified as {}",
        outcome.intent.as_str()
    );
    Ok((StatusCode::OK, Json(outcome)))
}

/// GET /api/conversation/{conversation_id} - a conversation with its ordered
/// messages.
#[utoipa::path(
    get,
    path = "/api/conversation/{conversation_id}",
    responses(
        (status = 200, description = "Conversation with ordered messages"),
        (status = 404, description = "Conversation not found")
    ),
    params(("conversation_id" = String, Path, description = "Opaque conversation key"))
)]
pub async fn conversation_history_handler(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let conversation = state
        .store
        .get_conversation(&conversation_id)
        .await
        .map_err(port_error_response)?;

    let customer = state
        .store
        .get_customer(&conversation.customer_id)
        .await
        .map_err(port_error_response)?;

    let messages = state
        .store
        .messages_for_conversation(&conversation_id)
        .await
        .map_err(port_error_response)?;

    let response = ConversationHistoryResponse {
        conversation_id: conversation.conversation_id,
        customer: conversation.customer_id,
        customer_name: customer.name,
        started_at: conversation.started_at,
        last_activity: conversation.last_activity,
        is_active: conversation.is_active,
        messages: messages
            .into_iter()
            .map(|m| MessageView {
                id: m.id,
                role: m.role,
                content: m.content,
                timestamp: m.timestamp,
                intent: m.intent,
                data_sources: m.data_sources,
            })
            .collect(),
    };

    Ok((StatusCode::OK, Json(response)))
}
