//! services/api/src/web/rest.rs
//!
//! Master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::chat::ChatRequest;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::chat::chat_handler,
        crate::web::chat::conversation_history_handler,
        crate::web::context::customer_context_handler,
        crate::web::context::spending_by_category_handler,
        crate::web::context::portfolio_allocation_handler,
        crate::web::upload::upload_handler,
    ),
    components(schemas(ChatRequest)),
    tags(
        (name = "Banking Chatbot API", description = "Customer chat, financial context and record management endpoints.")
    )
)]
pub struct ApiDoc;
