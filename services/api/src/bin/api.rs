//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{OpenAiGeneratorAdapter, PgStore},
    config::Config,
    error::ApiError,
    web::{
        chat_handler, conversation_history_handler, customer_context_handler,
        portfolio_allocation_handler, records, rest::ApiDoc, spending_by_category_handler,
        state::AppState, upload_handler,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Generation Service Adapter ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let generator = Arc::new(OpenAiGeneratorAdapter::new(
        openai_client,
        config.chat_model.clone(),
        config.intent_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, generator, config.clone()));

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        // Chat and context
        .route("/api/chat", post(chat_handler))
        .route("/api/context/{customer_id}", get(customer_context_handler))
        .route(
            "/api/conversation/{conversation_id}",
            get(conversation_history_handler),
        )
        .route(
            "/api/analytics/spending/{customer_id}",
            get(spending_by_category_handler),
        )
        .route(
            "/api/analytics/portfolio/{customer_id}",
            get(portfolio_allocation_handler),
        )
        // File upload
        .route("/api/upload", post(upload_handler))
        // Record CRUD
        .route(
            "/api/customers",
            get(records::list_customers_handler).post(records::create_customer_handler),
        )
        .route(
            "/api/customers/{customer_id}",
            get(records::get_customer_handler)
                .put(records::update_customer_handler)
                .delete(records::delete_customer_handler),
        )
        .route(
            "/api/transactions",
            get(records::list_transactions_handler).post(records::create_transaction_handler),
        )
        .route(
            "/api/transactions/{transaction_id}",
            get(records::get_transaction_handler)
                .put(records::update_transaction_handler)
                .delete(records::delete_transaction_handler),
        )
        .route(
            "/api/investments",
            get(records::list_investments_handler).post(records::create_investment_handler),
        )
        .route(
            "/api/investments/{investment_id}",
            get(records::get_investment_handler)
                .put(records::update_investment_handler)
                .delete(records::delete_investment_handler),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete
    // application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
