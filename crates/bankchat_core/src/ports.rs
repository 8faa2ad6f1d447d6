//! crates/bankchat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or text-generation APIs.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::context::ContextSnapshot;
use crate::domain::{
    ChatMessage, Conversation, Customer, HistoryEntry, Intent, Investment, Transaction,
    UploadedFile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Parameter Types
//=========================================================================================

/// Conjunctive filter set for transaction queries. Every present field must
/// match; date bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
}

/// Conjunctive filter set for investment queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestmentFilter {
    pub product_type: Option<String>,
    pub risk_level: Option<crate::domain::RiskLevel>,
}

/// One row of the store-side spending-by-category aggregation.
#[derive(Debug, Clone)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

/// One row of the store-side portfolio value aggregation.
#[derive(Debug, Clone)]
pub struct ProductTypeValue {
    pub product_type: String,
    pub total_value: Decimal,
}

//=========================================================================================
// Record Store Port
//=========================================================================================

/// Storage contract for all persistent records. The store provides its own
/// concurrency control; the core never locks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Customers ---
    async fn create_customer(&self, customer: Customer) -> PortResult<Customer>;
    async fn get_customer(&self, customer_id: &str) -> PortResult<Customer>;
    /// All customers, newest created first.
    async fn list_customers(&self) -> PortResult<Vec<Customer>>;
    async fn update_customer(&self, customer: Customer) -> PortResult<Customer>;
    async fn delete_customer(&self, customer_id: &str) -> PortResult<()>;

    // --- Transactions ---
    async fn create_transaction(&self, transaction: Transaction) -> PortResult<Transaction>;
    async fn get_transaction(&self, transaction_id: &str) -> PortResult<Transaction>;
    /// Transactions ordered by date descending, optionally narrowed to a
    /// customer and/or an exact raw category.
    async fn list_transactions(
        &self,
        customer_id: Option<&str>,
        category: Option<&str>,
    ) -> PortResult<Vec<Transaction>>;
    async fn update_transaction(&self, transaction: Transaction) -> PortResult<Transaction>;
    async fn delete_transaction(&self, transaction_id: &str) -> PortResult<()>;

    /// A customer's transactions dated on or after `since`, newest first,
    /// capped at `limit` rows.
    async fn recent_transactions(
        &self,
        customer_id: &str,
        since: NaiveDate,
        limit: i64,
    ) -> PortResult<Vec<Transaction>>;

    /// Filtered transaction query, newest first. No pagination; callers
    /// bound the result through the filter.
    async fn query_transactions(
        &self,
        customer_id: &str,
        filter: &TransactionFilter,
    ) -> PortResult<Vec<Transaction>>;

    /// Create-if-absent upsert keyed on `transaction_id`. Returns `true`
    /// when a new row was created, `false` when the key already existed.
    async fn insert_transaction_if_absent(&self, transaction: Transaction) -> PortResult<bool>;

    /// Per-raw-category spend total and row count since `since`, ordered by
    /// total descending.
    async fn spending_by_category(
        &self,
        customer_id: &str,
        since: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>>;

    // --- Investments ---
    async fn create_investment(&self, investment: Investment) -> PortResult<Investment>;
    async fn get_investment(&self, investment_id: &str) -> PortResult<Investment>;
    /// Investments ordered by returns percentage descending, optionally
    /// narrowed to a customer.
    async fn list_investments(&self, customer_id: Option<&str>) -> PortResult<Vec<Investment>>;
    async fn update_investment(&self, investment: Investment) -> PortResult<Investment>;
    async fn delete_investment(&self, investment_id: &str) -> PortResult<()>;

    /// All holdings for a customer, in stored order (purchase date descending).
    async fn investments_for_customer(&self, customer_id: &str) -> PortResult<Vec<Investment>>;

    /// Filtered investment query, returns percentage descending.
    async fn query_investments(
        &self,
        customer_id: &str,
        filter: &InvestmentFilter,
    ) -> PortResult<Vec<Investment>>;

    /// Create-if-absent upsert keyed on `investment_id`.
    async fn insert_investment_if_absent(&self, investment: Investment) -> PortResult<bool>;

    /// Current value summed per product type for a customer's holdings.
    async fn portfolio_value_by_type(
        &self,
        customer_id: &str,
    ) -> PortResult<Vec<ProductTypeValue>>;

    // --- Conversations and Messages ---
    async fn create_conversation(&self, conversation: Conversation) -> PortResult<Conversation>;
    async fn get_conversation(&self, conversation_id: &str) -> PortResult<Conversation>;
    /// Looks up a conversation only if it belongs to the given customer.
    async fn get_customer_conversation(
        &self,
        conversation_id: &str,
        customer_id: &str,
    ) -> PortResult<Conversation>;
    /// Appends a message and bumps the conversation's `last_activity` to the
    /// message timestamp.
    async fn append_message(&self, message: ChatMessage) -> PortResult<ChatMessage>;
    /// All messages of a conversation, ascending by timestamp.
    async fn messages_for_conversation(
        &self,
        conversation_id: &str,
    ) -> PortResult<Vec<ChatMessage>>;

    // --- Uploaded Files ---
    async fn create_uploaded_file(&self, file: UploadedFile) -> PortResult<UploadedFile>;
    async fn mark_file_processed(&self, id: Uuid, records_imported: i32) -> PortResult<()>;
}

//=========================================================================================
// Response Generator Port
//=========================================================================================

/// The normalized result of one generation call.
#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub text: String,
    /// Opaque continuation token, if the service returned one.
    pub thought_signature: Option<String>,
    pub model: String,
}

/// Contract for the external text-generation service. Both operations are a
/// single attempt with no retry; callers decide the fallback on `Err`.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Classifies a user query into the fixed intent vocabulary.
    async fn classify_intent(&self, query: &str) -> PortResult<Intent>;

    /// Produces a conversational reply grounded in the customer's financial
    /// context. `history` is the canonical ascending message history
    /// including the just-stored user message.
    async fn generate(
        &self,
        query: &str,
        customer: &Customer,
        snapshot: &ContextSnapshot,
        history: &[HistoryEntry],
        previous_thought: Option<&str>,
    ) -> PortResult<GeneratedReply>;
}
