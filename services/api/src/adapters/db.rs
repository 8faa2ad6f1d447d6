//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `RecordStore` port from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.
//!
//! Queries use the runtime API rather than the compile-time macros so the
//! crate builds without a reachable database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use bankchat_core::domain::{
    ChatMessage, Conversation, Customer, Investment, Transaction, UploadedFile,
};
use bankchat_core::ports::{
    CategoryTotal, InvestmentFilter, PortError, PortResult, ProductTypeValue, RecordStore,
    TransactionFilter,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecordStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a fetch error, turning `RowNotFound` into a port-level not-found.
fn fetch_err(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => PortError::Unexpected(other.to_string()),
    }
}

/// Maps a write error, surfacing unique-key violations as conflicts.
fn write_err(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            PortError::Conflict(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CustomerRecord {
    customer_id: String,
    name: String,
    age: i32,
    risk_level: String,
    annual_income: Decimal,
    financial_goals: String,
    account_opening_date: NaiveDate,
    email: String,
    phone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRecord {
    fn to_domain(self) -> PortResult<Customer> {
        Ok(Customer {
            risk_level: self
                .risk_level
                .parse()
                .map_err(PortError::Unexpected)?,
            customer_id: self.customer_id,
            name: self.name,
            age: self.age,
            annual_income: self.annual_income,
            financial_goals: self.financial_goals,
            account_opening_date: self.account_opening_date,
            email: self.email,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TransactionRecord {
    transaction_id: String,
    customer_id: String,
    date: NaiveDate,
    category: String,
    merchant: String,
    amount: Decimal,
    payment_method: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TransactionRecord {
    fn to_domain(self) -> PortResult<Transaction> {
        Ok(Transaction {
            payment_method: self
                .payment_method
                .parse()
                .map_err(PortError::Unexpected)?,
            transaction_id: self.transaction_id,
            customer_id: self.customer_id,
            date: self.date,
            category: self.category,
            merchant: self.merchant,
            amount: self.amount,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct InvestmentRecord {
    investment_id: String,
    customer_id: String,
    product_type: String,
    product_name: String,
    purchase_date: NaiveDate,
    invested_amount: Decimal,
    current_value: Decimal,
    units: Decimal,
    purchase_nav: Decimal,
    current_nav: Decimal,
    returns_absolute: Decimal,
    returns_percentage: Decimal,
    risk_level: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvestmentRecord {
    fn to_domain(self) -> PortResult<Investment> {
        Ok(Investment {
            risk_level: self
                .risk_level
                .parse()
                .map_err(PortError::Unexpected)?,
            investment_id: self.investment_id,
            customer_id: self.customer_id,
            product_type: self.product_type,
            product_name: self.product_name,
            purchase_date: self.purchase_date,
            invested_amount: self.invested_amount,
            current_value: self.current_value,
            units: self.units,
            purchase_nav: self.purchase_nav,
            current_nav: self.current_nav,
            returns_absolute: self.returns_absolute,
            returns_percentage: self.returns_percentage,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ConversationRecord {
    conversation_id: String,
    customer_id: String,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    is_active: bool,
}

impl ConversationRecord {
    fn to_domain(self) -> Conversation {
        Conversation {
            conversation_id: self.conversation_id,
            customer_id: self.customer_id,
            started_at: self.started_at,
            last_activity: self.last_activity,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    conversation_id: String,
    role: String,
    content: String,
    timestamp: DateTime<Utc>,
    intent: Option<String>,
    data_sources: Json<Vec<String>>,
    thought_signature: Option<String>,
}

impl MessageRecord {
    fn to_domain(self) -> PortResult<ChatMessage> {
        let intent = match self.intent {
            Some(raw) => Some(raw.parse().map_err(PortError::Unexpected)?),
            None => None,
        };
        Ok(ChatMessage {
            role: self.role.parse().map_err(PortError::Unexpected)?,
            id: self.id,
            conversation_id: self.conversation_id,
            content: self.content,
            timestamp: self.timestamp,
            intent,
            data_sources: self.data_sources.0,
            thought_signature: self.thought_signature,
        })
    }
}

const CUSTOMER_COLUMNS: &str = "customer_id, name, age, risk_level, annual_income, \
     financial_goals, account_opening_date, email, phone, created_at, updated_at";
const TRANSACTION_COLUMNS: &str = "transaction_id, customer_id, date, category, merchant, \
     amount, payment_method, description, created_at";
const INVESTMENT_COLUMNS: &str = "investment_id, customer_id, product_type, product_name, \
     purchase_date, invested_amount, current_value, units, purchase_nav, current_nav, \
     returns_absolute, returns_percentage, risk_level, created_at, updated_at";
const CONVERSATION_COLUMNS: &str =
    "conversation_id, customer_id, started_at, last_activity, is_active";
const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, timestamp, intent, \
     data_sources, thought_signature";

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for PgStore {
    async fn create_customer(&self, customer: Customer) -> PortResult<Customer> {
        sqlx::query(
            "INSERT INTO customers (customer_id, name, age, risk_level, annual_income, \
             financial_goals, account_opening_date, email, phone, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&customer.customer_id)
        .bind(&customer.name)
        .bind(customer.age)
        .bind(customer.risk_level.as_str())
        .bind(customer.annual_income)
        .bind(&customer.financial_goals)
        .bind(customer.account_opening_date)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> PortResult<Customer> {
        let record = sqlx::query_as::<_, CustomerRecord>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fetch_err(e, format!("Customer {customer_id} not found")))?;
        record.to_domain()
    }

    async fn list_customers(&self) -> PortResult<Vec<Customer>> {
        let records = sqlx::query_as::<_, CustomerRecord>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_customer(&self, customer: Customer) -> PortResult<Customer> {
        let result = sqlx::query(
            "UPDATE customers SET name = $2, age = $3, risk_level = $4, annual_income = $5, \
             financial_goals = $6, account_opening_date = $7, email = $8, phone = $9, \
             updated_at = $10 WHERE customer_id = $1",
        )
        .bind(&customer.customer_id)
        .bind(&customer.name)
        .bind(customer.age)
        .bind(customer.risk_level.as_str())
        .bind(customer.annual_income)
        .bind(&customer.financial_goals)
        .bind(customer.account_opening_date)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Customer {} not found",
                customer.customer_id
            )));
        }
        Ok(customer)
    }

    async fn delete_customer(&self, customer_id: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Customer {customer_id} not found"
            )));
        }
        Ok(())
    }

    async fn create_transaction(&self, transaction: Transaction) -> PortResult<Transaction> {
        sqlx::query(
            "INSERT INTO transactions (transaction_id, customer_id, date, category, merchant, \
             amount, payment_method, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&transaction.transaction_id)
        .bind(&transaction.customer_id)
        .bind(transaction.date)
        .bind(&transaction.category)
        .bind(&transaction.merchant)
        .bind(transaction.amount)
        .bind(transaction.payment_method.as_str())
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(transaction)
    }

    async fn get_transaction(&self, transaction_id: &str) -> PortResult<Transaction> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fetch_err(e, format!("Transaction {transaction_id} not found")))?;
        record.to_domain()
    }

    async fn list_transactions(
        &self,
        customer_id: Option<&str>,
        category: Option<&str>,
    ) -> PortResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1 = 1"
        ));
        if let Some(customer_id) = customer_id {
            builder.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(category) = category {
            builder.push(" AND category = ").push_bind(category);
        }
        builder.push(" ORDER BY date DESC, created_at DESC");

        let records = builder
            .build_query_as::<TransactionRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_transaction(&self, transaction: Transaction) -> PortResult<Transaction> {
        let result = sqlx::query(
            "UPDATE transactions SET customer_id = $2, date = $3, category = $4, \
             merchant = $5, amount = $6, payment_method = $7, description = $8 \
             WHERE transaction_id = $1",
        )
        .bind(&transaction.transaction_id)
        .bind(&transaction.customer_id)
        .bind(transaction.date)
        .bind(&transaction.category)
        .bind(&transaction.merchant)
        .bind(transaction.amount)
        .bind(transaction.payment_method.as_str())
        .bind(&transaction.description)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Transaction {} not found",
                transaction.transaction_id
            )));
        }
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE transaction_id = $1")
            .bind(transaction_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Transaction {transaction_id} not found"
            )));
        }
        Ok(())
    }

    async fn recent_transactions(
        &self,
        customer_id: &str,
        since: NaiveDate,
        limit: i64,
    ) -> PortResult<Vec<Transaction>> {
        let records = sqlx::query_as::<_, TransactionRecord>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE customer_id = $1 AND date >= $2 \
             ORDER BY date DESC, created_at DESC LIMIT $3"
        ))
        .bind(customer_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn query_transactions(
        &self,
        customer_id: &str,
        filter: &TransactionFilter,
    ) -> PortResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE customer_id = "
        ));
        builder.push_bind(customer_id);
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(start_date) = filter.start_date {
            builder.push(" AND date >= ").push_bind(start_date);
        }
        if let Some(end_date) = filter.end_date {
            builder.push(" AND date <= ").push_bind(end_date);
        }
        if let Some(min_amount) = filter.min_amount {
            builder.push(" AND amount >= ").push_bind(min_amount);
        }
        builder.push(" ORDER BY date DESC, created_at DESC");

        let records = builder
            .build_query_as::<TransactionRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn insert_transaction_if_absent(&self, transaction: Transaction) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO transactions (transaction_id, customer_id, date, category, merchant, \
             amount, payment_method, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (transaction_id) DO NOTHING",
        )
        .bind(&transaction.transaction_id)
        .bind(&transaction.customer_id)
        .bind(transaction.date)
        .bind(&transaction.category)
        .bind(&transaction.merchant)
        .bind(transaction.amount)
        .bind(transaction.payment_method.as_str())
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn spending_by_category(
        &self,
        customer_id: &str,
        since: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>> {
        #[derive(FromRow)]
        struct Row {
            category: String,
            total: Decimal,
            count: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT category, SUM(amount) AS total, COUNT(*) AS count FROM transactions \
             WHERE customer_id = $1 AND date >= $2 \
             GROUP BY category ORDER BY total DESC",
        )
        .bind(customer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| CategoryTotal {
                category: row.category,
                total: row.total,
                count: row.count,
            })
            .collect())
    }

    async fn create_investment(&self, investment: Investment) -> PortResult<Investment> {
        sqlx::query(
            "INSERT INTO investments (investment_id, customer_id, product_type, product_name, \
             purchase_date, invested_amount, current_value, units, purchase_nav, current_nav, \
             returns_absolute, returns_percentage, risk_level, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&investment.investment_id)
        .bind(&investment.customer_id)
        .bind(&investment.product_type)
        .bind(&investment.product_name)
        .bind(investment.purchase_date)
        .bind(investment.invested_amount)
        .bind(investment.current_value)
        .bind(investment.units)
        .bind(investment.purchase_nav)
        .bind(investment.current_nav)
        .bind(investment.returns_absolute)
        .bind(investment.returns_percentage)
        .bind(investment.risk_level.as_str())
        .bind(investment.created_at)
        .bind(investment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(investment)
    }

    async fn get_investment(&self, investment_id: &str) -> PortResult<Investment> {
        let record = sqlx::query_as::<_, InvestmentRecord>(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE investment_id = $1"
        ))
        .bind(investment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fetch_err(e, format!("Investment {investment_id} not found")))?;
        record.to_domain()
    }

    async fn list_investments(&self, customer_id: Option<&str>) -> PortResult<Vec<Investment>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE 1 = 1"
        ));
        if let Some(customer_id) = customer_id {
            builder.push(" AND customer_id = ").push_bind(customer_id);
        }
        builder.push(" ORDER BY returns_percentage DESC");

        let records = builder
            .build_query_as::<InvestmentRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_investment(&self, investment: Investment) -> PortResult<Investment> {
        let result = sqlx::query(
            "UPDATE investments SET customer_id = $2, product_type = $3, product_name = $4, \
             purchase_date = $5, invested_amount = $6, current_value = $7, units = $8, \
             purchase_nav = $9, current_nav = $10, returns_absolute = $11, \
             returns_percentage = $12, risk_level = $13, updated_at = $14 \
             WHERE investment_id = $1",
        )
        .bind(&investment.investment_id)
        .bind(&investment.customer_id)
        .bind(&investment.product_type)
        .bind(&investment.product_name)
        .bind(investment.purchase_date)
        .bind(investment.invested_amount)
        .bind(investment.current_value)
        .bind(investment.units)
        .bind(investment.purchase_nav)
        .bind(investment.current_nav)
        .bind(investment.returns_absolute)
        .bind(investment.returns_percentage)
        .bind(investment.risk_level.as_str())
        .bind(investment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Investment {} not found",
                investment.investment_id
            )));
        }
        Ok(investment)
    }

    async fn delete_investment(&self, investment_id: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM investments WHERE investment_id = $1")
            .bind(investment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Investment {investment_id} not found"
            )));
        }
        Ok(())
    }

    async fn investments_for_customer(&self, customer_id: &str) -> PortResult<Vec<Investment>> {
        let records = sqlx::query_as::<_, InvestmentRecord>(&format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE customer_id = $1 \
             ORDER BY purchase_date DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn query_investments(
        &self,
        customer_id: &str,
        filter: &InvestmentFilter,
    ) -> PortResult<Vec<Investment>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE customer_id = "
        ));
        builder.push_bind(customer_id);
        if let Some(product_type) = &filter.product_type {
            builder.push(" AND product_type = ").push_bind(product_type);
        }
        if let Some(risk_level) = filter.risk_level {
            builder.push(" AND risk_level = ").push_bind(risk_level.as_str());
        }
        builder.push(" ORDER BY returns_percentage DESC");

        let records = builder
            .build_query_as::<InvestmentRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn insert_investment_if_absent(&self, investment: Investment) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO investments (investment_id, customer_id, product_type, product_name, \
             purchase_date, invested_amount, current_value, units, purchase_nav, current_nav, \
             returns_absolute, returns_percentage, risk_level, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (investment_id) DO NOTHING",
        )
        .bind(&investment.investment_id)
        .bind(&investment.customer_id)
        .bind(&investment.product_type)
        .bind(&investment.product_name)
        .bind(investment.purchase_date)
        .bind(investment.invested_amount)
        .bind(investment.current_value)
        .bind(investment.units)
        .bind(investment.purchase_nav)
        .bind(investment.current_nav)
        .bind(investment.returns_absolute)
        .bind(investment.returns_percentage)
        .bind(investment.risk_level.as_str())
        .bind(investment.created_at)
        .bind(investment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn portfolio_value_by_type(
        &self,
        customer_id: &str,
    ) -> PortResult<Vec<ProductTypeValue>> {
        #[derive(FromRow)]
        struct Row {
            product_type: String,
            total_value: Decimal,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT product_type, SUM(current_value) AS total_value FROM investments \
             WHERE customer_id = $1 GROUP BY product_type",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ProductTypeValue {
                product_type: row.product_type,
                total_value: row.total_value,
            })
            .collect())
    }

    async fn create_conversation(&self, conversation: Conversation) -> PortResult<Conversation> {
        sqlx::query(
            "INSERT INTO chat_conversations (conversation_id, customer_id, started_at, \
             last_activity, is_active) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&conversation.conversation_id)
        .bind(&conversation.customer_id)
        .bind(conversation.started_at)
        .bind(conversation.last_activity)
        .bind(conversation.is_active)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(conversation)
    }

    async fn get_conversation(&self, conversation_id: &str) -> PortResult<Conversation> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM chat_conversations WHERE conversation_id = $1"
        ))
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fetch_err(e, format!("Conversation {conversation_id} not found")))?;
        Ok(record.to_domain())
    }

    async fn get_customer_conversation(
        &self,
        conversation_id: &str,
        customer_id: &str,
    ) -> PortResult<Conversation> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM chat_conversations \
             WHERE conversation_id = $1 AND customer_id = $2"
        ))
        .bind(conversation_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fetch_err(e, format!("Conversation {conversation_id} not found")))?;
        Ok(record.to_domain())
    }

    async fn append_message(&self, message: ChatMessage) -> PortResult<ChatMessage> {
        sqlx::query(
            "INSERT INTO chat_messages (id, conversation_id, role, content, timestamp, intent, \
             data_sources, thought_signature) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(message.intent.map(|i| i.as_str()))
        .bind(Json(&message.data_sources))
        .bind(&message.thought_signature)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        // Last activity mirrors the newest message timestamp.
        let result = sqlx::query(
            "UPDATE chat_conversations SET last_activity = $1 WHERE conversation_id = $2",
        )
        .bind(message.timestamp)
        .bind(&message.conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Conversation {} not found",
                message.conversation_id
            )));
        }

        Ok(message)
    }

    async fn messages_for_conversation(
        &self,
        conversation_id: &str,
    ) -> PortResult<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE conversation_id = $1 \
             ORDER BY timestamp ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_uploaded_file(&self, file: UploadedFile) -> PortResult<UploadedFile> {
        sqlx::query(
            "INSERT INTO uploaded_files (id, file_name, file_type, customer_id, file_path, \
             uploaded_at, processed, records_imported) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(file.id)
        .bind(&file.file_name)
        .bind(file.file_type.as_str())
        .bind(&file.customer_id)
        .bind(&file.file_path)
        .bind(file.uploaded_at)
        .bind(file.processed)
        .bind(file.records_imported)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(file)
    }

    async fn mark_file_processed(&self, id: Uuid, records_imported: i32) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE uploaded_files SET processed = TRUE, records_imported = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(records_imported)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Uploaded file {id} not found")));
        }
        Ok(())
    }
}
