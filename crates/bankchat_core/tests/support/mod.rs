//! Shared test doubles: an in-memory record store and a scripted response
//! generator, so the services can be driven without a database or network.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use bankchat_core::context::ContextSnapshot;
use bankchat_core::domain::{
    ChatMessage, Conversation, Customer, HistoryEntry, Intent, Investment, PaymentMethod,
    RiskLevel, Role, Transaction, UploadedFile,
};
use bankchat_core::ports::{
    CategoryTotal, GeneratedReply, InvestmentFilter, PortError, PortResult, ProductTypeValue,
    RecordStore, ResponseGenerator, TransactionFilter,
};

//=========================================================================================
// In-memory Record Store
//=========================================================================================

#[derive(Default)]
struct Inner {
    customers: Vec<Customer>,
    transactions: Vec<Transaction>,
    investments: Vec<Investment>,
    conversations: Vec<Conversation>,
    messages: Vec<ChatMessage>,
    files: Vec<UploadedFile>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_count(&self) -> usize {
        self.inner.lock().unwrap().conversations.len()
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.lock().unwrap().transactions.len()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().unwrap().messages.clone()
    }

    pub fn stored_transaction(&self, transaction_id: &str) -> Option<Transaction> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned()
    }

    pub fn stored_investment(&self, investment_id: &str) -> Option<Investment> {
        self.inner
            .lock()
            .unwrap()
            .investments
            .iter()
            .find(|i| i.investment_id == investment_id)
            .cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_customer(&self, customer: Customer) -> PortResult<Customer> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .customers
            .iter()
            .any(|c| c.customer_id == customer.customer_id)
        {
            return Err(PortError::Conflict(format!(
                "customer {} already exists",
                customer.customer_id
            )));
        }
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> PortResult<Customer> {
        self.inner
            .lock()
            .unwrap()
            .customers
            .iter()
            .find(|c| c.customer_id == customer_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("customer {customer_id} not found")))
    }

    async fn list_customers(&self) -> PortResult<Vec<Customer>> {
        let mut customers = self.inner.lock().unwrap().customers.clone();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    async fn update_customer(&self, customer: Customer) -> PortResult<Customer> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .customers
            .iter_mut()
            .find(|c| c.customer_id == customer.customer_id)
        {
            Some(slot) => {
                *slot = customer.clone();
                Ok(customer)
            }
            None => Err(PortError::NotFound(format!(
                "customer {} not found",
                customer.customer_id
            ))),
        }
    }

    async fn delete_customer(&self, customer_id: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.customers.len();
        inner.customers.retain(|c| c.customer_id != customer_id);
        if inner.customers.len() == before {
            return Err(PortError::NotFound(format!(
                "customer {customer_id} not found"
            )));
        }
        Ok(())
    }

    async fn create_transaction(&self, transaction: Transaction) -> PortResult<Transaction> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .transactions
            .iter()
            .any(|t| t.transaction_id == transaction.transaction_id)
        {
            return Err(PortError::Conflict(format!(
                "transaction {} already exists",
                transaction.transaction_id
            )));
        }
        inner.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(&self, transaction_id: &str) -> PortResult<Transaction> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("transaction {transaction_id} not found"))
            })
    }

    async fn list_transactions(
        &self,
        customer_id: Option<&str>,
        category: Option<&str>,
    ) -> PortResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| customer_id.map_or(true, |id| t.customer_id == id))
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn update_transaction(&self, transaction: Transaction) -> PortResult<Transaction> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .transactions
            .iter_mut()
            .find(|t| t.transaction_id == transaction.transaction_id)
        {
            Some(slot) => {
                *slot = transaction.clone();
                Ok(transaction)
            }
            None => Err(PortError::NotFound(format!(
                "transaction {} not found",
                transaction.transaction_id
            ))),
        }
    }

    async fn delete_transaction(&self, transaction_id: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.transactions.len();
        inner
            .transactions
            .retain(|t| t.transaction_id != transaction_id);
        if inner.transactions.len() == before {
            return Err(PortError::NotFound(format!(
                "transaction {transaction_id} not found"
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
        let mut rows: Vec<Transaction> = self
            .inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.customer_id == customer_id && t.date >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn query_transactions(
        &self,
        customer_id: &str,
        filter: &TransactionFilter,
    ) -> PortResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .filter(|t| filter.category.as_deref().map_or(true, |c| t.category == c))
            .filter(|t| filter.start_date.map_or(true, |d| t.date >= d))
            .filter(|t| filter.end_date.map_or(true, |d| t.date <= d))
            .filter(|t| filter.min_amount.map_or(true, |m| t.amount >= m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn insert_transaction_if_absent(&self, transaction: Transaction) -> PortResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .transactions
            .iter()
            .any(|t| t.transaction_id == transaction.transaction_id)
        {
            return Ok(false);
        }
        inner.transactions.push(transaction);
        Ok(true)
    }

    async fn spending_by_category(
        &self,
        customer_id: &str,
        since: NaiveDate,
    ) -> PortResult<Vec<CategoryTotal>> {
        let inner = self.inner.lock().unwrap();
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for t in inner
            .transactions
            .iter()
            .filter(|t| t.customer_id == customer_id && t.date >= since)
        {
            match totals.iter_mut().find(|row| row.category == t.category) {
                Some(row) => {
                    row.total += t.amount;
                    row.count += 1;
                }
                None => totals.push(CategoryTotal {
                    category: t.category.clone(),
                    total: t.amount,
                    count: 1,
                }),
            }
        }
        totals.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(totals)
    }

    async fn create_investment(&self, investment: Investment) -> PortResult<Investment> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .investments
            .iter()
            .any(|i| i.investment_id == investment.investment_id)
        {
            return Err(PortError::Conflict(format!(
                "investment {} already exists",
                investment.investment_id
            )));
        }
        inner.investments.push(investment.clone());
        Ok(investment)
    }

    async fn get_investment(&self, investment_id: &str) -> PortResult<Investment> {
        self.inner
            .lock()
            .unwrap()
            .investments
            .iter()
            .find(|i| i.investment_id == investment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("investment {investment_id} not found")))
    }

    async fn list_investments(&self, customer_id: Option<&str>) -> PortResult<Vec<Investment>> {
        let mut rows: Vec<Investment> = self
            .inner
            .lock()
            .unwrap()
            .investments
            .iter()
            .filter(|i| customer_id.map_or(true, |id| i.customer_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.returns_percentage.cmp(&a.returns_percentage));
        Ok(rows)
    }

    async fn update_investment(&self, investment: Investment) -> PortResult<Investment> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .investments
            .iter_mut()
            .find(|i| i.investment_id == investment.investment_id)
        {
            Some(slot) => {
                *slot = investment.clone();
                Ok(investment)
            }
            None => Err(PortError::NotFound(format!(
                "investment {} not found",
                investment.investment_id
            ))),
        }
    }

    async fn delete_investment(&self, investment_id: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.investments.len();
        inner.investments.retain(|i| i.investment_id != investment_id);
        if inner.investments.len() == before {
            return Err(PortError::NotFound(format!(
                "investment {investment_id} not found"
            )));
        }
        Ok(())
    }

    async fn investments_for_customer(&self, customer_id: &str) -> PortResult<Vec<Investment>> {
        let mut rows: Vec<Investment> = self
            .inner
            .lock()
            .unwrap()
            .investments
            .iter()
            .filter(|i| i.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(rows)
    }

    async fn query_investments(
        &self,
        customer_id: &str,
        filter: &InvestmentFilter,
    ) -> PortResult<Vec<Investment>> {
        let mut rows: Vec<Investment> = self
            .inner
            .lock()
            .unwrap()
            .investments
            .iter()
            .filter(|i| i.customer_id == customer_id)
            .filter(|i| {
                filter
                    .product_type
                    .as_deref()
                    .map_or(true, |p| i.product_type == p)
            })
            .filter(|i| filter.risk_level.map_or(true, |r| i.risk_level == r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.returns_percentage.cmp(&a.returns_percentage));
        Ok(rows)
    }

    async fn insert_investment_if_absent(&self, investment: Investment) -> PortResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .investments
            .iter()
            .any(|i| i.investment_id == investment.investment_id)
        {
            return Ok(false);
        }
        inner.investments.push(investment);
        Ok(true)
    }

    async fn portfolio_value_by_type(
        &self,
        customer_id: &str,
    ) -> PortResult<Vec<ProductTypeValue>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<ProductTypeValue> = Vec::new();
        for i in inner
            .investments
            .iter()
            .filter(|i| i.customer_id == customer_id)
        {
            match rows.iter_mut().find(|row| row.product_type == i.product_type) {
                Some(row) => row.total_value += i.current_value,
                None => rows.push(ProductTypeValue {
                    product_type: i.product_type.clone(),
                    total_value: i.current_value,
                }),
            }
        }
        Ok(rows)
    }

    async fn create_conversation(&self, conversation: Conversation) -> PortResult<Conversation> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .conversations
            .iter()
            .any(|c| c.conversation_id == conversation.conversation_id)
        {
            return Err(PortError::Conflict(format!(
                "conversation {} already exists",
                conversation.conversation_id
            )));
        }
        inner.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, conversation_id: &str) -> PortResult<Conversation> {
        self.inner
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.conversation_id == conversation_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("conversation {conversation_id} not found"))
            })
    }

    async fn get_customer_conversation(
        &self,
        conversation_id: &str,
        customer_id: &str,
    ) -> PortResult<Conversation> {
        self.inner
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.conversation_id == conversation_id && c.customer_id == customer_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("conversation {conversation_id} not found"))
            })
    }

    async fn append_message(&self, message: ChatMessage) -> PortResult<ChatMessage> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .conversations
            .iter_mut()
            .find(|c| c.conversation_id == message.conversation_id)
        {
            Some(conversation) => conversation.last_activity = message.timestamp,
            None => {
                return Err(PortError::NotFound(format!(
                    "conversation {} not found",
                    message.conversation_id
                )))
            }
        }
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for_conversation(
        &self,
        conversation_id: &str,
    ) -> PortResult<Vec<ChatMessage>> {
        let mut rows: Vec<ChatMessage> = self
            .inner
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(rows)
    }

    async fn create_uploaded_file(&self, file: UploadedFile) -> PortResult<UploadedFile> {
        self.inner.lock().unwrap().files.push(file.clone());
        Ok(file)
    }

    async fn mark_file_processed(&self, id: Uuid, records_imported: i32) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.processed = true;
                file.records_imported = records_imported;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("uploaded file {id} not found"))),
        }
    }
}

//=========================================================================================
// Scripted Response Generator
//=========================================================================================

/// What the fake generator saw on each `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    pub query: String,
    pub customer_name: String,
    pub history_len: usize,
    pub previous_thought: Option<String>,
    pub snapshot_transactions: usize,
}

pub struct FakeGenerator {
    pub intent: Intent,
    pub fail_intent: bool,
    pub fail_generate: bool,
    pub reply_text: String,
    pub thought: Option<String>,
    pub generations: Mutex<Vec<RecordedGeneration>>,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            intent: Intent::GeneralQuery,
            fail_intent: false,
            fail_generate: false,
            reply_text: "Here's what your data says.".to_string(),
            thought: None,
            generations: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<RecordedGeneration> {
        self.generations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGenerator for FakeGenerator {
    async fn classify_intent(&self, _query: &str) -> PortResult<Intent> {
        if self.fail_intent {
            return Err(PortError::Unexpected("classifier offline".to_string()));
        }
        Ok(self.intent)
    }

    async fn generate(
        &self,
        query: &str,
        customer: &Customer,
        snapshot: &ContextSnapshot,
        history: &[HistoryEntry],
        previous_thought: Option<&str>,
    ) -> PortResult<GeneratedReply> {
        self.generations.lock().unwrap().push(RecordedGeneration {
            query: query.to_string(),
            customer_name: customer.name.clone(),
            history_len: history.len(),
            previous_thought: previous_thought.map(|s| s.to_string()),
            snapshot_transactions: snapshot.transactions.len(),
        });
        if self.fail_generate {
            return Err(PortError::Unexpected("generation service down".to_string()));
        }
        Ok(GeneratedReply {
            text: self.reply_text.clone(),
            thought_signature: self.thought.clone(),
            model: "fake-model".to_string(),
        })
    }
}

//=========================================================================================
// Record Builders
//=========================================================================================

pub fn customer(customer_id: &str, name: &str) -> Customer {
    Customer {
        customer_id: customer_id.to_string(),
        name: name.to_string(),
        age: 34,
        risk_level: RiskLevel::Medium,
        annual_income: Decimal::from(1_200_000),
        financial_goals: "retirement_planning".to_string(),
        account_opening_date: "2020-06-15".parse().unwrap(),
        email: format!("{customer_id}@example.com"),
        phone: "9876500000".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn transaction(
    transaction_id: &str,
    customer_id: &str,
    date: NaiveDate,
    category: &str,
    amount: i64,
) -> Transaction {
    Transaction {
        transaction_id: transaction_id.to_string(),
        customer_id: customer_id.to_string(),
        date,
        category: category.to_string(),
        merchant: format!("{category} merchant"),
        amount: Decimal::from(amount),
        payment_method: PaymentMethod::Upi,
        description: String::new(),
        created_at: Utc::now(),
    }
}

pub fn investment(
    investment_id: &str,
    customer_id: &str,
    product_type: &str,
    invested: i64,
    current: i64,
    pct: &str,
) -> Investment {
    Investment {
        investment_id: investment_id.to_string(),
        customer_id: customer_id.to_string(),
        product_type: product_type.to_string(),
        product_name: format!("{investment_id} plan"),
        purchase_date: "2023-01-10".parse().unwrap(),
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

pub fn user_message(conversation_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        conversation_id: conversation_id.to_string(),
        role: Role::User,
        content: content.to_string(),
        timestamp: Utc::now(),
        intent: None,
        data_sources: Vec::new(),
        thought_signature: None,
    }
}
