//! crates/bankchat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP wire format.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Risk appetite tiers shared by customers and investment products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    NetBanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "netbanking",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" => Ok(PaymentMethod::NetBanking),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// A bank customer profile. The `customer_id` is the immutable identity key;
/// all other fields are mutable through administrative update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    pub age: i32,
    pub risk_level: RiskLevel,
    pub annual_income: Decimal,
    pub financial_goals: String,
    pub account_opening_date: NaiveDate,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single spending transaction. Belongs to exactly one customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub category: String,
    pub merchant: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An investment holding. The `returns_*` fields are supplied by the source
/// data and trusted as-is; they are never recomputed from amount/value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub investment_id: String,
    pub customer_id: String,
    pub product_type: String,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub invested_amount: Decimal,
    pub current_value: Decimal,
    pub units: Decimal,
    pub purchase_nav: Decimal,
    pub current_nav: Decimal,
    pub returns_absolute: Decimal,
    pub returns_percentage: Decimal,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chat session scoped to one customer. `last_activity` tracks the
/// timestamp of the most recent message append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub customer_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The fixed vocabulary the intent classifier maps a user query onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TransactionAnalysis,
    InvestmentOverview,
    Recommendation,
    GeneralQuery,
    Summary,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::TransactionAnalysis => "transaction_analysis",
            Intent::InvestmentOverview => "investment_overview",
            Intent::Recommendation => "recommendation",
            Intent::GeneralQuery => "general_query",
            Intent::Summary => "summary",
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction_analysis" => Ok(Intent::TransactionAnalysis),
            "investment_overview" => Ok(Intent::InvestmentOverview),
            "recommendation" => Ok(Intent::Recommendation),
            "general_query" => Ok(Intent::GeneralQuery),
            "summary" => Ok(Intent::Summary),
            other => Err(format!("unknown intent '{other}'")),
        }
    }
}

/// A single message inside a conversation. Messages are totally ordered by
/// `timestamp`; that order is the canonical history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub intent: Option<Intent>,
    pub data_sources: Vec<String>,
    /// Opaque continuation token from the generation service. Pass-through,
    /// never parsed.
    pub thought_signature: Option<String>,
}

/// One ordered history entry handed to the response generator.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub thought_signature: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Transaction,
    Investment,
    Customer,
    Document,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Transaction => "transaction",
            FileType::Investment => "investment",
            FileType::Customer => "customer",
            FileType::Document => "document",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(FileType::Transaction),
            "investment" => Ok(FileType::Investment),
            "customer" => Ok(FileType::Customer),
            "document" => Ok(FileType::Document),
            other => Err(format!("unknown file type '{other}'")),
        }
    }
}

/// Metadata record for an uploaded tabular file. Created at upload time and
/// updated once processing completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub file_name: String,
    pub file_type: FileType,
    pub customer_id: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed: bool,
    pub records_imported: i32,
}

/// Normalizes a raw category or product-type label for display:
/// underscores become spaces and each word is title-cased
/// (`"utility_bills"` -> `"Utility Bills"`).
pub fn display_label(raw: &str) -> String {
    raw.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_normalizes_underscores_and_case() {
        assert_eq!(display_label("utility_bills"), "Utility Bills");
        assert_eq!(display_label("mutual_fund"), "Mutual Fund");
        assert_eq!(display_label("Groceries"), "Groceries");
        assert_eq!(display_label("FIXED_DEPOSIT"), "Fixed Deposit");
    }

    #[test]
    fn enum_round_trips() {
        assert_eq!("upi".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(PaymentMethod::NetBanking.as_str(), "netbanking");
        assert_eq!(
            "transaction_analysis".parse::<Intent>().unwrap(),
            Intent::TransactionAnalysis
        );
        assert!("spending".parse::<Intent>().is_err());
        assert_eq!("high".parse::<RiskLevel>().unwrap(), RiskLevel::High);
    }
}
