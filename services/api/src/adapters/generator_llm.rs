//! services/api/src/adapters/generator_llm.rs
//!
//! This module contains the adapter for the external text-generation service.
//! It implements the `ResponseGenerator` port from the `core` crate using an
//! OpenAI-compatible chat-completion API.

const INTENT_PROMPT: &str = r#"Classify this banking query into ONE intent:
- transaction_analysis: spending/expenses questions
- investment_overview: portfolio/returns questions
- recommendation: seeking advice
- general_query: other questions
- summary: financial overview requests

Query: {query}

Intent (one word):"#;

const FIRST_MESSAGE_INSTRUCTION: &str = "Start with a friendly welcome to the user by name.";
const FOLLOW_UP_INSTRUCTION: &str =
    "Jump straight into the answer. Do NOT greet the user again.";

/// Returned when the service answers but with no usable text.
const EMPTY_REPLY_FALLBACK: &str =
    "I'm having trouble thinking of a detailed response. Could you ask differently?";

/// Prior turns handed to the generation service are trimmed to this many
/// history entries.
const HISTORY_WINDOW: usize = 8;
/// At most this many recent transactions are embedded in the prompt.
const PROMPT_TRANSACTION_CAP: usize = 10;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use bankchat_core::context::ContextSnapshot;
use bankchat_core::domain::{display_label, Customer, HistoryEntry, Intent, Role};
use bankchat_core::ports::{GeneratedReply, PortError, PortResult, ResponseGenerator};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ResponseGenerator` using an OpenAI-compatible
/// chat-completion API.
#[derive(Clone)]
pub struct OpenAiGeneratorAdapter {
    client: Client<OpenAIConfig>,
    chat_model: String,
    intent_model: String,
}

impl OpenAiGeneratorAdapter {
    /// Creates a new `OpenAiGeneratorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, chat_model: String, intent_model: String) -> Self {
        Self {
            client,
            chat_model,
            intent_model,
        }
    }
}

//=========================================================================================
// `ResponseGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl ResponseGenerator for OpenAiGeneratorAdapter {
    /// Classifies a user query with a fixed low-temperature instruction
    /// prompt. Any transport failure or unusable output surfaces as `Err`;
    /// the chat pipeline owns the general_query fallback.
    async fn classify_intent(&self, query: &str) -> PortResult<Intent> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.intent_model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(INTENT_PROMPT.replace("{query}", query))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()])
            .temperature(0.1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let label = content.trim().lines().next().unwrap_or("").trim().to_lowercase();
        label
            .parse()
            .map_err(|_| PortError::Invalid(format!("unusable intent label '{label}'")))
    }

    /// One attempt across the network boundary. An answered-but-empty
    /// completion is normalized to a fixed line; transport errors propagate
    /// for the caller's fallback.
    async fn generate(
        &self,
        query: &str,
        customer: &Customer,
        snapshot: &ContextSnapshot,
        history: &[HistoryEntry],
        _previous_thought: Option<&str>,
    ) -> PortResult<GeneratedReply> {
        let is_first_message = history.len() <= 1;
        let current_query = build_turn_prompt(customer, snapshot, query, is_first_message);

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        for entry in history_window(history) {
            let message = match entry.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(entry.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                // The service only distinguishes user turns from model turns.
                _ => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(entry.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(current_query)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(messages)
            .temperature(0.8)
            .top_p(0.95)
            .max_tokens(800u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        Ok(GeneratedReply {
            text: if text.is_empty() {
                EMPTY_REPLY_FALLBACK.to_string()
            } else {
                text
            },
            // The chat-completion API carries no continuation token; the
            // field stays a pass-through for services that do.
            thought_signature: None,
            model: self.chat_model.clone(),
        })
    }
}

//=========================================================================================
// Prompt Assembly
//=========================================================================================

/// Builds the deterministic data-rich system prompt for one customer.
fn build_context_prompt(customer: &Customer, snapshot: &ContextSnapshot) -> String {
    let mut prompt = format!(
        "You are Arya, a top-tier financial analyst and relationship manager at SmartBank. \
         Your goal is to provide deep, data-driven insights in a friendly, human way.\n\n\
         CUSTOMER PROFILE:\n\
         - Name: {name}\n\
         - Age: {age}\n\
         - Risk Tolerance: {risk}\n\
         - Annual Income: ₹{income}\n\
         - Financial Goals: {goals}\n\n\
         ---\nFINANCIAL DATA SNAPSHOT\n---\n",
        name = customer.name,
        age = customer.age,
        risk = display_label(customer.risk_level.as_str()),
        income = format_inr(customer.annual_income),
        goals = display_label(&customer.financial_goals),
    );

    if !snapshot.transactions.is_empty() {
        prompt.push_str("\nRECENT TRANSACTIONS (Sample of up to 10):\n");
        for t in snapshot.transactions.iter().take(PROMPT_TRANSACTION_CAP) {
            prompt.push_str(&format!(
                "- {}: {} ({}) - ₹{}\n",
                t.date,
                t.merchant,
                t.category,
                format_inr(t.amount)
            ));
        }
    }

    if !snapshot.investments.is_empty() {
        prompt.push_str("\nINVESTMENT HOLDINGS:\n");
        for i in &snapshot.investments {
            prompt.push_str(&format!(
                "- {} ({}): Invested ₹{}, now worth ₹{} ({}% return)\n",
                i.product_name,
                i.product_type,
                format_inr(i.invested_amount),
                format_inr(i.current_value),
                format_signed_pct(i.returns_percentage)
            ));
        }
    }

    prompt.push_str("\n--- END OF DATA ---");
    prompt
}

/// Assembles the full per-turn message: context prompt, the user's query,
/// and the per-turn instruction block with the greet/no-greet switch.
fn build_turn_prompt(
    customer: &Customer,
    snapshot: &ContextSnapshot,
    query: &str,
    is_first_message: bool,
) -> String {
    let instruction = if is_first_message {
        FIRST_MESSAGE_INSTRUCTION
    } else {
        FOLLOW_UP_INSTRUCTION
    };

    format!(
        "{system_prompt}\n\n\
         User: {query}\n\n\
         INSTRUCTIONS FOR ARYA:\n\
         - **{instruction}**\n\
         - **Conversational Flow**: Write in natural paragraphs, not just lists. Tell a story with the data.\n\
         - **Be Detailed**: Go beyond simple answers. Provide numbers, percentages, comparisons, and insights.\n\
         - **Use the Data**: Your answer MUST be grounded in the provided financial data. Mention specific transactions or investments.\n\
         - **Human Tone**: Write like a real, friendly financial expert. Use contractions, casual language, and be encouraging.\n\
         - **Structure**: You can use bullet points for lists of numbers, but wrap them in conversational text.\n\
         - **Proactive Advice**: Always end with a valuable insight or a thoughtful question to guide the user.\n\n\
         Arya's Detailed Response:",
        system_prompt = build_context_prompt(customer, snapshot),
    )
}

/// The most recent history entries handed to the service as prior turns.
fn history_window(history: &[HistoryEntry]) -> &[HistoryEntry] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Renders a rupee amount rounded to whole units with thousands separators.
fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let raw = rounded.to_string();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let digits = digits.split('.').next().unwrap_or(digits);

    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{}", grouped.chars().rev().collect::<String>())
}

/// Renders a return percentage with an explicit sign and two decimals.
fn format_signed_pct(pct: Decimal) -> String {
    format!("{:+.2}", pct.to_f64().unwrap_or(0.0))
}
