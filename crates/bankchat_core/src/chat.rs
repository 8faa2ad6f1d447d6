//! crates/bankchat_core/src/chat.rs
//!
//! The end-to-end chat pipeline: resolve the conversation, persist the user
//! message, aggregate financial context, call the response generator, persist
//! the assistant message, and assemble the reply with follow-up suggestions.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{error, warn};

use crate::context::{ContextService, ContextSnapshot};
use crate::conversation::ConversationService;
use crate::domain::{Intent, Role};
use crate::ports::{GeneratedReply, PortResult, RecordStore, ResponseGenerator};

/// Returned verbatim when the generation call fails outright. The exchange is
/// still persisted so the transcript stays complete.
pub const GENERATION_FALLBACK: &str = "Oops, technical glitch! 😅 Try again in a moment.";

/// Data sources recorded on every assistant message.
const DATA_SOURCES: [&str; 3] = ["transactions", "investments", "customer_profile"];

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct DataContext {
    pub transaction_count: usize,
    pub investment_count: usize,
}

/// The assembled result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub conversation_id: String,
    pub response: String,
    pub intent: Intent,
    pub suggestions: Vec<String>,
    pub data_context: DataContext,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn ResponseGenerator>,
    context: ContextService,
    conversations: ConversationService,
}

impl ChatService {
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            context: ContextService::new(store.clone()),
            conversations: ConversationService::new(store.clone()),
            store,
            generator,
        }
    }

    /// Handles one chat turn for a customer.
    ///
    /// An unknown customer is the only hard failure; it propagates before
    /// anything is persisted. Generator failures degrade to fixed fallbacks
    /// and never reach the caller as errors.
    pub async fn handle(
        &self,
        customer_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> PortResult<ChatOutcome> {
        let customer = self.store.get_customer(customer_id).await?;

        let conversation = self
            .conversations
            .resolve_or_create(customer_id, conversation_id)
            .await?;

        self.conversations
            .append_message(
                &conversation.conversation_id,
                Role::User,
                message,
                None,
                Vec::new(),
                None,
            )
            .await?;

        let history = self
            .conversations
            .history(&conversation.conversation_id)
            .await?;

        let intent = match self.generator.classify_intent(message).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("intent classification failed, defaulting: {e}");
                Intent::GeneralQuery
            }
        };

        let snapshot = self
            .context
            .customer_context(customer_id)
            .await?
            .unwrap_or_else(|| ContextSnapshot::empty(&customer));

        // Continuation token from the most recent assistant turn, if any.
        let previous_thought = history
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Assistant)
            .and_then(|entry| entry.thought_signature.clone());

        // Single attempt across the network boundary; an error becomes the
        // fixed apology rather than a failed request.
        let reply = match self
            .generator
            .generate(
                message,
                &customer,
                &snapshot,
                &history,
                previous_thought.as_deref(),
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("response generation failed: {e}");
                GeneratedReply {
                    text: GENERATION_FALLBACK.to_string(),
                    thought_signature: None,
                    model: String::new(),
                }
            }
        };

        self.conversations
            .append_message(
                &conversation.conversation_id,
                Role::Assistant,
                &reply.text,
                Some(intent),
                DATA_SOURCES.iter().map(|s| s.to_string()).collect(),
                reply.thought_signature,
            )
            .await?;

        Ok(ChatOutcome {
            conversation_id: conversation.conversation_id,
            response: reply.text,
            intent,
            suggestions: follow_up_suggestions(intent),
            data_context: DataContext {
                transaction_count: snapshot.transactions.len(),
                investment_count: snapshot.investments.len(),
            },
        })
    }
}

//=========================================================================================
// Follow-up Suggestions
//=========================================================================================

fn suggestion_bucket(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::TransactionAnalysis => &[
            "Break down my spending by category",
            "Were there any large, one-time expenses?",
            "How does my spending compare to my income?",
        ],
        Intent::InvestmentOverview => &[
            "Which investment has the highest return?",
            "What's the risk level of my overall portfolio?",
            "Tell me more about my worst-performing asset.",
        ],
        Intent::Recommendation => &[
            "Based on my risk profile, what should I buy next?",
            "I have ₹50,000 to invest, what do you suggest?",
            "How can I better align my portfolio with my goals?",
        ],
        Intent::Summary => &[
            "Give me a detailed financial health report.",
            "What are the top 3 insights from my data?",
            "Summarize my financial situation in one paragraph.",
        ],
        Intent::GeneralQuery => &[
            "Analyze my spending habits.",
            "Give me a deep dive into my investments.",
            "What's one thing I could do better financially?",
        ],
    }
}

/// Up to three follow-up prompts sampled without replacement from the
/// intent's bucket.
pub fn follow_up_suggestions(intent: Intent) -> Vec<String> {
    let bucket = suggestion_bucket(intent);
    let mut rng = rand::thread_rng();
    bucket
        .choose_multiple(&mut rng, MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_come_from_the_intent_bucket() {
        let suggestions = follow_up_suggestions(Intent::InvestmentOverview);
        assert_eq!(suggestions.len(), 3);
        let bucket = suggestion_bucket(Intent::InvestmentOverview);
        for s in &suggestions {
            assert!(bucket.contains(&s.as_str()));
        }
    }

    #[test]
    fn sample_never_repeats() {
        let suggestions = follow_up_suggestions(Intent::Summary);
        let mut unique = suggestions.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), suggestions.len());
    }
}
