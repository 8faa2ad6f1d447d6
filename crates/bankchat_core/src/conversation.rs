//! crates/bankchat_core/src/conversation.rs
//!
//! Conversation tracking: resolves or creates a conversation for a customer,
//! appends messages with server timestamps, and reconstructs the ordered
//! history used for prompting.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ChatMessage, Conversation, HistoryEntry, Intent, Role};
use crate::ports::{PortError, PortResult, RecordStore};

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn RecordStore>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Reuses the supplied conversation only when it exists AND belongs to
    /// the given customer; any other case mints a fresh conversation. A key
    /// owned by a different customer is never reused.
    pub async fn resolve_or_create(
        &self,
        customer_id: &str,
        supplied: Option<&str>,
    ) -> PortResult<Conversation> {
        if let Some(conversation_id) = supplied {
            match self
                .store
                .get_customer_conversation(conversation_id, customer_id)
                .await
            {
                Ok(conversation) => return Ok(conversation),
                Err(PortError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let now = Utc::now();
        self.store
            .create_conversation(Conversation {
                conversation_id: Uuid::new_v4().to_string(),
                customer_id: customer_id.to_string(),
                started_at: now,
                last_activity: now,
                is_active: true,
            })
            .await
    }

    /// Appends a message with a server-assigned timestamp. The store bumps
    /// the conversation's `last_activity` to match.
    #[allow(clippy::too_many_arguments)]
    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        intent: Option<Intent>,
        data_sources: Vec<String>,
        thought_signature: Option<String>,
    ) -> PortResult<ChatMessage> {
        self.store
            .append_message(ChatMessage {
                id: Uuid::new_v4(),
                conversation_id: conversation_id.to_string(),
                role,
                content: content.to_string(),
                timestamp: Utc::now(),
                intent,
                data_sources,
                thought_signature,
            })
            .await
    }

    /// The canonical ordered history of a conversation, ascending by
    /// timestamp.
    pub async fn history(&self, conversation_id: &str) -> PortResult<Vec<HistoryEntry>> {
        let messages = self.store.messages_for_conversation(conversation_id).await?;
        Ok(messages
            .into_iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content,
                thought_signature: m.thought_signature,
                timestamp: m.timestamp,
            })
            .collect())
    }
}
