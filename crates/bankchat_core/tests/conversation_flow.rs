//! Conversation tracker tests: resolution, ordered history, and activity
//! timestamps.

mod support;

use std::sync::Arc;

use bankchat_core::conversation::ConversationService;
use bankchat_core::domain::Role;
use bankchat_core::ports::RecordStore;

use support::{customer, MemoryStore};

#[tokio::test]
async fn resolve_without_a_key_mints_a_new_conversation() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let conversations = ConversationService::new(store.clone());

    let a = conversations.resolve_or_create("C1", None).await.unwrap();
    let b = conversations.resolve_or_create("C1", None).await.unwrap();

    assert_ne!(a.conversation_id, b.conversation_id);
    assert!(a.is_active);
    assert_eq!(store.conversation_count(), 2);
}

#[tokio::test]
async fn a_stale_key_falls_through_to_create() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let conversations = ConversationService::new(store.clone());

    let conversation = conversations
        .resolve_or_create("C1", Some("never-created"))
        .await
        .unwrap();

    assert_ne!(conversation.conversation_id, "never-created");
    assert_eq!(store.conversation_count(), 1);
}

#[tokio::test]
async fn history_is_ascending_and_appends_bump_activity() {
    let store = Arc::new(MemoryStore::new());
    store.create_customer(customer("C1", "Priya")).await.unwrap();
    let conversations = ConversationService::new(store.clone());

    let conversation = conversations.resolve_or_create("C1", None).await.unwrap();
    let id = conversation.conversation_id.clone();

    conversations
        .append_message(&id, Role::User, "first", None, Vec::new(), None)
        .await
        .unwrap();
    conversations
        .append_message(&id, Role::Assistant, "second", None, Vec::new(), None)
        .await
        .unwrap();
    let last = conversations
        .append_message(&id, Role::User, "third", None, Vec::new(), None)
        .await
        .unwrap();

    let history = conversations.history(&id).await.unwrap();
    let contents: Vec<&str> = history.iter().map(|h| h.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let refreshed = store.get_conversation(&id).await.unwrap();
    assert_eq!(refreshed.last_activity, last.timestamp);
    assert!(refreshed.last_activity >= conversation.started_at);
}
