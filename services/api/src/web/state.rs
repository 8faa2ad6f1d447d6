//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use bankchat_core::chat::ChatService;
use bankchat_core::context::ContextService;
use bankchat_core::import::ImportService;
use bankchat_core::ports::{RecordStore, ResponseGenerator};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub chat: ChatService,
    pub context: ContextService,
    pub import: ImportService,
}

impl AppState {
    /// Wires the core services around the injected store and generator.
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn ResponseGenerator>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            chat: ChatService::new(store.clone(), generator),
            context: ContextService::new(store.clone()),
            import: ImportService::new(store.clone()),
            store,
            config,
        }
    }
}
