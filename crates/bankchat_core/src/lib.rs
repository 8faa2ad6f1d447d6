pub mod chat;
pub mod context;
pub mod conversation;
pub mod domain;
pub mod import;
pub mod ports;

pub use chat::{ChatOutcome, ChatService, GENERATION_FALLBACK};
pub use context::{ContextService, ContextSnapshot};
pub use conversation::ConversationService;
pub use domain::{
    ChatMessage, Conversation, Customer, FileType, Intent, Investment, PaymentMethod, RiskLevel,
    Role, Transaction, UploadedFile,
};
pub use import::{ImportService, RowSet};
pub use ports::{PortError, PortResult, RecordStore, ResponseGenerator};
