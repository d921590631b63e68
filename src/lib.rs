pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod repl;

pub use error::{MemchatError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{ChatConfig, HistoryBackend};
    pub use crate::error::{MemchatError, Result};
    pub use crate::history::{HistoryStore, MemoryHistory, SqliteHistory, Turn};
    pub use crate::llm::gateways::GeminiGateway;
    pub use crate::llm::{CompletionConfig, LlmGateway, LlmMessage, MessageRole};
    pub use crate::repl::ChatLoop;
}
