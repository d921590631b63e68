pub mod gateway;
pub mod gateways;
pub mod models;
pub mod usage;

pub use gateway::{CompletionConfig, LlmGateway};
pub use models::{LlmGatewayResponse, LlmMessage, MessageRole};
pub use usage::{LlmUsage, TurnUsage};
