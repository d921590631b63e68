//! Error types and result aliases for memchat.
//!
//! This module defines the core error type [`MemchatError`] and the [`Result`] type alias
//! used throughout the crate. Failures the interaction loop branches on (quota limits,
//! transport problems, persistence problems) are distinct variants rather than strings
//! buried inside a generic error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemchatError {
    /// The provider reported resource exhaustion (HTTP 429 or RESOURCE_EXHAUSTED).
    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("LLM gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("History store error: {0}")]
    History(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MemchatError {
    /// Short human-readable label shown in the console error block.
    ///
    /// The full error detail goes to the log file; the terminal only gets
    /// this simplified heading.
    pub fn user_label(&self) -> &'static str {
        match self {
            MemchatError::QuotaExceeded => "API Quota Exceeded",
            MemchatError::Gateway(_) => "API",
            MemchatError::Http(_) => "Network",
            MemchatError::History(_) => "Storage",
            MemchatError::Serialization(_) => "Serialization",
            MemchatError::Io(_) => "IO",
            MemchatError::Config(_) => "Configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, MemchatError>;
