//! Runtime configuration loaded from the environment.
//!
//! Values come from the process environment, with a local `.env` file loaded
//! first by the binary. Only the API key is required; everything else has a
//! default.

use crate::error::{MemchatError, Result};
use std::path::PathBuf;

/// Which history strategy backs the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackend {
    /// Durable SQLite storage, survives restarts.
    Sqlite,
    /// Process-local list, lost on exit.
    Memory,
}

impl HistoryBackend {
    /// Tag written into each persisted turn's `agent` column.
    pub fn agent_tag(self) -> &'static str {
        match self {
            HistoryBackend::Sqlite => "agent1",
            HistoryBackend::Memory => "agent2",
        }
    }
}

/// Settings for one chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub backend: HistoryBackend,
    pub model: String,
    pub db_path: PathBuf,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    /// Most recent N turns re-fed as context.
    pub history_window: usize,
    /// Close the session after the first error instead of continuing.
    pub fail_fast: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::Sqlite,
            model: "gemini-2.5-flash".to_string(),
            db_path: PathBuf::from("database.db"),
            system_prompt: None,
            temperature: 0.7,
            history_window: 25,
            fail_fast: false,
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when `GOOGLE_API_KEY` is absent or empty; the gateway cannot make
    /// a single call without it, so this surfaces at startup rather than on
    /// the first turn.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            return Err(MemchatError::Config(
                "GOOGLE_API_KEY is not set; add it to .env or the environment".to_string(),
            ));
        }

        let defaults = Self::default();

        let backend = match std::env::var("MEMCHAT_HISTORY").as_deref() {
            Ok("memory") => HistoryBackend::Memory,
            _ => HistoryBackend::Sqlite,
        };

        let temperature = std::env::var("MEMCHAT_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let history_window = std::env::var("MEMCHAT_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.history_window);

        let fail_fast = matches!(
            std::env::var("MEMCHAT_FAIL_FAST").as_deref(),
            Ok("1") | Ok("true")
        );

        Ok(Self {
            backend,
            model: std::env::var("MEMCHAT_MODEL").unwrap_or(defaults.model),
            db_path: std::env::var("MEMCHAT_DB").map(PathBuf::from).unwrap_or(defaults.db_path),
            system_prompt: std::env::var("MEMCHAT_SYSTEM_PROMPT").ok().filter(|s| !s.is_empty()),
            temperature,
            history_window,
            fail_fast,
        })
    }
}
