//! Conversation history storage.
//!
//! A [`Turn`] is one completed user/bot exchange. Stores are append-only: turns
//! are created immediately after a successful completion call, never modified,
//! never deleted. The interaction loop reads back the most recent N turns as
//! model context.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;

use crate::error::Result;
use crate::llm::usage::TurnUsage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One persisted user/bot exchange with its usage metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Row identifier; `None` until the durable store assigns one.
    pub id: Option<i64>,
    pub message: String,
    pub response: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost: f64,
    pub cost_formatted: String,
    /// Which agent variant recorded the turn.
    pub agent: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Build a turn from a completed exchange, stamped with the current time.
    pub fn new(
        message: impl Into<String>,
        response: impl Into<String>,
        usage: &TurnUsage,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            message: message.into(),
            response: response.into(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost: usage.cost,
            cost_formatted: usage.cost_formatted.clone(),
            agent: agent.into(),
            created_at: Utc::now(),
        }
    }
}

/// Capability interface both history variants implement.
///
/// `recent` returns turns NEWEST-FIRST as fetched; callers reverse the list to
/// obtain chronological order before assembling model context.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Durably record a completed turn. Persistence failures propagate.
    async fn append(&self, turn: &Turn) -> Result<()>;

    /// Up to `n` most recently appended turns, newest-first. Returns all of
    /// them when fewer than `n` exist.
    async fn recent(&self, n: usize) -> Result<Vec<Turn>>;
}
