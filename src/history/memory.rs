//! Ephemeral in-process history store.
//!
//! Holds turns in an ordered list for the lifetime of the process; nothing
//! survives exit. Offers the same capability surface as the durable store so
//! the interaction loop does not care which one it is driving.

use crate::error::Result;
use crate::history::{HistoryStore, Turn};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory turn storage.
#[derive(Default)]
pub struct MemoryHistory {
    turns: Mutex<Vec<Turn>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns held.
    pub fn len(&self) -> usize {
        self.turns.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, turn: &Turn) -> Result<()> {
        let mut turns = self.turns.lock().unwrap();
        let mut turn = turn.clone();
        turn.id = Some(turns.len() as i64 + 1);
        turns.push(turn);
        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<Turn>> {
        let turns = self.turns.lock().unwrap();
        // Tail of the list, newest first, matching the durable store's contract.
        Ok(turns.iter().rev().take(n).cloned().collect())
    }
}
