//! File-based session logging.
//!
//! Log output goes to an append-only text file, one per agent variant per
//! calendar day (`chatbot_agent1_20260831.log`); nothing is written to the
//! terminal, which stays reserved for the conversation itself. Logging is a
//! side channel: a failure to log never affects a turn.

use crate::error::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Path of today's log file for the given agent variant.
pub fn log_file_name(agent: &str) -> PathBuf {
    PathBuf::from(format!("chatbot_{}_{}.log", agent, Local::now().format("%Y%m%d")))
}

/// Install the global tracing subscriber writing to today's log file.
///
/// Honors `RUST_LOG`, defaulting to `info`. Returns the path being written to.
pub fn init(agent: &str) -> Result<PathBuf> {
    let path = log_file_name(agent);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(path)
}
