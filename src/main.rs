use memchat::config::{ChatConfig, HistoryBackend};
use memchat::history::{HistoryStore, MemoryHistory, SqliteHistory};
use memchat::llm::gateways::GeminiGateway;
use memchat::llm::LlmGateway;
use memchat::logging;
use memchat::repl::ChatLoop;
use std::sync::Arc;

#[tokio::main]
async fn main() -> memchat::Result<()> {
    // Pull credentials from a local .env file when present.
    dotenv::dotenv().ok();

    let config = ChatConfig::from_env()?;
    logging::init(config.backend.agent_tag())?;

    let gateway: Arc<dyn LlmGateway> = Arc::new(GeminiGateway::new());

    let history: Arc<dyn HistoryStore> = match config.backend {
        HistoryBackend::Sqlite => Arc::new(SqliteHistory::new(&config.db_path)?),
        HistoryBackend::Memory => Arc::new(MemoryHistory::new()),
    };

    ChatLoop::new(config, gateway, history).run().await
}
