//! The interactive chat loop.
//!
//! One loop drives both history variants: read a line, fetch recent turns,
//! assemble the model context, call the gateway, record usage, persist the
//! turn, display the reply. Errors are caught at this boundary, logged in
//! full, and shown to the user as a short labeled block.

use crate::config::ChatConfig;
use crate::context::assemble;
use crate::error::{MemchatError, Result};
use crate::history::{HistoryStore, Turn};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::usage::TurnUsage;
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Inputs that end the session, matched case-insensitively.
pub const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "bye"];

/// Whether the input asks to close the chat.
pub fn is_exit_keyword(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

/// Outcome of one successful turn.
#[derive(Debug)]
pub struct TurnReport {
    pub reply: String,
    pub usage: TurnUsage,
    pub elapsed: Duration,
}

/// The interaction loop, parameterized over history storage.
pub struct ChatLoop {
    config: ChatConfig,
    gateway: Arc<dyn LlmGateway>,
    history: Arc<dyn HistoryStore>,
}

impl ChatLoop {
    pub fn new(
        config: ChatConfig,
        gateway: Arc<dyn LlmGateway>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            gateway,
            history,
        }
    }

    /// Run one full turn: read recent history, assemble context, call the
    /// model, compute usage, persist the completed turn.
    pub async fn run_turn(&self, user_input: &str) -> Result<TurnReport> {
        let mut turns = self.history.recent(self.config.history_window).await?;
        // recent() returns newest-first; context wants chronological order.
        turns.reverse();

        let messages = assemble(&turns, self.config.system_prompt.as_deref(), user_input);

        let completion_config = CompletionConfig {
            temperature: self.config.temperature,
            ..Default::default()
        };

        let started = Instant::now();
        let response = self.gateway.complete(&self.config.model, &messages, &completion_config).await?;
        let elapsed = started.elapsed();

        let usage = TurnUsage::compute(&messages, &response.content, response.usage);

        let turn = Turn::new(
            user_input,
            &response.content,
            &usage,
            self.config.backend.agent_tag(),
        );
        self.history.append(&turn).await?;

        Ok(TurnReport {
            reply: response.content,
            usage,
            elapsed,
        })
    }

    /// Interactive session over stdin/stdout. Returns when the user types an
    /// exit keyword, stdin reaches EOF, or (with `fail_fast`) a turn fails.
    pub async fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.run_with_io(&mut stdin.lock(), &mut stdout).await
    }

    /// The session loop itself, over any line source and output sink.
    pub async fn run_with_io<R, W>(&self, input: &mut R, output: &mut W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let agent = self.config.backend.agent_tag();
        info!(agent = agent, model = %self.config.model, "chat session started");

        writeln!(output, "{}", "🤖 Chatbot with memory is ready! Type 'exit' to quit.".green().bold())?;
        writeln!(output)?;

        loop {
            write!(output, "{} ", "You:".cyan().bold())?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            if is_exit_keyword(text) {
                writeln!(output, "{}", "Goodbye!".green())?;
                info!("user exited the chatbot");
                break;
            }

            info!(input = text, "user input");

            let started = Instant::now();
            match self.run_turn(text).await {
                Ok(report) => {
                    info!(
                        elapsed_secs = %format!("{:.2}", report.elapsed.as_secs_f64()),
                        "bot response received"
                    );
                    info!(response = %report.reply, "bot response");
                    display_reply(output, &report)?;
                }
                Err(e) => {
                    let elapsed = started.elapsed();
                    error!(
                        elapsed_secs = %format!("{:.2}", elapsed.as_secs_f64()),
                        error = %e,
                        detail = ?e,
                        "turn failed"
                    );
                    display_error(output, &e)?;

                    if self.config.fail_fast {
                        info!("closing session after error");
                        break;
                    }
                }
            }
        }

        info!(agent = agent, "chat session ended");
        Ok(())
    }
}

fn display_reply<W: Write>(output: &mut W, report: &TurnReport) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "{} {}", "Bot:".magenta().bold(), report.reply)?;
    writeln!(
        output,
        "{}",
        format!(
            "(tokens in: {}, out: {}, cost: {}, {:.2}s)",
            report.usage.input_tokens,
            report.usage.output_tokens,
            report.usage.cost_formatted,
            report.elapsed.as_secs_f64()
        )
        .dark_grey()
    )?;
    writeln!(output)?;
    Ok(())
}

fn display_error<W: Write>(output: &mut W, e: &MemchatError) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "{}", "────────────────────────────".dark_grey())?;
    writeln!(output, "{} {}", "Error:".red().bold(), e.user_label().red())?;
    writeln!(output, "{}", "────────────────────────────".dark_grey())?;
    writeln!(output)?;
    Ok(())
}
