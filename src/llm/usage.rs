//! Token counting and cost estimation.
//!
//! Exact counts are read off the provider response when present; otherwise a
//! rough 4-characters-per-token heuristic is applied. Either way the numbers
//! feed a fixed per-token price to produce a dollar cost for the turn.

use crate::llm::models::LlmMessage;
use serde_json::Value;

/// Gemini 2.5 Flash pricing: input $0.075 / 1M tokens, output $0.30 / 1M tokens.
pub const COST_PER_INPUT_TOKEN: f64 = 0.000000075;
pub const COST_PER_OUTPUT_TOKEN: f64 = 0.0000003;

/// Token counters as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LlmUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl LlmUsage {
    /// Extract token counts from a raw response body.
    ///
    /// Two shapes are recognized: the Gemini `usageMetadata` bundle
    /// (`promptTokenCount` / `candidatesTokenCount`) and the generic
    /// `token_usage` bundle (`prompt_tokens` / `completion_tokens`).
    /// Returns `None` when neither is present.
    pub fn from_response_value(body: &Value) -> Option<Self> {
        if let Some(meta) = body.get("usageMetadata") {
            return Some(Self {
                input_tokens: meta["promptTokenCount"].as_i64().unwrap_or(0),
                output_tokens: meta["candidatesTokenCount"].as_i64().unwrap_or(0),
            });
        }

        if let Some(usage) = body.get("token_usage") {
            return Some(Self {
                input_tokens: usage["prompt_tokens"].as_i64().unwrap_or(0),
                output_tokens: usage["completion_tokens"].as_i64().unwrap_or(0),
            });
        }

        None
    }
}

/// Token counts and derived cost for one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cost: f64,
    pub cost_formatted: String,
}

impl TurnUsage {
    /// Compute usage for a turn, preferring provider-reported counts and
    /// falling back to character-count estimation for any count that is
    /// missing or zero.
    ///
    /// This never fails; at worst the counts are rough estimates.
    pub fn compute(messages: &[LlmMessage], output_text: &str, reported: Option<LlmUsage>) -> Self {
        let reported = reported.unwrap_or_default();

        let input_tokens = if reported.input_tokens > 0 {
            reported.input_tokens
        } else {
            estimate_tokens_from_messages(messages)
        };

        let output_tokens = if reported.output_tokens > 0 {
            reported.output_tokens
        } else {
            estimate_tokens(output_text)
        };

        let cost = calculate_cost(input_tokens, output_tokens);

        Self {
            input_tokens,
            output_tokens,
            cost,
            cost_formatted: format_cost(cost),
        }
    }

    /// A zero-valued usage record, used when metric computation is skipped.
    pub fn zero() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            cost_formatted: format_cost(0.0),
        }
    }
}

/// Linear cost in dollars for the given token counts.
pub fn calculate_cost(input_tokens: i64, output_tokens: i64) -> f64 {
    input_tokens as f64 * COST_PER_INPUT_TOKEN + output_tokens as f64 * COST_PER_OUTPUT_TOKEN
}

/// Fixed 6-decimal-place dollar string, e.g. `$0.000150`.
pub fn format_cost(cost: f64) -> String {
    format!("${:.6}", cost)
}

/// Estimate token count as character count / 4.
fn estimate_tokens(text: &str) -> i64 {
    (text.chars().count() / 4) as i64
}

/// Estimate input tokens over the concatenated message contents.
fn estimate_tokens_from_messages(messages: &[LlmMessage]) -> i64 {
    let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    (total_chars / 4) as i64
}
