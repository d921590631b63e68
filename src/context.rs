//! Message assembly: turning stored turns into the ordered list sent to the
//! completion API.
//!
//! The assembled list is always `[system?] + flattened history + [user: new
//! input]`. Assembly is stateless; the list is rebuilt fresh every turn and
//! never retained.

use crate::history::Turn;
use crate::llm::models::{LlmMessage, MessageRole};

/// Build the full message list for one completion call.
///
/// `turns` must already be in chronological order (oldest first). Each turn
/// contributes a user message when its user text is non-empty and an assistant
/// message when its bot text is non-empty; empty-text messages are never
/// emitted. The system instruction, when configured, ends up at position 0
/// exactly once.
pub fn assemble(turns: &[Turn], system_prompt: Option<&str>, user_text: &str) -> Vec<LlmMessage> {
    let mut messages = flatten_turns(turns);
    messages.push(LlmMessage::user(user_text));

    match system_prompt {
        Some(prompt) => ensure_system_prompt(messages, prompt),
        None => messages,
    }
}

/// Flatten turns into alternating user/assistant messages, skipping empty text.
pub fn flatten_turns(turns: &[Turn]) -> Vec<LlmMessage> {
    let mut messages = Vec::with_capacity(turns.len() * 2);

    for turn in turns {
        if !turn.message.is_empty() {
            messages.push(LlmMessage::user(&turn.message));
        }
        if !turn.response.is_empty() {
            messages.push(LlmMessage::assistant(&turn.response));
        }
    }

    messages
}

/// Prepend the system instruction unless the list already starts with a
/// system message.
///
/// The check is by role and position, not content, so repeated application is
/// idempotent even on a list built incrementally.
pub fn ensure_system_prompt(messages: Vec<LlmMessage>, system_prompt: &str) -> Vec<LlmMessage> {
    if messages.first().map(|m| m.role) == Some(MessageRole::System) {
        return messages;
    }

    let mut with_system = Vec::with_capacity(messages.len() + 1);
    with_system.push(LlmMessage::system(system_prompt));
    with_system.extend(messages);
    with_system
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::usage::TurnUsage;

    fn turn(message: &str, response: &str) -> Turn {
        Turn::new(message, response, &TurnUsage::zero(), "agent1")
    }

    #[test]
    fn test_empty_history_with_system_prompt() {
        let messages = assemble(&[], Some("You are helpful."), "Hello");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], LlmMessage::system("You are helpful."));
        assert_eq!(messages[1], LlmMessage::user("Hello"));
    }

    #[test]
    fn test_empty_history_without_system_prompt() {
        let messages = assemble(&[], None, "Hello");

        assert_eq!(messages, vec![LlmMessage::user("Hello")]);
    }

    #[test]
    fn test_one_prior_turn() {
        let history = vec![turn("Hi", "Hello there")];
        let messages = assemble(&history, Some("sys"), "How are you?");

        assert_eq!(
            messages,
            vec![
                LlmMessage::system("sys"),
                LlmMessage::user("Hi"),
                LlmMessage::assistant("Hello there"),
                LlmMessage::user("How are you?"),
            ]
        );
    }

    #[test]
    fn test_history_stays_chronological() {
        let history = vec![turn("first", "one"), turn("second", "two")];
        let messages = assemble(&history, None, "third");

        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "one", "second", "two", "third"]);
    }

    #[test]
    fn test_flatten_skips_empty_user_text() {
        let history = vec![turn("", "just a bot line")];
        let messages = flatten_turns(&history);

        assert_eq!(messages, vec![LlmMessage::assistant("just a bot line")]);
    }

    #[test]
    fn test_flatten_skips_empty_bot_text() {
        let history = vec![turn("just a user line", "")];
        let messages = flatten_turns(&history);

        assert_eq!(messages, vec![LlmMessage::user("just a user line")]);
    }

    #[test]
    fn test_flatten_skips_fully_empty_turn() {
        let history = vec![turn("", "")];
        assert!(flatten_turns(&history).is_empty());
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let history = vec![turn("Hi", "Hello")];

        let first = assemble(&history, Some("sys"), "again");
        let second = assemble(&history, Some("sys"), "again");

        assert_eq!(first, second);
    }

    #[test]
    fn test_system_prompt_appears_at_most_once() {
        let history = vec![turn("Hi", "Hello")];
        let messages = assemble(&history, Some("sys"), "next");

        let system_count =
            messages.iter().filter(|m| m.role == MessageRole::System).count();
        assert_eq!(system_count, 1);
        assert_eq!(messages[0].role, MessageRole::System);
    }

    #[test]
    fn test_ensure_system_prompt_is_idempotent() {
        let messages = vec![LlmMessage::user("Hi")];

        let once = ensure_system_prompt(messages, "sys");
        let twice = ensure_system_prompt(once.clone(), "sys");

        assert_eq!(once, twice);
        assert_eq!(twice.iter().filter(|m| m.role == MessageRole::System).count(), 1);
    }

    #[test]
    fn test_ensure_system_prompt_checks_role_not_content() {
        // An existing system message with different text still blocks insertion.
        let messages = vec![LlmMessage::system("original"), LlmMessage::user("Hi")];

        let result = ensure_system_prompt(messages, "replacement");

        assert_eq!(result[0], LlmMessage::system("original"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_ensure_system_prompt_on_empty_list() {
        let result = ensure_system_prompt(vec![], "sys");
        assert_eq!(result, vec![LlmMessage::system("sys")]);
    }
}
