use chrono::{SecondsFormat, Utc};

use super::wire::{Choice, CompletionResult, ResponseMessage, Usage};

pub const MOCK_MODEL: &str = "gpt-3.5-turbo-mock";
pub const MOCK_COMPLETION_TOKENS: u64 = 50;
const ECHO_LIMIT: usize = 100;

/// Locally generated stand-in for an upstream completion.
///
/// Token counts are an approximation: the prompt is counted in characters,
/// the reply as a fixed amount.
#[must_use]
pub fn mock_completion(input: &str) -> CompletionResult {
    let now = Utc::now();
    let input_len = input.chars().count();

    let mut echoed: String = input.chars().take(ECHO_LIMIT).collect();
    if input_len > ECHO_LIMIT {
        echoed.push_str("...");
    }

    let content = format!(
        "[Mock response {}] I am a simulated AI assistant. The upstream API is currently \
         unavailable, so this reply was generated locally. Your message was: \"{echoed}\"",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    );

    CompletionResult {
        id: format!("mock-{}", now.timestamp_millis()),
        object: "chat.completion".to_string(),
        created: now.timestamp(),
        model: MOCK_MODEL.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: "assistant".to_string(),
                content: Some(content),
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage: Usage::new(input_len as u64, MOCK_COMPLETION_TOKENS),
    }
}
