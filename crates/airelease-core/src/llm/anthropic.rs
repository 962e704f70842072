//! Anthropic messages.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{GeneratorSettings, LlmResult, NotesGenerator, dedupe, generate_prompt, post_json, sanitize};
use crate::config::Provider;

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Used when the configured model is not a Claude model.
const FALLBACK_MODEL: &str = "claude-3-5-haiku-latest";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: [Message; 1],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Drafts notes with the Anthropic messages API.
#[derive(Debug, Clone)]
pub struct AnthropicGenerator {
    settings: GeneratorSettings,
}

impl AnthropicGenerator {
    /// Generator for `settings`.
    pub const fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    fn model(&self) -> &str {
        if self.settings.model.contains("claude") {
            &self.settings.model
        } else {
            FALLBACK_MODEL
        }
    }

    fn request(&self, log: &str) -> MessagesRequest<'_> {
        MessagesRequest {
            model: self.model(),
            messages: [Message {
                role: "user",
                content: format!("{}\n\n{log}", generate_prompt(&self.settings.locale)),
            }],
            max_tokens: 5000,
            temperature: 0.7,
            top_p: 1.0,
            stream: false,
        }
    }
}

fn notes_from(response: MessagesResponse) -> Vec<String> {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n");
    dedupe((!text.trim().is_empty()).then(|| sanitize(&text)))
}

impl NotesGenerator for AnthropicGenerator {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    #[instrument(skip(self, log), fields(model = %self.model()))]
    fn generate(&self, log: &str) -> LlmResult<Vec<String>> {
        let response: MessagesResponse = post_json(
            Provider::Anthropic,
            ENDPOINT,
            &[
                ("x-api-key", self.settings.api_key.as_str()),
                ("anthropic-version", API_VERSION),
            ],
            &self.request(log),
            self.settings.timeout,
        )?;
        let notes = notes_from(response);
        debug!(count = notes.len(), "received notes");
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn generator(model: &str) -> AnthropicGenerator {
        AnthropicGenerator::new(GeneratorSettings {
            api_key: "sk-ant-test".into(),
            model: model.into(),
            locale: "fr".into(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn request_combines_prompt_and_log() {
        let generator = generator("claude-sonnet-4-5-20250929");
        let body = serde_json::to_value(generator.request("abc feat: x")).unwrap();

        assert_eq!(body["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(body["max_tokens"], 5000);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("specified locale (fr)"));
        assert!(content.ends_with("\n\nabc feat: x"));
    }

    #[test]
    fn non_claude_model_falls_back() {
        assert_eq!(generator("gpt-4o").model(), FALLBACK_MODEL);
    }

    #[test]
    fn text_blocks_are_joined_and_sanitized() {
        let response: MessagesResponse = serde_json::from_str(
            r####"{"id":"msg_1","type":"message","content":[
                {"type":"text","text":"### Fixes"},
                {"type":"tool_use","id":"x"},
                {"type":"text","text":"- Crash on start (#12)."}
            ]}"####,
        )
        .unwrap();
        assert_eq!(notes_from(response), vec!["Fixes\n- Crash on start (#12)."]);
    }

    #[test]
    fn empty_content_yields_no_notes() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(notes_from(response).is_empty());
    }
}
