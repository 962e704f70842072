//! OpenAI chat completions.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{GeneratorSettings, LlmResult, NotesGenerator, dedupe, generate_prompt, post_json, sanitize};
use crate::config::Provider;

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    max_tokens: u32,
    stream: bool,
    n: u8,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Drafts notes with the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    settings: GeneratorSettings,
    completions: u8,
}

impl OpenAiGenerator {
    /// Generator requesting a single completion.
    pub const fn new(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            completions: 1,
        }
    }

    /// Request `n` completions per call.
    #[must_use]
    pub const fn with_completions(mut self, n: u8) -> Self {
        self.completions = n;
        self
    }

    fn request<'a>(&'a self, system: &'a str, log: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: log,
                },
            ],
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 200,
            stream: false,
            n: self.completions,
        }
    }
}

fn notes_from(response: ChatResponse) -> Vec<String> {
    dedupe(
        response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.and_then(|m| m.content))
            .filter(|content| !content.is_empty())
            .map(|content| sanitize(&content)),
    )
}

impl NotesGenerator for OpenAiGenerator {
    fn provider(&self) -> Provider {
        Provider::Openai
    }

    #[instrument(skip(self, log), fields(model = %self.settings.model))]
    fn generate(&self, log: &str) -> LlmResult<Vec<String>> {
        let system = generate_prompt(&self.settings.locale);
        let bearer = format!("Bearer {}", self.settings.api_key);
        let response: ChatResponse = post_json(
            Provider::Openai,
            ENDPOINT,
            &[("Authorization", bearer.as_str())],
            &self.request(&system, log),
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

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new(GeneratorSettings {
            api_key: "sk-test".into(),
            model: "gpt-4o".into(),
            locale: "en".into(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn request_shape() {
        let generator = generator().with_completions(2);
        let body = serde_json::to_value(generator.request("SYSTEM", "abc feat: x")).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "SYSTEM");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "abc feat: x");
        assert_eq!(body["max_tokens"], 200);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["n"], 2);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn response_notes_are_sanitized_and_deduped() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[
                {"message":{"role":"assistant","content":"**Features**\n- Login."}},
                {"message":{"role":"assistant","content":"Features\n- Login"}},
                {"message":{"role":"assistant","content":null}},
                {}
            ]}"#,
        )
        .unwrap();
        assert_eq!(notes_from(response), vec!["Features\n- Login"]);
    }

    #[test]
    fn empty_choices_yield_no_notes() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(notes_from(response).is_empty());
    }
}
