//! Release-note drafting through an LLM provider.
//!
//! A [`NotesGenerator`] turns a raw `git log --oneline` into one or more
//! candidate release notes. [`generator_for`] picks the implementation for
//! the configured provider. Output is sanitized and de-duplicated before it
//! is returned.

mod anthropic;
mod openai;

use std::io;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiGenerator;

use crate::config::{Provider, ValidConfig};
use crate::error::ConfigError;

/// Errors from LLM requests.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider answered with a non-2xx status.
    #[error("{}", api_error_message(*.provider, *.status, .reason, .body))]
    Api {
        /// Provider that answered.
        provider: Provider,
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        reason: String,
        /// Response body, possibly empty.
        body: String,
    },

    /// The request exceeded the configured timeout.
    #[error(
        "Time out error: request took over {}ms. Try increasing the `timeout` config, or checking the {} API status {}",
        .timeout.as_millis(),
        .provider.display_name(),
        status_page(*.provider)
    )]
    Timeout {
        /// Provider that was called.
        provider: Provider,
        /// Configured timeout.
        timeout: Duration,
    },

    /// DNS resolution or connection failed.
    #[error("Error connecting to {host} ({cause}). Are you connected to the internet?")]
    Unreachable {
        /// Host that could not be reached.
        host: String,
        /// What failed (e.g., "dns lookup").
        cause: &'static str,
    },

    /// Any other transport failure.
    #[error("request to {provider} failed: {message}")]
    Transport {
        /// Provider that was called.
        provider: Provider,
        /// Transport error details.
        message: String,
    },

    /// The response body was not the expected shape.
    #[error("unexpected {provider} response: {source}")]
    Payload {
        /// Provider that answered.
        provider: Provider,
        /// Decoding error.
        #[source]
        source: io::Error,
    },

    /// The configuration cannot be used to call a provider.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LlmError {
    /// Whether this is an anticipated, user-actionable failure.
    pub fn is_known(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Payload { .. } => false,
            Self::Config(e) => e.is_known(),
            _ => true,
        }
    }
}

/// Result alias for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

fn api_error_message(provider: Provider, status: u16, reason: &str, body: &str) -> String {
    let mut message = format!("{} API Error: {status} - {reason}", provider.display_name());
    if !body.is_empty() {
        message.push_str("\n\n");
        message.push_str(body);
    }
    if status == 500 {
        message.push_str("\n\nCheck the API status: ");
        message.push_str(status_page(provider));
    }
    message
}

const fn status_page(provider: Provider) -> &'static str {
    match provider {
        Provider::Openai => "https://status.openai.com",
        Provider::Anthropic => "https://status.anthropic.com",
    }
}

/// Drafts release notes from a commit log.
pub trait NotesGenerator {
    /// Provider behind this generator.
    fn provider(&self) -> Provider;

    /// Candidate release notes for `log`, sanitized and de-duplicated.
    fn generate(&self, log: &str) -> LlmResult<Vec<String>>;
}

/// Connection and prompt settings shared by every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Provider API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Locale the notes are written in.
    pub locale: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeneratorSettings {
    /// Settings for the active provider of `config`.
    pub fn from_config(config: &ValidConfig) -> LlmResult<Self> {
        Ok(Self {
            api_key: config.api_key()?.to_string(),
            model: config.model().to_string(),
            locale: config.locale().to_string(),
            timeout: config.timeout(),
        })
    }
}

/// Build the generator for the configured provider.
pub fn generator_for(config: &ValidConfig) -> LlmResult<Box<dyn NotesGenerator>> {
    let settings = GeneratorSettings::from_config(config)?;
    debug!(provider = %config.provider(), model = %settings.model, "selected notes generator");
    Ok(match config.provider() {
        Provider::Openai => Box::new(OpenAiGenerator::new(settings)),
        Provider::Anthropic => Box::new(AnthropicGenerator::new(settings)),
    })
}

/// System prompt describing the release note to write.
pub fn generate_prompt(locale: &str) -> String {
    [
        "Using the provided commit messages, create a release note with categorized sections based on the content or prefix of each commit message (e.g., feat, fix, chore, improve, refactor).".to_string(),
        "Ensure the notes are clear, concise, and customer-friendly, without any technical explanations.".to_string(),
        "Retain the pull request numbers (e.g., #number) and remove any icons.".to_string(),
        format!("The release note should be generated in the specified locale ({locale})."),
        "Exclude information related to package version updates and console cleanup.".to_string(),
        "Do not include header title.".to_string(),
    ]
    .join("\n")
}

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\r]+").expect("valid line break regex"));
static TRAILING_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)\.$").expect("valid trailing period regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(.*?)~~").expect("valid strikethrough regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*").expect("valid heading regex"));

/// Strip markdown decoration from a generated note.
///
/// Heading markers are only removed at line start so `#123` survives.
pub fn sanitize(text: &str) -> String {
    let text = LINE_BREAKS.replace_all(text.trim(), "\n");
    let text = TRAILING_PERIOD.replace(&text, "${1}");
    let text = BOLD.replace_all(&text, "${1}");
    let text = ITALIC.replace_all(&text, "${1}");
    let text = STRIKETHROUGH.replace_all(&text, "${1}");
    HEADING.replace_all(&text, "").into_owned()
}

/// Drop empty and repeated notes, keeping first occurrences in order.
pub fn dedupe(notes: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for note in notes {
        if !note.is_empty() && !out.contains(&note) {
            out.push(note);
        }
    }
    out
}

/// POST a JSON body and decode a JSON response.
#[instrument(skip(headers, body))]
fn post_json<T: DeserializeOwned>(
    provider: Provider,
    url: &str,
    headers: &[(&str, &str)],
    body: &impl Serialize,
    timeout: Duration,
) -> LlmResult<T> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let request = headers
        .iter()
        .fold(agent.post(url), |req, (name, value)| req.set(name, value));

    match request.send_json(body) {
        Ok(resp) => {
            debug!(status = resp.status(), "provider responded");
            resp.into_json::<T>()
                .map_err(|source| LlmError::Payload { provider, source })
        }
        Err(ureq::Error::Status(status, resp)) => {
            let reason = resp.status_text().to_string();
            let body = resp.into_string().unwrap_or_default();
            Err(LlmError::Api {
                provider,
                status,
                reason,
                body,
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(transport_error(provider, timeout, &transport)),
    }
}

fn transport_error(provider: Provider, timeout: Duration, transport: &ureq::Transport) -> LlmError {
    let timed_out = std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock));
    if timed_out {
        return LlmError::Timeout { provider, timeout };
    }

    let host = || {
        transport
            .url()
            .and_then(|url| url.host_str())
            .unwrap_or("the API host")
            .to_string()
    };
    match transport.kind() {
        ureq::ErrorKind::Dns => LlmError::Unreachable {
            host: host(),
            cause: "dns lookup",
        },
        ureq::ErrorKind::ConnectionFailed => LlmError::Unreachable {
            host: host(),
            cause: "connect",
        },
        _ => LlmError::Transport {
            provider,
            message: transport.to_string(),
        },
    }
}
