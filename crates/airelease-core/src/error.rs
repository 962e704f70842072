//! Error types for airelease-core

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::config::{ConfigKey, Provider};

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value failed its key's validation rule.
    #[error("Invalid config property {key}: {reason}{}", render_hint(.hint))]
    Invalid {
        /// The offending key.
        key: ConfigKey,
        /// Why the value was rejected.
        reason: String,
        /// Key-specific remediation text, added when setting values.
        hint: Option<String>,
    },

    /// The key is not one of the known configuration properties.
    #[error(
        "Invalid config property: {key}. Available properties are: {}",
        ConfigKey::names().join(", ")
    )]
    UnknownKey {
        /// The key as given.
        key: String,
    },

    /// The active provider has no credential configured.
    #[error(
        "Please set your {} API key via `airelease config set {}=<your token>`",
        .provider.display_name(),
        .provider.credential_key()
    )]
    MissingCredential {
        /// Provider whose key is missing.
        provider: Provider,
    },

    /// A `config set` argument had no `=`.
    #[error("Invalid config assignment '{input}': expected key=value")]
    MalformedAssignment {
        /// The argument as given.
        input: String,
    },

    /// The persisted file contains a line that is not an assignment.
    #[error("Malformed config file {path} at line {line_number}: {line}")]
    Parse {
        /// Config file path.
        path: Utf8PathBuf,
        /// 1-based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// Failed to merge configuration sources.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Failed to read the config file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write the config file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Config file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

fn render_hint(hint: &Option<String>) -> String {
    hint.as_deref().map(|h| format!("\n{h}")).unwrap_or_default()
}

impl ConfigError {
    /// Whether this is an anticipated, user-actionable failure.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Classify any error from this crate as known (print a one-line message)
/// or unexpected (print the full chain and ask for a bug report).
///
/// Errors from outside this crate are unexpected.
pub fn is_known(err: &(dyn std::error::Error + 'static)) -> bool {
    use crate::{detect::DetectError, git::GitError, llm::LlmError, release::ReleaseError};
    use crate::version::VersionError;

    if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.is_known()
    } else if let Some(e) = err.downcast_ref::<GitError>() {
        e.is_known()
    } else if let Some(e) = err.downcast_ref::<DetectError>() {
        e.is_known()
    } else if let Some(e) = err.downcast_ref::<VersionError>() {
        e.is_known()
    } else if let Some(e) = err.downcast_ref::<LlmError>() {
        e.is_known()
    } else if let Some(e) = err.downcast_ref::<ReleaseError>() {
        e.is_known()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_without_hint_is_one_line() {
        let err = ConfigError::Invalid {
            key: ConfigKey::Timeout,
            reason: "Must be an integer".into(),
            hint: None,
        };
        assert_eq!(err.to_string(), "Invalid config property timeout: Must be an integer");
    }

    #[test]
    fn invalid_with_hint_appends_line() {
        let err = ConfigError::Invalid {
            key: ConfigKey::Locale,
            reason: "bad".into(),
            hint: Some("Example valid locales: en".into()),
        };
        assert_eq!(
            err.to_string(),
            "Invalid config property locale: bad\nExample valid locales: en"
        );
    }

    #[test]
    fn unknown_key_lists_available_properties() {
        let err = ConfigError::UnknownKey { key: "nope".into() };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid config property: nope. Available properties are: "));
        assert!(msg.contains("api_provider, OPENAI_KEY, ANTHROPIC_API_KEY"));
    }

    #[test]
    fn missing_credential_names_the_key() {
        let err = ConfigError::MissingCredential {
            provider: Provider::Anthropic,
        };
        assert_eq!(
            err.to_string(),
            "Please set your Anthropic API key via `airelease config set ANTHROPIC_API_KEY=<your token>`"
        );
    }

    #[test]
    fn io_failures_are_unexpected() {
        let err = ConfigError::Write {
            path: "/tmp/x".into(),
            source: std::io::Error::other("disk full"),
        };
        assert!(!err.is_known());
        assert!(!is_known(&err));
    }

    #[test]
    fn foreign_errors_are_unexpected() {
        let err = std::io::Error::other("boom");
        assert!(!is_known(&err));
    }
}
