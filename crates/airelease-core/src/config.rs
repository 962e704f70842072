//! Configuration resolution, validation and persistence.
//!
//! Settings live in a flat `key=value` file at `~/.airelease` (override the
//! location with `AIRELEASE_CONFIG_PATH`). Every read merges three layers,
//! highest precedence first:
//!
//! 1. Values supplied by the caller (CLI flags, environment)
//! 2. Values in the persisted file
//! 3. Defaults computed by each key's validator
//!
//! `api_provider` is resolved before everything else so the credential and
//! model validators can depend on it.
//!
//! # Example
//! ```no_run
//! use airelease_core::config::{ConfigStore, RawConfig};
//!
//! let store = ConfigStore::at_default_location().unwrap();
//! let config = store.resolve(&RawConfig::default(), true).unwrap();
//! println!("provider: {}", config.provider());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write as _;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use figment::providers::Serialized;
use figment::value::{Dict, Map, Value};
use figment::{Figment, Metadata, Profile, Source};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::detect::has_binary;
use crate::error::{ConfigError, ConfigResult};
use crate::fs::path_exists;

/// Environment variable that relocates the persisted config file.
pub const CONFIG_PATH_ENV: &str = "AIRELEASE_CONFIG_PATH";

/// File name of the persisted config, relative to the home directory.
const CONFIG_FILE_NAME: &str = ".airelease";

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const MIN_TIMEOUT_MS: u64 = 500;

/// Models offered for OpenAI, default first.
pub const OPENAI_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

/// Models offered for Anthropic, default first.
pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-sonnet-4-5-20250929",
    "claude-haiku-4-5-20251001",
    "claude-opus-4-1-20250805",
    "claude-3-5-haiku-latest",
];

/// Common editors per platform, keyed by [`std::env::consts::OS`].
const EDITORS_BY_PLATFORM: &[(&str, &[&str])] = &[
    (
        "macos",
        &["vi", "nano", "vim", "nvim", "emacs", "code", "sublime", "atom", "pico"],
    ),
    ("windows", &["notepad", "notepad++", "atom", "sublime"]),
    (
        "linux",
        &["vi", "nano", "vim", "nvim", "emacs", "code", "gedit", "kate", "pico"],
    ),
];

static LOCALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z-]+$").expect("valid locale regex"));

// ---------------------------------------------------------------------------
// Keys and typed values
// ---------------------------------------------------------------------------

/// The closed set of configuration properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfigKey {
    /// LLM backend: `openai` or `anthropic`.
    #[serde(rename = "api_provider")]
    ApiProvider,
    /// OpenAI API key.
    #[serde(rename = "OPENAI_KEY")]
    OpenaiKey,
    /// Anthropic API key.
    #[serde(rename = "ANTHROPIC_API_KEY")]
    AnthropicApiKey,
    /// Output language for release notes.
    #[serde(rename = "locale")]
    Locale,
    /// Model name.
    #[serde(rename = "model")]
    Model,
    /// Request timeout in milliseconds.
    #[serde(rename = "timeout")]
    Timeout,
    /// Editor used to revise drafts.
    #[serde(rename = "editor")]
    Editor,
}

impl ConfigKey {
    /// Every key, in resolution order.
    pub const ALL: [Self; 7] = [
        Self::ApiProvider,
        Self::OpenaiKey,
        Self::AnthropicApiKey,
        Self::Locale,
        Self::Model,
        Self::Timeout,
        Self::Editor,
    ];

    /// The key as written in the config file.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiProvider => "api_provider",
            Self::OpenaiKey => "OPENAI_KEY",
            Self::AnthropicApiKey => "ANTHROPIC_API_KEY",
            Self::Locale => "locale",
            Self::Model => "model",
            Self::Timeout => "timeout",
            Self::Editor => "editor",
        }
    }

    /// One-line description for help output.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ApiProvider => "API provider to use (openai | anthropic, default: openai)",
            Self::OpenaiKey => "OpenAI API key, required when using OpenAI (sk-...)",
            Self::AnthropicApiKey => {
                "Anthropic API key, required when using Anthropic (sk-ant-...)"
            }
            Self::Locale => "Output language for release notes (default: en)",
            Self::Model => "Model to use (default depends on the provider)",
            Self::Timeout => "API request timeout in milliseconds (minimum 500, default: 10000)",
            Self::Editor => "Text editor for manual editing (default: vi, or notepad on Windows)",
        }
    }

    /// All key names, in resolution order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }

    const fn is_credential(self) -> bool {
        matches!(self, Self::OpenaiKey | Self::AnthropicApiKey)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey { key: s.to_string() })
    }
}

/// LLM backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions.
    #[default]
    Openai,
    /// Anthropic messages.
    Anthropic,
}

impl Provider {
    /// Lowercase identifier used in config and flags.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human-facing vendor name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Openai => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// The config key holding this provider's API key.
    pub const fn credential_key(&self) -> ConfigKey {
        match self {
            Self::Openai => ConfigKey::OpenaiKey,
            Self::Anthropic => ConfigKey::AnthropicApiKey,
        }
    }

    /// Model used when none is configured.
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::Openai => OPENAI_MODELS[0],
            Self::Anthropic => ANTHROPIC_MODELS[0],
        }
    }

    /// Models offered for this provider.
    pub const fn models(&self) -> &'static [&'static str] {
        match self {
            Self::Openai => OPENAI_MODELS,
            Self::Anthropic => ANTHROPIC_MODELS,
        }
    }

    const fn credential_prefix(&self) -> &'static str {
        match self {
            Self::Openai => "sk-",
            Self::Anthropic => "sk-ant-",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// `api_provider`.
    Provider(Provider),
    /// Free-form string (credentials, locale, model, editor).
    Text(String),
    /// `timeout`, in milliseconds.
    Millis(u64),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(p) => write!(f, "{p}"),
            Self::Text(s) => f.write_str(s),
            Self::Millis(ms) => write!(f, "{ms}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw and validated configuration
// ---------------------------------------------------------------------------

/// Unvalidated `key -> value` strings, as stored on disk or passed in.
///
/// May carry unknown keys read from disk; they survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConfig(BTreeMap<String, String>);

impl RawConfig {
    /// Look up a value by key name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop entries whose value is empty.
    fn without_empty(&self) -> Self {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Fully resolved configuration.
///
/// Holds a value for every key unless resolution ran with errors suppressed
/// (failing keys are then omitted) or the key is the inactive provider's
/// credential and was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidConfig {
    values: BTreeMap<ConfigKey, ConfigValue>,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl ValidConfig {
    /// Value for `key`, if it resolved.
    pub fn get(&self, key: ConfigKey) -> Option<&ConfigValue> {
        self.values.get(&key)
    }

    /// Resolved entries, in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (ConfigKey, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Non-fatal diagnostics produced while resolving (editor availability).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Active provider.
    pub fn provider(&self) -> Provider {
        match self.get(ConfigKey::ApiProvider) {
            Some(ConfigValue::Provider(p)) => *p,
            _ => Provider::default(),
        }
    }

    /// Output locale.
    pub fn locale(&self) -> &str {
        self.text(ConfigKey::Locale).unwrap_or(DEFAULT_LOCALE)
    }

    /// Model name.
    pub fn model(&self) -> &str {
        self.text(ConfigKey::Model)
            .unwrap_or_else(|| self.provider().default_model())
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        let ms = match self.get(ConfigKey::Timeout) {
            Some(ConfigValue::Millis(ms)) => *ms,
            _ => DEFAULT_TIMEOUT_MS,
        };
        Duration::from_millis(ms)
    }

    /// Editor command.
    pub fn editor(&self) -> &str {
        self.text(ConfigKey::Editor).unwrap_or(default_editor())
    }

    /// API key of the active provider.
    pub fn api_key(&self) -> ConfigResult<&str> {
        let provider = self.provider();
        self.text(provider.credential_key())
            .ok_or(ConfigError::MissingCredential { provider })
    }

    fn text(&self, key: ConfigKey) -> Option<&str> {
        match self.get(key) {
            Some(ConfigValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// Result of a successful `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    /// Non-fatal diagnostics (editor availability).
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Context threaded through validators.
#[derive(Debug, Clone, Copy)]
struct Validation {
    provider: Provider,
    /// Credentials are always required, regardless of the active provider.
    strict: bool,
}

/// A validated value plus any warnings it produced.
type Validated = (Option<ConfigValue>, Vec<String>);

fn invalid(key: ConfigKey, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
        hint: None,
    }
}

fn validate(key: ConfigKey, value: Option<&str>, ctx: Validation) -> ConfigResult<Validated> {
    let value = value.filter(|v| !v.is_empty());

    match key {
        ConfigKey::ApiProvider => plain(ConfigValue::Provider(parse_provider(value)?)),
        ConfigKey::OpenaiKey => validate_credential(Provider::Openai, value, ctx),
        ConfigKey::AnthropicApiKey => validate_credential(Provider::Anthropic, value, ctx),
        ConfigKey::Locale => {
            let Some(locale) = value else {
                return plain(ConfigValue::Text(DEFAULT_LOCALE.to_string()));
            };
            if !LOCALE_RE.is_match(locale) {
                return Err(invalid(
                    key,
                    "Must be a valid locale (letters and dashes/underscores). \
                     You can consult the list of codes in: \
                     https://wikipedia.org/wiki/List_of_ISO_639-1_codes",
                ));
            }
            plain(ConfigValue::Text(locale.to_string()))
        }
        ConfigKey::Model => {
            let Some(model) = value else {
                return plain(ConfigValue::Text(ctx.provider.default_model().to_string()));
            };
            let known = OPENAI_MODELS.iter().chain(ANTHROPIC_MODELS).any(|m| *m == model);
            if !known {
                return Err(invalid(key, "Must be one of the supported models"));
            }
            plain(ConfigValue::Text(model.to_string()))
        }
        ConfigKey::Timeout => {
            let Some(timeout) = value else {
                return plain(ConfigValue::Millis(DEFAULT_TIMEOUT_MS));
            };
            let ms = timeout
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| timeout.parse::<u64>().ok())
                .flatten()
                .ok_or_else(|| invalid(key, "Must be an integer"))?;
            if ms < MIN_TIMEOUT_MS {
                return Err(invalid(key, "Must be greater than 500ms"));
            }
            plain(ConfigValue::Millis(ms))
        }
        ConfigKey::Editor => {
            let Some(editor) = value else {
                return plain(ConfigValue::Text(default_editor().to_string()));
            };
            if editor.trim().is_empty() {
                return Err(invalid(key, "Cannot be empty"));
            }
            Ok((
                Some(ConfigValue::Text(editor.to_string())),
                editor_warnings(editor),
            ))
        }
    }
}

fn plain(value: ConfigValue) -> ConfigResult<Validated> {
    Ok((Some(value), Vec::new()))
}

fn parse_provider(value: Option<&str>) -> ConfigResult<Provider> {
    match value {
        None => Ok(Provider::default()),
        Some("openai") => Ok(Provider::Openai),
        Some("anthropic") => Ok(Provider::Anthropic),
        Some(_) => Err(invalid(
            ConfigKey::ApiProvider,
            r#"Must be "openai" or "anthropic""#,
        )),
    }
}

fn validate_credential(
    owner: Provider,
    value: Option<&str>,
    ctx: Validation,
) -> ConfigResult<Validated> {
    let key = owner.credential_key();
    match value {
        None if ctx.strict || ctx.provider == owner => {
            Err(ConfigError::MissingCredential { provider: owner })
        }
        None => Ok((None, Vec::new())),
        Some(v) if !v.starts_with(owner.credential_prefix()) => Err(invalid(
            key,
            format!(r#"Must start with "{}""#, owner.credential_prefix()),
        )),
        Some(v) => Ok((Some(ConfigValue::Text(v.to_string())), Vec::new())),
    }
}

/// Default editor command for this platform.
pub const fn default_editor() -> &'static str {
    if cfg!(windows) { "notepad" } else { "vi" }
}

/// Common editors for this platform.
pub fn platform_editors() -> &'static [&'static str] {
    let os = std::env::consts::OS;
    EDITORS_BY_PLATFORM
        .iter()
        .find(|(name, _)| *name == os)
        .or_else(|| EDITORS_BY_PLATFORM.iter().find(|(name, _)| *name == "linux"))
        .map_or(&[] as &[&str], |&(_, editors)| editors)
}

/// Search `PATH` for the configured editor and suggest alternatives.
///
/// Advisory only: the editor value is accepted regardless.
fn editor_warnings(editor: &str) -> Vec<String> {
    let program = editor.split_whitespace().next().unwrap_or(editor);
    let common = platform_editors();
    let mut warnings = Vec::new();

    if !has_binary(program) {
        warnings.push(format!(
            "Warning: '{editor}' does not appear to be installed or is not in your PATH."
        ));
        let available = installed_editors(common);
        if let Some(first) = available.first() {
            warnings.push(format!(
                "Available editors on your system: {}",
                available.join(", ")
            ));
            warnings.push(format!(
                "Tip: Run 'airelease config set editor={first}' to use an available editor."
            ));
        } else {
            warnings.push("No common editors were detected on your system.".to_string());
        }
    } else if !common.contains(&program) {
        warnings.push(format!(
            "Note: '{editor}' is not in the list of common editors for your platform, but it is installed."
        ));
    }

    for warning in &warnings {
        warn!(%warning, "editor availability");
    }
    warnings
}

/// Check each candidate concurrently, keeping list order. A check that
/// panics counts as not installed.
fn installed_editors(candidates: &[&'static str]) -> Vec<&'static str> {
    std::thread::scope(|scope| {
        let checks: Vec<_> = candidates
            .iter()
            .map(|&name| scope.spawn(move || has_binary(name).then_some(name)))
            .collect();
        checks
            .into_iter()
            .filter_map(|check| check.join().ok().flatten())
            .collect()
    })
}

/// Remediation text appended to `set` failures.
fn remediation_hint(key: ConfigKey, provider: Provider) -> Option<String> {
    match key {
        ConfigKey::ApiProvider => Some("Available providers: openai, anthropic".to_string()),
        ConfigKey::Locale => {
            Some("Example valid locales: en, en-US, fr, de-DE, ja, zh-CN".to_string())
        }
        ConfigKey::Model => Some(format!("Available models: {}", provider.models().join(", "))),
        ConfigKey::Timeout => Some(
            "Timeout should be specified in milliseconds (e.g., 10000 for 10 seconds)".to_string(),
        ),
        ConfigKey::Editor => Some(format!(
            "Recommended editors for your platform: {}",
            platform_editors().join(", ")
        )),
        ConfigKey::OpenaiKey | ConfigKey::AnthropicApiKey => None,
    }
}

fn with_hint(err: ConfigError, provider: Provider) -> ConfigError {
    match err {
        ConfigError::Invalid { key, reason, .. } => ConfigError::Invalid {
            key,
            reason,
            hint: remediation_hint(key, provider),
        },
        other => other,
    }
}

/// Split `key=value` on the first `=`.
pub fn parse_assignment(input: &str) -> ConfigResult<(String, String)> {
    input
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| ConfigError::MalformedAssignment {
            input: input.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Persisted file
// ---------------------------------------------------------------------------

/// [`figment::Provider`] for the flat `key=value` config file.
///
/// A missing file provides nothing.
#[derive(Debug, Clone)]
pub struct KeyValueFile {
    path: Utf8PathBuf,
}

impl KeyValueFile {
    /// Provider reading `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse the file.
    pub fn read(&self) -> ConfigResult<RawConfig> {
        if !path_exists(&self.path) {
            return Ok(RawConfig::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_key_values(&self.path, &contents)
    }
}

impl figment::Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        Metadata::named("airelease config file")
            .source(Source::File(self.path.clone().into_std_path_buf()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let raw = self
            .read()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        let dict: Dict = raw
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v.to_string())))
            .collect();
        Ok(Profile::Default.collect(dict))
    }
}

fn parse_key_values(path: &Utf8Path, contents: &str) -> ConfigResult<RawConfig> {
    let mut raw = RawConfig::default();
    for (idx, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(ConfigError::Parse {
                path: path.to_path_buf(),
                line_number: idx + 1,
                line: line.to_string(),
            });
        };
        raw.insert(key.trim(), unquote(value.trim()));
    }
    Ok(raw)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn render_key_values(raw: &RawConfig) -> String {
    raw.iter().map(|(k, v)| format!("{k}={v}\n")).collect()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The persisted config file and the operations on it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Utf8PathBuf,
}

impl ConfigStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$AIRELEASE_CONFIG_PATH`, or `~/.airelease`.
    pub fn at_default_location() -> ConfigResult<Self> {
        if let Some(path) = std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        let base = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
        let home = Utf8PathBuf::from_path_buf(base.home_dir().to_path_buf())
            .map_err(|_| ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(CONFIG_FILE_NAME)))
    }

    /// Path of the persisted file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the persisted file. Absent file yields an empty mapping.
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn read_persisted(&self) -> ConfigResult<RawConfig> {
        let raw = KeyValueFile::new(&self.path).read()?;
        debug!(entries = raw.len(), "read persisted config");
        Ok(raw)
    }

    /// Merge `overrides` over the persisted file and validate every key.
    ///
    /// With `suppress_errors`, keys that fail validation are omitted instead
    /// of aborting.
    #[instrument(skip(self, overrides), fields(path = %self.path))]
    pub fn resolve(&self, overrides: &RawConfig, suppress_errors: bool) -> ConfigResult<ValidConfig> {
        let merged: RawConfig = Figment::new()
            .merge(KeyValueFile::new(&self.path))
            .merge(Serialized::defaults(overrides.without_empty()))
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;

        let mut config = ValidConfig::default();
        let mut ctx = Validation {
            provider: Provider::default(),
            strict: false,
        };

        for key in ConfigKey::ALL {
            match validate(key, merged.get(key.as_str()), ctx) {
                Ok((value, warnings)) => {
                    if let Some(ConfigValue::Provider(p)) = value {
                        ctx.provider = p;
                    }
                    if let Some(value) = value {
                        config.values.insert(key, value);
                    }
                    config.warnings.extend(warnings);
                }
                Err(e) if suppress_errors => debug!(%key, error = %e, "suppressed config error"),
                Err(e) => return Err(e),
            }
        }

        debug!(provider = %config.provider(), "configuration resolved");
        Ok(config)
    }

    /// Validate and persist a batch of `key=value` pairs.
    ///
    /// Nothing is written unless every pair validates. Credentials are
    /// always required in this mode.
    #[instrument(skip(self, pairs), fields(path = %self.path))]
    pub fn set(&self, pairs: &[(String, String)]) -> ConfigResult<SetOutcome> {
        let mut raw = self.read_persisted()?;
        let mut outcome = SetOutcome::default();

        for (name, value) in pairs {
            let key: ConfigKey = name.parse()?;
            let provider = parse_provider(raw.get(ConfigKey::ApiProvider.as_str()))
                .unwrap_or_default();
            let ctx = Validation {
                provider,
                strict: true,
            };
            let (validated, warnings) =
                validate(key, Some(value.as_str()), ctx).map_err(|e| with_hint(e, provider))?;
            outcome.warnings.extend(warnings);

            let rendered = validated.map_or_else(String::new, |v| v.to_string());
            debug!(%key, secret = key.is_credential(), "validated config value");
            raw.insert(key.as_str(), rendered);
        }

        self.write(&raw)?;
        Ok(outcome)
    }

    /// Replace the file contents atomically.
    fn write(&self, raw: &RawConfig) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(render_key_values(raw).as_bytes())
            .map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!(entries = raw.len(), "wrote config");
        Ok(())
    }
}
