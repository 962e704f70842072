//! Release command: thin CLI layer over `airelease_core::release`.

use std::ffi::OsStr;
use std::fmt;

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use inquire::validator::Validation;
use inquire::{Confirm, Editor, InquireError, Select};
use owo_colors::{OwoColorize, Stream, Style};
use tracing::{debug, instrument};

use airelease_core::config::{ConfigKey, ConfigStore, Provider, RawConfig};
use airelease_core::llm;
use airelease_core::process::Workspace;
use airelease_core::release::{self, ReleaseError, ReleaseOptions};
use airelease_core::version::BumpTarget;

use super::spinner;

/// Arguments for a release (the default command).
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Version bump to release
    #[arg(value_enum, value_name = "TARGET")]
    pub target: Option<BumpTarget>,

    /// Previous release tag to compare against (default: latest tag)
    #[arg(short, long, value_name = "TAG")]
    pub tag: Option<String>,

    /// LLM provider for this run (overrides config)
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// Accept the generated release notes without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Extra arguments forwarded to `npm version`
    #[arg(last = true, value_name = "NPM_ARGS")]
    pub passthrough: Vec<String>,
}

/// Execute a release.
#[instrument(name = "cmd_release", skip_all, fields(target = ?args.target))]
pub fn cmd_release(args: ReleaseArgs, global_json: bool, cwd: &Utf8Path) -> anyhow::Result<()> {
    let target = args.target.ok_or(ReleaseError::MissingTarget)?;

    if !global_json {
        let banner = " airelease ";
        let style = Style::new().black().on_cyan();
        println!("\n{}\n", banner.if_supports_color(Stream::Stdout, |t| t.style(style)));
    }

    let store = ConfigStore::at_default_location()?;
    let ws = Workspace::system(cwd);
    let options = ReleaseOptions {
        target_tag: args.tag,
        overrides: env_overrides(args.provider),
    };

    let progress = spinner("Detecting target commit list", global_json);
    let prepared = release::prepare(&ws, &store, &options);
    progress.finish_and_clear();
    let prepared = prepared?;

    if !global_json {
        println!(
            "{} {}:",
            "◇".if_supports_color(Stream::Stdout, |t| t.green()),
            prepared.digest.summary().trim_end()
        );
        for commit in &prepared.digest.commits {
            println!("     {commit}");
        }
        println!();
    }
    for warning in prepared.config.warnings() {
        eprintln!("{}", warning.if_supports_color(Stream::Stderr, |t| t.yellow()));
    }

    let generator = llm::generator_for(&prepared.config)?;
    let progress = spinner("The AI is analyzing your changes", global_json);
    let notes = prepared.draft(generator.as_ref());
    progress.finish_and_clear();
    let notes = notes?;
    debug!(candidates = notes.len(), "notes drafted");

    let draft = notes.into_iter().next().ok_or(ReleaseError::NoNotes)?;
    let message = if args.yes {
        draft
    } else {
        match review(draft, prepared.config.editor())? {
            Some(message) => message,
            None => {
                let cancelled = "Release cancelled";
                println!("{}", cancelled.if_supports_color(Stream::Stdout, |t| t.yellow()));
                return Ok(());
            }
        }
    };

    let progress = spinner(format!("Releasing next {target} version"), global_json);
    let outcome = prepared.finalize(&ws, target, &args.passthrough, &message);
    progress.finish_and_clear();
    let outcome = outcome?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Version: {}",
            outcome.version.if_supports_color(Stream::Stdout, |t| t.green())
        );
        println!(
            "{} Successfully committed!",
            "✔".if_supports_color(Stream::Stdout, |t| t.style(Style::new().green().bold()))
        );
    }
    Ok(())
}

/// Config overrides from the environment and `--provider`.
fn env_overrides(provider: Option<Provider>) -> RawConfig {
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    let mut overrides = RawConfig::default();
    if let Some(key) = env("OPENAI_KEY").or_else(|| env("OPENAI_API_KEY")) {
        overrides.insert(ConfigKey::OpenaiKey.as_str(), key);
    }
    if let Some(key) = env(ConfigKey::AnthropicApiKey.as_str()) {
        overrides.insert(ConfigKey::AnthropicApiKey.as_str(), key);
    }
    if let Some(provider) = provider {
        overrides.insert(ConfigKey::ApiProvider.as_str(), provider.as_str());
    }
    overrides
}

// ──────────────────────────────────────────────
// Interactive review
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Commit,
    Edit,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commit => "Commit",
            Self::Edit => "Edit message",
            Self::Cancel => "Cancel",
        })
    }
}

/// Let the operator accept, edit or cancel. `None` means cancelled.
fn review(draft: String, editor: &str) -> anyhow::Result<Option<String>> {
    println!("Generated release message:\n\n{}\n", indent(&draft));

    let action = Select::new(
        "What would you like to do?",
        vec![Action::Commit, Action::Edit, Action::Cancel],
    )
    .prompt();
    let Some(action) = cancellable(action).context("release prompt failed")? else {
        return Ok(None);
    };

    match action {
        Action::Commit => Ok(Some(draft)),
        Action::Cancel => Ok(None),
        Action::Edit => {
            let Some(edited) = edit(&draft, editor)? else {
                return Ok(None);
            };
            println!("\n{}\n", indent(&edited));
            let confirmed = Confirm::new("Use this edited message?")
                .with_default(true)
                .prompt();
            match cancellable(confirmed).context("confirmation prompt failed")? {
                Some(true) => Ok(Some(edited)),
                _ => Ok(None),
            }
        }
    }
}

fn edit(draft: &str, editor: &str) -> anyhow::Result<Option<String>> {
    let mut parts = editor.split_whitespace().map(OsStr::new);
    let command = parts.next().unwrap_or_else(|| OsStr::new(editor));
    let extra: Vec<&OsStr> = parts.collect();

    let edited = Editor::new("Edit the release message:")
        .with_predefined_text(draft)
        .with_editor_command(command)
        .with_args(&extra)
        .with_file_extension(".md")
        .with_validator(|text: &str| -> Result<Validation, inquire::CustomUserError> {
            Ok(if text.trim().is_empty() {
                Validation::Invalid("Please enter a release message".into())
            } else {
                Validation::Valid
            })
        })
        .prompt();

    Ok(cancellable(edited)
        .with_context(|| format!("failed to edit the release message with {editor}"))?
        .map(|text| text.trim_end().to_string()))
}

/// Escape and Ctrl-C cancel the release rather than fail it.
fn cancellable<T>(result: Result<T, InquireError>) -> Result<Option<T>, InquireError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e),
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_and_interrupt_are_not_errors() {
        let canceled: Result<(), _> = Err(InquireError::OperationCanceled);
        assert!(cancellable(canceled).unwrap().is_none());
        let interrupted: Result<(), _> = Err(InquireError::OperationInterrupted);
        assert!(cancellable(interrupted).unwrap().is_none());
        assert_eq!(cancellable(Ok(3)).unwrap(), Some(3));
    }

    #[test]
    fn other_prompt_errors_propagate() {
        let err: Result<(), _> = Err(InquireError::NotTTY);
        assert!(cancellable(err).is_err());
    }

    #[test]
    fn action_labels() {
        assert_eq!(Action::Edit.to_string(), "Edit message");
        assert_eq!(Action::Commit.to_string(), "Commit");
    }

    #[test]
    fn indent_prefixes_each_line() {
        assert_eq!(indent("a\nb"), "   a\n   b");
    }
}
