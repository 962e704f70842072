//! Library interface for the `airelease` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation and testing. The actual entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//! - [`report`] - Known/unexpected error reporting
//!
//! Without a subcommand the CLI runs a release: `airelease minor`.

pub mod commands;

pub mod report;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    OPENAI_KEY, OPENAI_API_KEY   OpenAI API key (overrides the config file)
    ANTHROPIC_API_KEY            Anthropic API key (overrides the config file)
    AIRELEASE_CONFIG_PATH        Config file location (default: ~/.airelease)
    RUST_LOG                     Log filter (e.g., debug, airelease_core=trace)
    AIRELEASE_LOG_PATH           Explicit log file path
    AIRELEASE_LOG_DIR            Log directory
";

/// Command-line interface definition for airelease.
#[derive(Parser)]
#[command(name = "airelease")]
#[command(
    about = "Bump your project version and commit AI-written release notes",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute. Without one, a release is run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Release arguments (used when no subcommand is given).
    #[command(flatten)]
    pub release: commands::release::ReleaseArgs,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage airelease configuration
    Config(commands::config::ConfigArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;
    use airelease_core::config::Provider;
    use airelease_core::version::BumpTarget;

    #[test]
    fn command_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn release_is_the_default() {
        let cli = Cli::try_parse_from(["airelease", "minor", "-t", "v1.0.0", "-y"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.release.target, Some(BumpTarget::Minor));
        assert_eq!(cli.release.tag.as_deref(), Some("v1.0.0"));
        assert!(cli.release.yes);
    }

    #[test]
    fn passthrough_after_double_dash() {
        let cli = Cli::try_parse_from(["airelease", "patch", "--", "--no-git-tag-version"]).unwrap();
        assert_eq!(cli.release.passthrough, vec!["--no-git-tag-version"]);
    }

    #[test]
    fn global_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "airelease", "-q", "-vv", "--color", "never", "config", "get",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Config(_))));
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
        assert!(cli.release.target.is_none());
    }

    #[test]
    fn chdir_before_subcommand_or_target() {
        let cli = Cli::try_parse_from(["airelease", "-C", "/tmp", "config", "get"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config(_))));
        assert_eq!(cli.chdir.as_deref(), Some(std::path::Path::new("/tmp")));

        let cli = Cli::try_parse_from(["airelease", "-C", "/tmp", "patch"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.release.target, Some(BumpTarget::Patch));
    }

    #[test]
    fn provider_flag() {
        let cli = Cli::try_parse_from(["airelease", "major", "-p", "anthropic"]).unwrap();
        assert_eq!(cli.release.provider, Some(Provider::Anthropic));
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::try_parse_from(["airelease", "config", "set", "locale=fr"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config(_))));
    }

    #[test]
    fn unknown_target_rejected() {
        assert!(Cli::try_parse_from(["airelease", "huge"]).is_err());
    }
}
