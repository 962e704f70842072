//! Config command: read and write `~/.airelease`.

use std::collections::BTreeMap;

use anyhow::Context;
use clap::{Args, Subcommand};
use owo_colors::{OwoColorize, Stream};
use tracing::{debug, instrument};

use airelease_core::config::{ConfigKey, ConfigStore, Provider, RawConfig, parse_assignment};

const CONFIG_HELP: &str = "\
EXAMPLES:
    airelease config get                          # Show all config values
    airelease config get OPENAI_KEY               # Show specific config
    airelease config set OPENAI_KEY=sk-xxx        # Set OpenAI API key
    airelease config set api_provider=anthropic   # Switch to Anthropic
    airelease config set locale=en-US             # Set output language
    airelease config set timeout=15000            # Set timeout (ms)
    airelease config set editor=vim               # Set editor
";

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
#[command(after_long_help = CONFIG_HELP)]
pub struct ConfigArgs {
    /// What to do with the configuration.
    #[command(subcommand)]
    pub mode: ConfigMode,
}

/// `config` modes.
#[derive(Subcommand, Debug)]
pub enum ConfigMode {
    /// Show resolved values (all keys, or only those named)
    Get {
        /// Keys to show
        #[arg(value_name = "KEY")]
        keys: Vec<String>,
    },

    /// Validate and persist values
    Set {
        /// Assignments such as `locale=fr`
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },
}

/// Execute the config command.
#[instrument(name = "cmd_config", skip_all)]
pub fn cmd_config(args: ConfigArgs, global_json: bool) -> anyhow::Result<()> {
    let store = ConfigStore::at_default_location().context("failed to locate config file")?;
    debug!(path = %store.path(), "using config file");

    match args.mode {
        ConfigMode::Get { keys } => get(&store, &keys, global_json),
        ConfigMode::Set { assignments } => set(&store, &assignments),
    }
}

fn get(store: &ConfigStore, keys: &[String], global_json: bool) -> anyhow::Result<()> {
    let config = store.resolve(&RawConfig::default(), true)?;

    // Unknown or unresolved keys are skipped silently.
    let selected: Vec<(ConfigKey, String)> = if keys.is_empty() {
        config.iter().map(|(k, v)| (k, v.to_string())).collect()
    } else {
        keys.iter()
            .filter_map(|name| name.parse::<ConfigKey>().ok())
            .filter_map(|key| config.get(key).map(|v| (key, v.to_string())))
            .collect()
    };

    if global_json {
        let map: BTreeMap<&str, &str> = selected
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if !keys.is_empty() {
        for (key, value) in &selected {
            println!("{key}={value}");
        }
        return Ok(());
    }

    let heading = "Current configuration:";
    println!("{}", heading.if_supports_color(Stream::Stdout, |t| t.bold()));
    for (key, value) in &selected {
        println!("  {key}={value}");
    }
    println!();
    let heading = "API Provider Info:";
    println!("{}", heading.if_supports_color(Stream::Stdout, |t| t.bold()));
    println!(
        "  Current API: {}",
        config.provider().if_supports_color(Stream::Stdout, |t| t.green())
    );
    println!(
        "  Available providers: {}",
        [Provider::Openai, Provider::Anthropic]
            .map(|p| p.as_str())
            .join(", ")
    );
    Ok(())
}

fn set(store: &ConfigStore, assignments: &[String]) -> anyhow::Result<()> {
    let pairs = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = store.set(&pairs)?;
    for warning in &outcome.warnings {
        eprintln!("{}", warning.if_supports_color(Stream::Stderr, |t| t.yellow()));
    }

    let names: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
    let names = names.join(", ");
    println!(
        "{} Saved {}",
        "✔".if_supports_color(Stream::Stdout, |t| t.green()),
        names.if_supports_color(Stream::Stdout, |t| t.bold())
    );
    Ok(())
}
