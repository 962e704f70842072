//! airelease CLI
#![deny(unsafe_code)]

use std::process::ExitCode;

use airelease::{Cli, Commands, commands, report};
use anyhow::Context;
use clap::Parser;
use tracing::debug;

mod observability;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.apply();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;

    let obs_config = observability::ObservabilityConfig::from_env();
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, "info");
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    match cli.command {
        Some(Commands::Config(args)) => commands::config::cmd_config(args, cli.json),
        None => commands::release::cmd_release(cli.release, cli.json, &cwd),
    }
}
