//! Observability setup: structured logging.
//!
//! **Important**: This module never writes to stdout, which is reserved for
//! command output (`--json` in particular). Logs go to a JSON-lines file, or
//! to stderr when no log location is writable.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "AIRELEASE_LOG_PATH";
const ENV_LOG_DIR: &str = "AIRELEASE_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// The service name used for the log file name.
    pub service: String,
    /// Explicit log file path (`AIRELEASE_LOG_PATH`).
    pub log_path: Option<PathBuf>,
    /// Log directory (`AIRELEASE_LOG_DIR`).
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Read overrides from the environment.
    pub fn from_env() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_path: std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
            log_dir: std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

/// Guard that must be held for the lifetime of the application so buffered
/// log lines are flushed on exit.
pub struct ObservabilityGuard {
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize logging.
///
/// Returns a guard that must be held for the application lifetime.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let (writer, guard) = match resolve_log_target(cfg) {
        Ok(target) => {
            let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
            tracing_appender::non_blocking(appender)
        }
        Err(err) => {
            // stderr, never stdout
            eprintln!("Warning: {err}. Falling back to stderr logging.");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let log_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init()?;

    tracing::debug!(service = %cfg.service, "observability initialized");

    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Build an `EnvFilter` based on CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > default_level
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    if verbose > 0 {
        let level = match verbose {
            1 => "debug",
            _ => "trace",
        };
        return EnvFilter::new(level);
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(cfg: &ObservabilityConfig) -> Result<LogTarget, String> {
    let data_dir = directories::ProjectDirs::from("", "", &cfg.service)
        .map(|dirs| dirs.data_local_dir().join("logs"));

    resolve_log_target_with(
        &cfg.service,
        cfg.log_path.clone(),
        cfg.log_dir.clone(),
        data_dir,
    )
}

/// The working directory is never a candidate: a log file there would dirty
/// the repository being released.
fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<LogTarget, String> {
    if let Some(path) = path_override {
        return log_target_from_path(path);
    }

    if let Some(dir) = dir_override {
        return log_target_from_dir(dir, service);
    }

    match data_dir {
        Some(dir) => log_target_from_dir(dir, service),
        None => Err("No writable log directory found".to_string()),
    }
}

fn log_target_from_dir(dir: PathBuf, service: &str) -> Result<LogTarget, String> {
    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    ensure_writable(&dir, &file_name)?;
    Ok(LogTarget { dir, file_name })
}

fn log_target_from_path(path: PathBuf) -> Result<LogTarget, String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("{ENV_LOG_PATH} must include a file name"))
        .and_then(|name| {
            name.to_str()
                .map(str::to_string)
                .ok_or_else(|| format!("{ENV_LOG_PATH} must be valid UTF-8"))
        })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_writable(dir, &file_name)?;

    Ok(LogTarget {
        dir: dir.to_path_buf(),
        file_name,
    })
}

/// Check that `dir` accepts new files. The appender writes dated files
/// (`<file_name>.YYYY-MM-DD`), so the test file is removed afterwards.
fn ensure_writable(dir: &Path, file_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create log directory {}: {e}", dir.display()))?;

    let test_file = dir.join(format!(".{file_name}.tmp"));
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&test_file)
        .map_err(|e| format!("Log directory {} is not writable: {e}", dir.display()))?;
    if let Err(e) = std::fs::remove_file(&test_file) {
        eprintln!("Warning: could not remove {}: {e}", test_file.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn env_filter_quiet_overrides() {
        let filter = env_filter(true, 3, "info");
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn env_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 2, "info").to_string(), "trace");
    }

    #[test]
    fn path_override_wins() {
        let tmp = TempDir::new().unwrap();
        let file_path = tmp.path().join("custom.jsonl");

        let target = resolve_log_target_with(
            "airelease",
            Some(file_path),
            Some(tmp.path().join("ignored")),
            None,
        )
        .unwrap();

        assert_eq!(target.dir, tmp.path());
        assert_eq!(target.file_name, "custom.jsonl");
        assert!(!tmp.path().join("ignored").exists());
    }

    #[test]
    fn dir_override_appends_file_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        let target = resolve_log_target_with("airelease", None, Some(dir.clone()), None).unwrap();

        assert_eq!(target.dir, dir);
        assert_eq!(target.file_name, "airelease.jsonl");
        assert!(dir.is_dir());
    }

    #[test]
    fn writability_check_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        resolve_log_target_with("airelease", None, Some(dir.clone()), None).unwrap();
        resolve_log_target_with("airelease", Some(dir.join("custom.jsonl")), None, None).unwrap();

        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_dir_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores directory permissions
        let writable = std::fs::File::create(dir.join("x")).is_ok();
        let result = resolve_log_target_with("airelease", None, Some(dir.clone()), None);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        if !writable {
            assert!(result.unwrap_err().contains("is not writable"));
        }
    }

    #[test]
    fn data_dir_is_last_resort() {
        let tmp = TempDir::new().unwrap();
        let target =
            resolve_log_target_with("airelease", None, None, Some(tmp.path().to_path_buf()))
                .unwrap();
        assert_eq!(target.dir, tmp.path());
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(resolve_log_target_with("airelease", None, None, None).is_err());
    }
}
