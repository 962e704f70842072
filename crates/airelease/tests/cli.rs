//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Returns a Command configured to run our binary, isolated from the
/// user's config file, logs and API keys.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("AIRELEASE_CONFIG_PATH", home.path().join(".airelease"))
        .env("AIRELEASE_LOG_DIR", home.path().join("logs"))
        .env_remove("OPENAI_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("RUST_LOG")
        .env_remove("FORCE_COLOR")
        .env_remove("CLICOLOR_FORCE");
    cmd
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("[TARGET]"));
}

#[test]
fn long_help_lists_environment() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("AIRELEASE_CONFIG_PATH"))
        .stdout(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn version_flag_shows_version() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn short_version_flag_shows_version() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Release Arguments
// =============================================================================

#[test]
fn missing_target_is_a_known_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["-C", home.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "✖ No version argument was provided. Please provide target release (ex: major, minor, patch)",
        ))
        .stderr(predicate::str::contains("Bug report").not());
}

#[test]
fn color_never_prints_plain_known_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["--color", "never", "-C", home.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(
            "✖ No version argument was provided. Please provide target release (ex: major, minor, patch)\n",
        );
}

#[test]
fn color_always_styles_known_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["--color", "always", "-C", home.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\u{1b}["));
}

#[test]
fn invalid_target_shows_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("huge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_provider_shows_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["patch", "--provider", "mistral"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_flag_shows_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn release_outside_git_repository() {
    if !git_available() {
        return;
    }
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    cmd(&home)
        .env("GIT_CEILING_DIRECTORIES", project.path())
        .args(["-C", project.path().to_str().unwrap(), "patch", "-y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "✖ The current directory must be a Git repository!",
        ));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    let home = TempDir::new().unwrap();
    cmd(&home).args(["--quiet", "config", "get"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    let home = TempDir::new().unwrap();
    cmd(&home).args(["-vv", "config", "get"]).assert().success();
}

#[test]
fn color_never_accepted() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["--color", "never", "config", "get"])
        .assert()
        .success();
}

#[test]
fn logs_never_reach_stdout() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["-vv", "config", "get", "locale"])
        .assert()
        .success()
        .stdout("locale=en\n");
}

// =============================================================================
// Chdir Flag
// =============================================================================

#[test]
fn chdir_flag_changes_directory() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["-C", home.path().to_str().unwrap(), "config", "get"])
        .assert()
        .success();
}

#[test]
fn chdir_nonexistent_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["-C", "/nonexistent/path/that/does/not/exist", "config", "get"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to change directory"));
}
