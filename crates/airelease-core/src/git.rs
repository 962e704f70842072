//! Git operations for release workflows.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, GPG signing, hooks, and other configuration. Every call runs in
//! the [`Workspace`] root.

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::process::Workspace;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "status").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("The current directory must be a Git repository!")]
    NotARepo,

    /// Uncommitted changes in the working tree.
    #[error("The working directory has uncommitted changes. Please commit or stash them.")]
    DirtyTree,
}

impl GitError {
    /// Whether this is an anticipated, user-actionable failure.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Exec(_))
    }
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Absolute path of the repository's top-level directory.
#[instrument]
pub fn toplevel(ws: &Workspace<'_>) -> GitResult<Utf8PathBuf> {
    let output = git(ws, &["rev-parse", "--show-toplevel"]).map_err(|e| match e {
        GitError::Command { .. } => GitError::NotARepo,
        other => other,
    })?;
    let root = Utf8PathBuf::from(output.trim());
    debug!(%root, "repository root");
    Ok(root)
}

/// Check whether the working tree is clean (no uncommitted changes).
///
/// Returns `true` if both staged and unstaged changes are empty.
#[instrument]
pub fn is_clean(ws: &Workspace<'_>) -> GitResult<bool> {
    let output = git(ws, &["status", "--porcelain"])?;
    let clean = output.trim().is_empty();
    debug!(clean, "working tree status");
    Ok(clean)
}

/// Require a clean working tree.
pub fn assert_clean(ws: &Workspace<'_>) -> GitResult<()> {
    if is_clean(ws)? {
        Ok(())
    } else {
        Err(GitError::DirtyTree)
    }
}

/// Most recent tag reachable from HEAD, via `git describe`.
///
/// Returns `None` if there are no tags.
#[instrument]
pub fn latest_tag(ws: &Workspace<'_>) -> GitResult<Option<String>> {
    let tag = match git(ws, &["describe", "--tags", "--abbrev=0"]) {
        Ok(output) => Some(output.trim().to_string()).filter(|t| !t.is_empty()),
        Err(GitError::Command { .. }) => None,
        Err(e) => return Err(e),
    };
    debug!(?tag, "latest tag");
    Ok(tag)
}

/// Tag pointing exactly at HEAD, if any.
///
/// Unlike [`latest_tag`], an older release tag further back in history is
/// never returned.
#[instrument]
pub fn head_tag(ws: &Workspace<'_>) -> GitResult<Option<String>> {
    let tag = match git(ws, &["describe", "--tags", "--exact-match", "HEAD"]) {
        Ok(output) => Some(output.trim().to_string()).filter(|t| !t.is_empty()),
        Err(GitError::Command { .. }) => None,
        Err(e) => return Err(e),
    };
    debug!(?tag, "tag at HEAD");
    Ok(tag)
}

/// `git log --oneline`, over `range` if given or the whole history.
#[instrument]
pub fn log_oneline(ws: &Workspace<'_>, range: Option<&str>) -> GitResult<String> {
    let mut args = vec!["log", "--oneline"];
    args.extend(range);
    let output = git(ws, &args)?;
    debug!(lines = output.lines().count(), "commit log");
    Ok(output)
}

/// Stage a path.
#[instrument]
pub fn add(ws: &Workspace<'_>, path: &str) -> GitResult<()> {
    git(ws, &["add", path])?;
    Ok(())
}

/// Replace the last commit's message.
#[instrument(skip(message))]
pub fn commit_amend(ws: &Workspace<'_>, message: &str) -> GitResult<()> {
    git(ws, &["commit", "--amend", "-m", message])?;
    debug!("amended release commit");
    Ok(())
}

/// Commit all tracked changes.
#[instrument(skip(message))]
pub fn commit_all(ws: &Workspace<'_>, message: &str) -> GitResult<()> {
    git(ws, &["commit", "-a", "-m", message])?;
    debug!("created release commit");
    Ok(())
}

/// Create or move a lightweight tag to HEAD.
#[instrument]
pub fn force_tag(ws: &Workspace<'_>, name: &str) -> GitResult<()> {
    git(ws, &["tag", name, "-f"])?;
    debug!(tag = name, "tagged");
    Ok(())
}

/// Run a git command and return its stdout.
fn git(ws: &Workspace<'_>, args: &[&str]) -> GitResult<String> {
    let output = ws.run("git", args)?;

    if !output.success {
        let command = args.first().copied().unwrap_or("").to_string();
        return Err(GitError::Command {
            command,
            stderr: output.stderr,
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::process::testing::ScriptedRunner;
    use camino::Utf8Path;

    fn ws(runner: &ScriptedRunner) -> Workspace<'_> {
        Workspace::with_runner(Utf8Path::new("/repo"), runner)
    }

    #[test]
    fn toplevel_outside_repo() {
        let runner = ScriptedRunner::new().on(
            "git rev-parse",
            CommandOutput::failed("fatal: not a git repository"),
        );
        let err = toplevel(&ws(&runner)).unwrap_err();
        assert!(matches!(err, GitError::NotARepo));
        assert_eq!(err.to_string(), "The current directory must be a Git repository!");
    }

    #[test]
    fn toplevel_trims_output() {
        let runner = ScriptedRunner::new().on("git rev-parse", CommandOutput::ok("/repo\n"));
        assert_eq!(toplevel(&ws(&runner)).unwrap(), Utf8PathBuf::from("/repo"));
    }

    #[test]
    fn dirty_tree_is_rejected() {
        let runner = ScriptedRunner::new().on("git status", CommandOutput::ok(" M README.md\n"));
        let err = assert_clean(&ws(&runner)).unwrap_err();
        assert!(matches!(err, GitError::DirtyTree));
        assert!(err.is_known());
    }

    #[test]
    fn clean_tree_passes() {
        let runner = ScriptedRunner::new().on("git status", CommandOutput::ok(""));
        assert!(assert_clean(&ws(&runner)).is_ok());
    }

    #[test]
    fn latest_tag_none_without_tags() {
        let runner = ScriptedRunner::new().on(
            "git describe",
            CommandOutput::failed("fatal: No names found, cannot describe anything."),
        );
        assert_eq!(latest_tag(&ws(&runner)).unwrap(), None);
    }

    #[test]
    fn latest_tag_found() {
        let runner = ScriptedRunner::new().on("git describe", CommandOutput::ok("v1.2.3\n"));
        assert_eq!(latest_tag(&ws(&runner)).unwrap().as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn head_tag_requires_exact_match() {
        let runner = ScriptedRunner::new().on(
            "git describe --tags --exact-match",
            CommandOutput::failed("fatal: no tag exactly matches 'abc123'"),
        );
        assert_eq!(head_tag(&ws(&runner)).unwrap(), None);
        assert_eq!(runner.calls(), vec!["git describe --tags --exact-match HEAD"]);
    }

    #[test]
    fn head_tag_found() {
        let runner = ScriptedRunner::new().on(
            "git describe --tags --exact-match",
            CommandOutput::ok("v2.0.0\n"),
        );
        assert_eq!(head_tag(&ws(&runner)).unwrap().as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn log_with_and_without_range() {
        let runner = ScriptedRunner::new()
            .on("git log", CommandOutput::ok("abc feat: x\n"))
            .on("git log", CommandOutput::ok("abc feat: x\n"));
        let ws = ws(&runner);
        log_oneline(&ws, Some("v1.0.0..HEAD")).unwrap();
        log_oneline(&ws, None).unwrap();
        assert_eq!(
            runner.calls(),
            vec!["git log --oneline v1.0.0..HEAD", "git log --oneline"]
        );
    }

    #[test]
    fn command_failure_carries_subcommand_and_stderr() {
        let runner = ScriptedRunner::new().on("git tag", CommandOutput::failed("boom"));
        let err = force_tag(&ws(&runner), "v1.0.0").unwrap_err();
        assert_eq!(err.to_string(), "git tag failed: boom");
    }

    #[test]
    fn spawn_failure_is_unexpected() {
        let runner = ScriptedRunner::new();
        let err = is_clean(&ws(&runner)).unwrap_err();
        assert!(matches!(err, GitError::Exec(_)));
        assert!(!err.is_known());
    }
}
