//! External process execution.
//!
//! Every tool airelease drives (`git`, `npm`, `poetry`, `bump2version`) is
//! invoked through a [`CommandRunner`], scoped to a project root by a
//! [`Workspace`]. The system implementation shells out so we inherit the
//! user's SSH keys, GPG signing, hooks, and tool configuration.

use std::io;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::trace;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs an external program to completion.
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd`, capturing its output.
    ///
    /// Returns `Err` only when the process could not be spawned (e.g. the
    /// binary is not on `PATH`). A non-zero exit is reported through
    /// [`CommandOutput::success`].
    fn run(&self, cwd: &Utf8Path, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cwd: &Utf8Path, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        trace!(%cwd, program, ?args, "spawning process");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd.as_std_path())
            .output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// A project root paired with the runner used to invoke tools there.
#[derive(Clone, Copy)]
pub struct Workspace<'a> {
    root: &'a Utf8Path,
    runner: &'a dyn CommandRunner,
}

impl std::fmt::Debug for Workspace<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish()
    }
}

impl<'a> Workspace<'a> {
    /// Workspace at `root` that spawns real processes.
    pub fn system(root: &'a Utf8Path) -> Self {
        Self {
            root,
            runner: &SystemRunner,
        }
    }

    /// Workspace at `root` using a custom runner.
    pub fn with_runner(root: &'a Utf8Path, runner: &'a dyn CommandRunner) -> Self {
        Self { root, runner }
    }

    /// The project root.
    pub const fn root(&self) -> &'a Utf8Path {
        self.root
    }

    /// Resolve `relative` against the project root.
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Run `program` in the project root.
    pub fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        self.runner.run(self.root, program, args)
    }
}
