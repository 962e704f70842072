//! Release orchestration.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Two-phase workflow
//!
//! 1. **Prepare** ([`prepare`]): check the repository, detect the project,
//!    gather commits since the previous release, resolve configuration.
//! 2. **Finalize** ([`PreparedRelease::finalize`]): bump the version,
//!    commit with the release notes, tag.
//!
//! Between the two the CLI calls [`PreparedRelease::draft`] to get candidate
//! notes and lets the operator accept or edit them.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ConfigStore, RawConfig, ValidConfig};
use crate::detect::{DetectError, assert_supported};
use crate::digest::{self, CommitDigest};
use crate::ecosystem::ProjectType;
use crate::error::ConfigError;
use crate::git::{self, GitError};
use crate::llm::{LlmError, NotesGenerator};
use crate::process::Workspace;
use crate::version::{self, BumpTarget, VersionError};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from the release workflow.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// No bump target was given.
    #[error(
        "No version argument was provided. Please provide target release (ex: major, minor, patch)"
    )]
    MissingTarget,

    /// The commit range is empty.
    #[error("No commits were detected. Try specifying a different target tag.")]
    NoCommits,

    /// The provider returned nothing usable.
    #[error("No release notes were generated. Try again.")]
    NoNotes,

    /// Git failure.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Project detection failure.
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// Version bump failure.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// LLM request failure.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ReleaseError {
    /// Whether this is an anticipated, user-actionable failure.
    pub fn is_known(&self) -> bool {
        match self {
            Self::MissingTarget | Self::NoCommits | Self::NoNotes => true,
            Self::Git(e) => e.is_known(),
            Self::Detect(e) => e.is_known(),
            Self::Version(e) => e.is_known(),
            Self::Config(e) => e.is_known(),
            Self::Llm(e) => e.is_known(),
        }
    }
}

/// Result alias for release operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

// ──────────────────────────────────────────────
// Prepare
// ──────────────────────────────────────────────

/// Inputs to [`prepare`].
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Previous release tag to diff against (default: latest tag).
    pub target_tag: Option<String>,
    /// Config values that take precedence over the persisted file.
    pub overrides: RawConfig,
}

/// Everything gathered before the notes are drafted.
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    /// Detected project type.
    pub project_type: ProjectType,
    /// Commits since the previous release.
    pub digest: CommitDigest,
    /// Resolved configuration.
    pub config: ValidConfig,
}

/// Check preconditions and gather the inputs for a release.
#[instrument(skip(store, options), fields(target_tag = ?options.target_tag))]
pub fn prepare(
    ws: &Workspace<'_>,
    store: &ConfigStore,
    options: &ReleaseOptions,
) -> ReleaseResult<PreparedRelease> {
    let toplevel = git::toplevel(ws)?;
    debug!(%toplevel, "inside git repository");
    git::assert_clean(ws)?;

    let project_type = assert_supported(ws.root())?;

    let digest = digest::collect(ws, options.target_tag.as_deref())?.ok_or(ReleaseError::NoCommits)?;
    info!(
        commits = digest.commits.len(),
        previous_tag = %digest.previous_tag,
        "collected commits"
    );

    let config = store.resolve(&options.overrides, false)?;

    Ok(PreparedRelease {
        project_type,
        digest,
        config,
    })
}

// ──────────────────────────────────────────────
// Draft and finalize
// ──────────────────────────────────────────────

/// What a finished release did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseOutcome {
    /// Tag the release was diffed against (`initial` for the first release).
    pub previous_tag: String,
    /// New version tag.
    pub version: String,
    /// Project type that was bumped.
    pub project_type: ProjectType,
    /// Full commit message.
    pub message: String,
    /// Whether the bump tool's commit was amended (vs. a new commit).
    pub amended: bool,
}

/// Commit message for a release.
pub fn release_message(version: &str, notes: &str) -> String {
    format!("{version}\n\n{notes}")
}

impl PreparedRelease {
    /// Ask `generator` for candidate release notes.
    #[instrument(skip_all, fields(provider = %generator.provider()))]
    pub fn draft(&self, generator: &dyn NotesGenerator) -> ReleaseResult<Vec<String>> {
        let notes = generator.generate(&self.digest.log)?;
        if notes.is_empty() {
            return Err(ReleaseError::NoNotes);
        }
        debug!(count = notes.len(), "drafted release notes");
        Ok(notes)
    }

    /// Bump, commit with `notes`, and tag.
    ///
    /// If the bump left changes in the tree they go into a new commit;
    /// otherwise the commit the bump tool made is amended.
    #[instrument(skip(self, passthrough, notes))]
    pub fn finalize(
        &self,
        ws: &Workspace<'_>,
        target: BumpTarget,
        passthrough: &[String],
        notes: &str,
    ) -> ReleaseResult<ReleaseOutcome> {
        let bump = version::bump_project_version(ws, target, passthrough)?;
        let message = release_message(&bump.version, notes);

        let amended = git::is_clean(ws)?;
        if amended {
            git::commit_amend(ws, &message)?;
        } else {
            git::commit_all(ws, &message)?;
        }
        git::force_tag(ws, &bump.version)?;

        info!(version = %bump.version, amended, "release tagged");
        Ok(ReleaseOutcome {
            previous_tag: self.digest.previous_tag.to_string(),
            version: bump.version,
            project_type: bump.project_type,
            message,
            amended,
        })
    }
}
