//! Version computation and project version bumps.
//!
//! [`bump_version`] is the pure arithmetic. [`bump_project_version`] mutates
//! the project: npm delegates to `npm version`, Python walks an ordered
//! chain of tools and finally edits the version field by hand. Either way the
//! resulting version is re-read from git or the project files rather than
//! taken from tool output.

mod npm;
mod python;

use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::detect::{DetectError, assert_supported};
use crate::ecosystem::ProjectType;
use crate::git::GitError;
use crate::process::Workspace;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The version string is not dot-separated integers.
    #[error("Invalid version format: {version}")]
    InvalidFormat {
        /// The version as found.
        version: String,
    },

    /// No strategy produced a version.
    #[error(
        "Could not find version field in {}.\nPlease ensure your project has a version field defined.",
        .checked.join(", ")
    )]
    NoVersionField {
        /// Locations that were checked.
        checked: Vec<String>,
    },

    /// An external bump tool exited with an error.
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Tool name (e.g., "npm").
        tool: String,
        /// Error details.
        message: String,
    },

    /// An external bump tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Tool name.
        tool: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read or write a project file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The project type cannot be bumped.
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl VersionError {
    /// Whether this is an anticipated, user-actionable failure.
    pub fn is_known(&self) -> bool {
        match self {
            Self::Spawn { .. } | Self::Io { .. } => false,
            Self::Detect(e) => e.is_known(),
            Self::Git(e) => e.is_known(),
            _ => true,
        }
    }
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpTarget {
    /// Major release (X.0.0).
    Major,
    /// Minor release (x.Y.0).
    Minor,
    /// Patch release (x.y.Z).
    Patch,
}

impl BumpTarget {
    /// Lowercase name, as passed to bump tools.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl std::fmt::Display for BumpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!("invalid bump target: {other}")),
        }
    }
}

/// Compute the next version by applying a bump target.
///
/// Returns `None` when the bumped component would overflow.
pub fn next_version(current: &Version, target: BumpTarget) -> Option<Version> {
    let next = match target {
        BumpTarget::Patch => {
            Version::new(current.major, current.minor, current.patch.checked_add(1)?)
        }
        BumpTarget::Minor => Version::new(current.major, current.minor.checked_add(1)?, 0),
        BumpTarget::Major => Version::new(current.major.checked_add(1)?, 0, 0),
    };
    Some(next)
}

/// Bump a dot-separated version string.
///
/// Needs at least `major.minor`; a missing patch counts as zero and
/// components past the third are ignored. Pre-release or build suffixes are
/// rejected.
pub fn bump_version(version: &str, target: BumpTarget) -> VersionResult<Version> {
    let invalid = || VersionError::InvalidFormat {
        version: version.to_string(),
    };
    let parts = version
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|_| invalid()))
        .collect::<VersionResult<Vec<_>>>()?;

    let [major, minor, rest @ ..] = parts.as_slice() else {
        return Err(invalid());
    };
    let patch = rest.first().copied().unwrap_or(0);
    next_version(&Version::new(*major, *minor, patch), target).ok_or_else(invalid)
}

/// Tag name for a version: the version with a single leading `v`.
pub fn tag_for(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Result of a project version bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumpOutcome {
    /// Project type that was bumped.
    pub project_type: ProjectType,
    /// New version, normalized with a leading `v`.
    pub version: String,
}

/// Bump the project version in the workspace root.
///
/// `passthrough` arguments are forwarded to `npm version` and ignored for
/// Python projects.
#[instrument(skip(passthrough))]
pub fn bump_project_version(
    ws: &Workspace<'_>,
    target: BumpTarget,
    passthrough: &[String],
) -> VersionResult<BumpOutcome> {
    let project_type = assert_supported(ws.root())?;
    let version = match project_type {
        ProjectType::Npm => npm::bump(ws, target, passthrough)?,
        ProjectType::Python => python::bump(ws, target)?,
        ProjectType::Unsupported => return Err(DetectError::NoSupportedProject.into()),
    };
    let version = tag_for(&version);
    info!(%project_type, %version, "bumped project version");
    Ok(BumpOutcome {
        project_type,
        version,
    })
}

/// Read the current version from project files without modifying anything.
///
/// Returns `None` if no version field is found.
pub fn current_version(root: &Utf8Path, project_type: ProjectType) -> VersionResult<Option<String>> {
    match project_type {
        ProjectType::Npm => npm::read_package_version(root),
        ProjectType::Python => python::read_version(root),
        ProjectType::Unsupported => Ok(None),
    }
}

fn read_file(path: &Utf8Path) -> VersionResult<Option<String>> {
    if !crate::fs::path_exists(path) {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| VersionError::Io {
            path: path.to_path_buf(),
            source,
        })
}
