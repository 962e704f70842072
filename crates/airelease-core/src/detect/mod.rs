//! Project detection: classify the working directory by marker files.
//!
//! Priority, first match wins:
//! 1. `package.json` → npm
//! 2. `setup.py`, `pyproject.toml` or `setup.cfg` → python
//! 3. A marker of a known-but-unsupported ecosystem → error naming it
//! 4. Otherwise → unsupported
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use airelease_core::detect;
//!
//! match detect::assert_supported(Utf8Path::new(".")) {
//!     Ok(project) => println!("Detected: {project}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::ecosystem::{NPM_MARKER, PYTHON_MARKERS, ProjectType, UNSUPPORTED_ECOSYSTEMS};
use crate::fs::path_exists;

/// Errors from project detection.
#[derive(Error, Debug)]
pub enum DetectError {
    /// A recognized ecosystem that cannot be released yet.
    #[error(
        "{name} project detected but not yet supported.\n\
         airelease currently supports npm/Node.js and Python projects.\n\
         {name} support is planned for a future release."
    )]
    UnsupportedEcosystem {
        /// Ecosystem name (e.g. "Go").
        name: &'static str,
    },

    /// No marker file of any kind.
    #[error(
        "No supported project configuration found.\n\
         airelease supports:\n  \
         • npm/Node.js projects (package.json)\n  \
         • Python projects (setup.py, pyproject.toml, setup.cfg)\n\
         Please run this command in a supported project directory."
    )]
    NoSupportedProject,
}

impl DetectError {
    /// Detection failures are always user-actionable.
    pub const fn is_known(&self) -> bool {
        true
    }
}

/// Result alias for detection.
pub type DetectResult<T> = Result<T, DetectError>;

/// Classify `project_root`.
///
/// Fails only when a known-but-unsupported ecosystem is found.
#[instrument(fields(root = %project_root))]
pub fn detect_project_type(project_root: &Utf8Path) -> DetectResult<ProjectType> {
    let has = |marker: &str| path_exists(project_root.join(marker));

    if has(NPM_MARKER) {
        debug!("found package.json");
        return Ok(ProjectType::Npm);
    }

    if let Some(marker) = PYTHON_MARKERS.iter().find(|m| has(m)) {
        debug!(marker, "found python marker");
        return Ok(ProjectType::Python);
    }

    for (name, markers) in UNSUPPORTED_ECOSYSTEMS {
        if markers.iter().any(|m| has(m)) {
            debug!(ecosystem = name, "found unsupported ecosystem");
            return Err(DetectError::UnsupportedEcosystem { name: *name });
        }
    }

    debug!("no marker files found");
    Ok(ProjectType::Unsupported)
}

/// Detect and require a releasable project type.
pub fn assert_supported(project_root: &Utf8Path) -> DetectResult<ProjectType> {
    match detect_project_type(project_root)? {
        ProjectType::Unsupported => Err(DetectError::NoSupportedProject),
        supported => Ok(supported),
    }
}

/// Check whether a binary is available on `PATH`.
pub fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}
