//! Project types and the marker files that identify them.
//!
//! Detection logic lives in [`crate::detect`]; this module is pure types
//! and data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// npm / Node.js project (`package.json`).
    Npm,
    /// Python project (`setup.py`, `pyproject.toml`, `setup.cfg`).
    Python,
    /// Nothing recognized.
    Unsupported,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Python => write!(f, "python"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Marker for npm projects.
pub const NPM_MARKER: &str = "package.json";

/// Markers for Python projects, any of which suffices.
pub const PYTHON_MARKERS: &[&str] = &["setup.py", "pyproject.toml", "setup.cfg"];

/// Ecosystems we recognize but cannot release, in detection order.
pub const UNSUPPORTED_ECOSYSTEMS: &[(&str, &[&str])] = &[
    ("Ruby", &["Gemfile"]),
    ("Rust", &["Cargo.toml"]),
    ("Go", &["go.mod"]),
    ("Java (Maven)", &["pom.xml"]),
    ("Java (Gradle)", &["build.gradle", "build.gradle.kts"]),
    ("PHP", &["composer.json"]),
];
