//! Core library for airelease.
//!
//! This crate provides the release workflow used by the `airelease` CLI:
//! configuration, project detection, version bumps, commit digests and
//! LLM-drafted release notes.
//!
//! # Modules
//!
//! - [`config`] - Configuration resolution, validation and persistence
//! - [`detect`] - Project type detection
//! - [`digest`] - Commits since the previous release
//! - [`ecosystem`] - Project types and their marker files
//! - [`error`] - Error types and result aliases
//! - [`fs`] - Filesystem helpers
//! - [`git`] - Git operations for release workflows
//! - [`llm`] - Release-note drafting through an LLM provider
//! - [`process`] - External command execution
//! - [`release`] - Release orchestration
//! - [`version`] - Version computation and project bumps
//!
//! # Quick Start
//!
//! ```no_run
//! use airelease_core::config::{ConfigStore, RawConfig};
//! use airelease_core::detect::detect_project_type;
//! use camino::Utf8Path;
//!
//! let store = ConfigStore::at_default_location().unwrap();
//! let config = store.resolve(&RawConfig::default(), true).unwrap();
//! let project = detect_project_type(Utf8Path::new(".")).unwrap();
//!
//! println!("{project} project, notes by {}", config.provider());
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod detect;

pub mod digest;

pub mod ecosystem;

pub mod error;

pub mod fs;

pub mod git;

pub mod llm;

pub mod process;

pub mod release;

pub mod version;

pub use config::{ConfigKey, ConfigStore, Provider, RawConfig, ValidConfig};

pub use error::{ConfigError, ConfigResult};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
