//! Python version bumps.
//!
//! Strategies run in order and the first one that yields a version wins:
//! `poetry`, then `bump2version`, then editing the version assignment by
//! hand. A tool that is missing or fails hands off to the next strategy;
//! errors while editing files by hand are reported.

use camino::Utf8Path;
use regex::{Captures, Regex};
use tracing::{debug, instrument};

use super::{BumpTarget, VersionError, VersionResult, bump_version, read_file};
use crate::git;
use crate::process::Workspace;

type Strategy = fn(&Workspace<'_>, BumpTarget) -> VersionResult<Option<String>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("poetry", poetry),
    ("bump2version", bump2version),
    ("manual", manual),
];

/// A version assignment in a project file.
struct VersionField {
    path: &'static str,
    key: &'static str,
    /// Whether the rewritten assignment has spaces around `=`.
    spaced: bool,
}

/// Files edited by hand, in priority order.
const VERSION_FIELDS: &[VersionField] = &[
    VersionField {
        path: "pyproject.toml",
        key: "version",
        spaced: true,
    },
    VersionField {
        path: "__init__.py",
        key: "__version__",
        spaced: true,
    },
    VersionField {
        path: "src/__init__.py",
        key: "__version__",
        spaced: true,
    },
    VersionField {
        path: "setup.py",
        key: "version",
        spaced: false,
    },
];

/// Read-only fallback: `version = 1.2.3` in `setup.cfg`.
const SETUP_CFG: &str = "setup.cfg";

impl VersionField {
    fn pattern(&self) -> Regex {
        let pattern = format!(
            r#"(?m)(?P<lead>^|[^\w-]){}\s*=\s*["'](?P<version>[^"']+)["']"#,
            regex::escape(self.key)
        );
        Regex::new(&pattern).expect("version field pattern is valid")
    }

    fn assignment(&self, version: &str) -> String {
        if self.spaced {
            format!(r#"{} = "{version}""#, self.key)
        } else {
            format!(r#"{}="{version}""#, self.key)
        }
    }

    fn read(&self, root: &Utf8Path) -> VersionResult<Option<String>> {
        let Some(contents) = read_file(&root.join(self.path))? else {
            return Ok(None);
        };
        Ok(self
            .pattern()
            .captures(&contents)
            .map(|caps| caps["version"].to_string()))
    }
}

#[instrument]
pub(super) fn bump(ws: &Workspace<'_>, target: BumpTarget) -> VersionResult<String> {
    for (name, strategy) in STRATEGIES {
        if let Some(version) = strategy(ws, target)? {
            debug!(strategy = name, %version, "python version bumped");
            return Ok(version);
        }
        debug!(strategy = name, "strategy produced no version");
    }

    Err(VersionError::NoVersionField {
        checked: VERSION_FIELDS.iter().map(|f| f.path.to_string()).collect(),
    })
}

/// The current version, checking each version field then `setup.cfg`.
pub(super) fn read_version(root: &Utf8Path) -> VersionResult<Option<String>> {
    for field in VERSION_FIELDS {
        if let Some(version) = field.read(root)? {
            return Ok(Some(version));
        }
    }

    let Some(contents) = read_file(&root.join(SETUP_CFG))? else {
        return Ok(None);
    };
    let re = Regex::new(r"(?m)^\s*version\s*=\s*(\S+)").expect("setup.cfg pattern is valid");
    Ok(re.captures(&contents).map(|caps| caps[1].to_string()))
}

/// Run a tool, treating a missing binary or non-zero exit as "not handled".
fn try_tool(ws: &Workspace<'_>, program: &str, args: &[&str]) -> Option<String> {
    match ws.run(program, args) {
        Ok(output) if output.success => Some(output.stdout),
        Ok(output) => {
            debug!(program, stderr = %output.stderr, "tool failed");
            None
        }
        Err(e) => {
            debug!(program, error = %e, "tool unavailable");
            None
        }
    }
}

fn poetry(ws: &Workspace<'_>, target: BumpTarget) -> VersionResult<Option<String>> {
    if try_tool(ws, "poetry", &["version", target.as_str()]).is_none() {
        return Ok(None);
    }
    Ok(try_tool(ws, "poetry", &["version", "--short"])
        .map(|out| out.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn bump2version(ws: &Workspace<'_>, target: BumpTarget) -> VersionResult<Option<String>> {
    if try_tool(ws, "bump2version", &[target.as_str()]).is_none() {
        return Ok(None);
    }
    match git::head_tag(ws) {
        Ok(Some(tag)) => return Ok(Some(tag)),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "could not read tag after bump2version"),
    }
    read_version(ws.root())
}

fn manual(ws: &Workspace<'_>, target: BumpTarget) -> VersionResult<Option<String>> {
    for field in VERSION_FIELDS {
        let path = ws.path(field.path);
        let Some(contents) = read_file(&path)? else {
            continue;
        };
        let re = field.pattern();
        let Some(current) = re.captures(&contents).map(|caps| caps["version"].to_string()) else {
            continue;
        };

        let next = bump_version(&current, target)?.to_string();
        let updated = re.replacen(&contents, 1, |caps: &Captures<'_>| {
            format!("{}{}", &caps["lead"], field.assignment(&next))
        });
        std::fs::write(&path, updated.as_bytes()).map_err(|source| VersionError::Io {
            path: path.clone(),
            source,
        })?;
        git::add(ws, field.path)?;

        debug!(file = field.path, %current, %next, "rewrote version field");
        return Ok(Some(next));
    }
    Ok(None)
}
