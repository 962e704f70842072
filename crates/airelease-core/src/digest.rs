//! Commit digest: the subjects of every commit since the previous release.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::git::{self, GitResult};
use crate::process::Workspace;

static HASH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]+ ").expect("valid hash prefix regex"));

/// Where the digest starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PreviousTag {
    /// A tag; the digest covers `tag..HEAD`.
    Tag(String),
    /// No prior tag; the digest covers the whole history.
    Initial,
}

impl PreviousTag {
    /// The revision range to log, or `None` for the whole history.
    pub fn range(&self) -> Option<String> {
        match self {
            Self::Tag(tag) => Some(format!("{tag}..HEAD")),
            Self::Initial => None,
        }
    }
}

impl fmt::Display for PreviousTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Initial => f.write_str("initial"),
        }
    }
}

/// Cleaned commit subjects since the previous release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitDigest {
    /// Subjects with hash prefixes removed, in log order.
    pub commits: Vec<String>,
    /// The raw `git log --oneline` output.
    pub log: String,
    /// Where the range started.
    pub previous_tag: PreviousTag,
}

impl CommitDigest {
    /// Human summary of the digest.
    pub fn summary(&self) -> String {
        summary(self.commits.len(), &self.previous_tag)
    }
}

/// Build a digest from `git log --oneline` output.
///
/// Returns `None` for an empty log.
pub fn parse_digest(log: &str, previous_tag: PreviousTag) -> Option<CommitDigest> {
    let log = log.trim_end();
    if log.trim().is_empty() {
        return None;
    }

    let commits = log
        .lines()
        .map(|line| HASH_PREFIX.replace(line, "").into_owned())
        .collect();

    Some(CommitDigest {
        commits,
        log: log.to_string(),
        previous_tag,
    })
}

/// Gather commits since `target` (or the latest tag).
///
/// With no tags at all, the whole history is used and the previous tag is
/// [`PreviousTag::Initial`]. Returns `None` when there are no commits.
#[instrument]
pub fn collect(ws: &Workspace<'_>, target: Option<&str>) -> GitResult<Option<CommitDigest>> {
    let previous_tag = match target {
        Some(tag) => PreviousTag::Tag(tag.to_string()),
        None => git::latest_tag(ws)?.map_or(PreviousTag::Initial, PreviousTag::Tag),
    };

    let range = previous_tag.range();
    let log = git::log_oneline(ws, range.as_deref())?;
    let digest = parse_digest(&log, previous_tag);
    debug!(
        commits = digest.as_ref().map_or(0, |d| d.commits.len()),
        "collected commit digest"
    );
    Ok(digest)
}

/// `"Detected {count} commit{s} from the previous release ({tag}) "`.
pub fn summary(count: usize, previous_tag: &PreviousTag) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!(
        "Detected {} commit{plural} from the previous release ({previous_tag}) ",
        group_thousands(count)
    )
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::process::testing::ScriptedRunner;
    use camino::Utf8Path;

    #[test]
    fn strips_hash_prefixes() {
        let digest = parse_digest(
            "a1b2c3d feat: x\n1234567 fix: y",
            PreviousTag::Tag("v1.0.0".into()),
        )
        .unwrap();
        assert_eq!(digest.commits, vec!["feat: x", "fix: y"]);
        assert_eq!(digest.previous_tag, PreviousTag::Tag("v1.0.0".into()));
        assert_eq!(digest.log, "a1b2c3d feat: x\n1234567 fix: y");
    }

    #[test]
    fn subject_without_hash_is_kept() {
        let digest = parse_digest("just text", PreviousTag::Initial).unwrap();
        assert_eq!(digest.commits, vec!["just text"]);
    }

    #[test]
    fn empty_log_is_none() {
        assert!(parse_digest("", PreviousTag::Initial).is_none());
        assert!(parse_digest("\n", PreviousTag::Initial).is_none());
    }

    #[test]
    fn summary_singular_and_plural() {
        let tag = PreviousTag::Tag("v1.0.0".into());
        assert_eq!(
            summary(1, &tag),
            "Detected 1 commit from the previous release (v1.0.0) "
        );
        assert_eq!(
            summary(2, &tag),
            "Detected 2 commits from the previous release (v1.0.0) "
        );
        assert_eq!(
            summary(0, &PreviousTag::Initial),
            "Detected 0 commit from the previous release (initial) "
        );
    }

    #[test]
    fn summary_groups_thousands() {
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn collect_uses_latest_tag_range() {
        let runner = ScriptedRunner::new()
            .on("git describe", CommandOutput::ok("v0.1.0\n"))
            .on("git log", CommandOutput::ok("abc123 feat: a\n"));
        let ws = Workspace::with_runner(Utf8Path::new("/repo"), &runner);

        let digest = collect(&ws, None).unwrap().unwrap();
        assert_eq!(digest.commits, vec!["feat: a"]);
        assert_eq!(runner.calls()[1], "git log --oneline v0.1.0..HEAD");
    }

    #[test]
    fn collect_without_tags_logs_everything() {
        let runner = ScriptedRunner::new()
            .on("git describe", CommandOutput::failed("No names found"))
            .on("git log", CommandOutput::ok("abc123 initial commit\n"));
        let ws = Workspace::with_runner(Utf8Path::new("/repo"), &runner);

        let digest = collect(&ws, None).unwrap().unwrap();
        assert_eq!(digest.previous_tag, PreviousTag::Initial);
        assert_eq!(runner.calls()[1], "git log --oneline");
    }

    #[test]
    fn collect_with_explicit_target_skips_describe() {
        let runner = ScriptedRunner::new().on("git log", CommandOutput::ok(""));
        let ws = Workspace::with_runner(Utf8Path::new("/repo"), &runner);

        assert!(collect(&ws, Some("v2.0.0")).unwrap().is_none());
        assert_eq!(runner.calls(), vec!["git log --oneline v2.0.0..HEAD"]);
    }
}
