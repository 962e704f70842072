//! Error reporting.
//!
//! Known errors print a single `✖ <message>` line. Anything else prints the
//! full error chain, the tool version and where to file a bug.

use owo_colors::{OwoColorize, Stream};

/// Where unexpected failures should be reported.
pub const ISSUES_URL: &str = "https://github.com/Coldsewoo/airelease/issues/new";

const CROSS: &str = "✖";

/// The first known error in `err`'s chain, if any.
pub fn known_cause(err: &anyhow::Error) -> Option<&(dyn std::error::Error + 'static)> {
    err.chain().find(|cause| airelease_core::error::is_known(*cause))
}

/// Render `err` for the terminal, without color.
pub fn render(err: &anyhow::Error) -> String {
    match known_cause(err) {
        Some(cause) => format!("✖ {cause}"),
        None => format!(
            "✖ {err:?}\n\nairelease v{}\n\nPlease open a Bug report with the information above:\n{ISSUES_URL}",
            env!("CARGO_PKG_VERSION")
        ),
    }
}

/// Print `err` to stderr.
pub fn print_error(err: &anyhow::Error) {
    tracing::error!(error = %err, known = known_cause(err).is_some(), "fatal error");

    let cross = CROSS.if_supports_color(Stream::Stderr, |t| t.red());
    match known_cause(err) {
        Some(cause) => eprintln!("{cross} {cause}"),
        None => {
            eprintln!("{cross} {err:?}");
            eprintln!();
            let version = format!("airelease v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("{}", version.if_supports_color(Stream::Stderr, |t| t.dimmed()));
            eprintln!();
            eprintln!("Please open a Bug report with the information above:");
            eprintln!("{}", ISSUES_URL.if_supports_color(Stream::Stderr, |t| t.cyan()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airelease_core::git::GitError;
    use airelease_core::release::ReleaseError;
    use anyhow::Context;

    #[test]
    fn known_error_renders_one_line() {
        let err = anyhow::Error::new(GitError::DirtyTree);
        assert_eq!(
            render(&err),
            "✖ The working directory has uncommitted changes. Please commit or stash them."
        );
    }

    #[test]
    fn known_error_under_context_uses_cause_message() {
        let err: anyhow::Result<()> = Err(ReleaseError::NoCommits).context("release failed");
        let err = err.unwrap_err();
        assert_eq!(
            render(&err),
            "✖ No commits were detected. Try specifying a different target tag."
        );
    }

    #[test]
    fn unexpected_error_includes_bug_report_pointer() {
        let io = std::io::Error::other("disk on fire");
        let err = anyhow::Error::new(GitError::Exec(io));
        let out = render(&err);
        assert!(out.contains("disk on fire"));
        assert!(out.contains(concat!("airelease v", env!("CARGO_PKG_VERSION"))));
        assert!(out.ends_with(ISSUES_URL));
    }

    #[test]
    fn plain_anyhow_error_is_unexpected() {
        let err = anyhow::anyhow!("something odd");
        assert!(known_cause(&err).is_none());
    }
}
