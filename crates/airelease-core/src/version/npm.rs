//! npm version bumps.

use camino::Utf8Path;
use tracing::debug;

use super::{BumpTarget, VersionError, VersionResult, read_file};
use crate::ecosystem::NPM_MARKER;
use crate::git;
use crate::process::Workspace;

/// Run `npm version`, then read back the version it produced.
///
/// `npm version` commits and tags, so a tag at HEAD is authoritative.
/// Without one (e.g. `--no-git-tag-version`) the bumped `package.json` is
/// read instead; older tags further back are never used.
pub(super) fn bump(
    ws: &Workspace<'_>,
    target: BumpTarget,
    passthrough: &[String],
) -> VersionResult<String> {
    let mut args = vec!["version", target.as_str()];
    args.extend(passthrough.iter().map(String::as_str));

    let output = ws.run("npm", &args).map_err(|source| VersionError::Spawn {
        tool: "npm".into(),
        source,
    })?;
    if !output.success {
        return Err(VersionError::ToolFailed {
            tool: "npm version".into(),
            message: output.stderr,
        });
    }

    if let Some(tag) = git::head_tag(ws)? {
        debug!(%tag, "version from git tag");
        return Ok(tag);
    }

    read_package_version(ws.root())?.ok_or_else(|| VersionError::NoVersionField {
        checked: vec!["git tag at HEAD".into(), NPM_MARKER.into()],
    })
}

/// The `version` field of `package.json`, if present.
pub(super) fn read_package_version(root: &Utf8Path) -> VersionResult<Option<String>> {
    let path = root.join(NPM_MARKER);
    let Some(contents) = read_file(&path)? else {
        return Ok(None);
    };
    let manifest: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "package.json is not valid JSON");
            return Ok(None);
        }
    };
    Ok(manifest
        .get("version")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}
