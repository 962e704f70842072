//! Filesystem helpers.

use std::path::Path;

/// Check whether anything exists at `path`.
///
/// Uses `symlink_metadata`, so a symlink counts as present even when its
/// target is missing. Any error (not found, permission denied, invalid path)
/// yields `false`.
pub fn path_exists(path: impl AsRef<Path>) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn existing_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("test.txt");
        fs::write(&file, "test content").unwrap();

        assert!(path_exists(&file));
    }

    #[test]
    fn missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!path_exists(tmp.path().join("nonexistent.txt")));
    }

    #[test]
    fn existing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("subdir");
        fs::create_dir(&dir).unwrap();

        assert!(path_exists(&dir));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target.txt");
        let link = tmp.path().join("link.txt");
        fs::write(&target, "content").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(path_exists(&link));
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_still_exists() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("broken-link.txt");
        std::os::unix::fs::symlink(tmp.path().join("nonexistent.txt"), &link).unwrap();

        assert!(path_exists(&link));
    }

    #[test]
    fn invalid_path() {
        assert!(!path_exists("/invalid/path/that/does/not/exist"));
    }
}
