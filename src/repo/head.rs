//! Head-reference resolution.
//!
//! A repository's head pointer is either a raw commit id (detached) or a
//! symbolic reference naming the file that holds the actual id. The watch
//! has to land on the file that moves when a commit lands, so one level of
//! indirection is followed here.

use std::path::{Path, PathBuf};

use crate::watcher::WatchError;

/// Where the filesystem watch goes and which file name counts as the
/// tracked reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTarget {
    /// Directory the watch registers on (non-recursive).
    pub watch_dir: PathBuf,
    /// File name inside `watch_dir` whose changes mean "head moved".
    pub ref_name: String,
}

impl HeadTarget {
    /// Resolve the effective watch target for a repository metadata
    /// directory.
    ///
    /// - Symbolic head (`ref: refs/heads/main`): watch the target file's
    ///   directory, tracking the target's file name.
    /// - Target file not on disk (unborn branch, packed ref): fall back to
    ///   the head file's own directory, tracking `HEAD`.
    /// - Detached head (raw commit id): watch the head file's directory,
    ///   tracking `HEAD`.
    ///
    /// A missing or unreadable head file means the repository is not
    /// watchable; no worker is started in that case.
    pub fn resolve(git_dir: &Path) -> Result<Self, WatchError> {
        let head_file = git_dir.join("HEAD");
        let content =
            std::fs::read_to_string(&head_file).map_err(|_| WatchError::MissingHeadRef {
                dir: git_dir.to_path_buf(),
            })?;

        if let Some(target) = content.strip_prefix("ref:") {
            let target = target.trim();
            let target_path = git_dir.join(target);

            if target_path.exists() {
                let watch_dir = target_path
                    .parent()
                    .unwrap_or(git_dir)
                    .to_path_buf();
                let ref_name = target_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "HEAD".to_string());
                return Ok(Self { watch_dir, ref_name });
            }

            crate::debug_event!(
                "watcher",
                "ref target missing, tracking HEAD",
                "{target}"
            );
        }

        Ok(Self {
            watch_dir: git_dir.to_path_buf(),
            ref_name: "HEAD".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_dir(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join(".git");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_symbolic_ref_with_existing_target() {
        let temp = TempDir::new().unwrap();
        let git = git_dir(&temp);
        std::fs::create_dir_all(git.join("refs/heads")).unwrap();
        std::fs::write(git.join("refs/heads/main"), "0123456789abcdef\n").unwrap();
        std::fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let target = HeadTarget::resolve(&git).unwrap();
        assert_eq!(target.watch_dir, git.join("refs/heads"));
        assert_eq!(target.ref_name, "main");
    }

    #[test]
    fn test_symbolic_ref_with_missing_target_falls_back() {
        let temp = TempDir::new().unwrap();
        let git = git_dir(&temp);
        std::fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let target = HeadTarget::resolve(&git).unwrap();
        assert_eq!(target.watch_dir, git);
        assert_eq!(target.ref_name, "HEAD");
    }

    #[test]
    fn test_detached_head() {
        let temp = TempDir::new().unwrap();
        let git = git_dir(&temp);
        std::fs::write(
            git.join("HEAD"),
            "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3\n",
        )
        .unwrap();

        let target = HeadTarget::resolve(&git).unwrap();
        assert_eq!(target.watch_dir, git);
        assert_eq!(target.ref_name, "HEAD");
    }

    #[test]
    fn test_missing_head_file() {
        let temp = TempDir::new().unwrap();
        let git = git_dir(&temp);

        let err = HeadTarget::resolve(&git).unwrap_err();
        assert!(matches!(err, WatchError::MissingHeadRef { .. }));
    }
}
