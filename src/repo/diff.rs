//! Diff extraction between the two most recent commits.

use git2::{DiffFormat, Repository};
use std::path::PathBuf;
use thiserror::Error;

use super::locator::RepositoryHandle;

/// Extraction failed for a reason other than benign history shape.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Cannot open repository at {path}: {source}")]
    Open { path: PathBuf, source: git2::Error },

    #[error("Diff computation failed: {0}")]
    Diff(#[from] git2::Error),
}

/// The unified diff for one detected commit, plus the repository identity
/// it came from. Immutable once produced; ownership moves to the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPayload {
    /// Project the repository belongs to.
    pub repo_name: String,
    /// Repository work tree root.
    pub repo_root: PathBuf,
    /// Commit id the head pointed at when the diff was read.
    pub head: String,
    /// Unified diff text, parent-of-head to head.
    pub text: String,
}

/// Outcome of one extraction cycle.
///
/// The non-payload variants are benign: the cycle is a no-op and the
/// session keeps watching.
#[derive(Debug)]
pub enum DiffOutcome {
    Extracted(DiffPayload),
    /// Fewer than two commits, nothing to compare yet.
    InsufficientHistory,
    /// Two commits resolved but no textual change between their trees.
    Empty,
}

/// Computes the head-to-parent diff of a repository.
pub struct DiffExtractor;

impl DiffExtractor {
    /// Diff the two most recent commits of the handle's repository.
    ///
    /// Read-only: never touches the index, the work tree, or any ref.
    pub fn extract(handle: &RepositoryHandle) -> Result<DiffOutcome, ExtractError> {
        let repo = Repository::open(&handle.root).map_err(|source| ExtractError::Open {
            path: handle.root.clone(),
            source,
        })?;

        // An unresolvable head or a missing parent both mean the history is
        // too short to diff; git reports them as lookup failures.
        let new_tree = match repo.revparse_single("HEAD^{tree}") {
            Ok(obj) => obj.peel_to_tree()?,
            Err(_) => return Ok(DiffOutcome::InsufficientHistory),
        };
        let old_tree = match repo.revparse_single("HEAD~1^{tree}") {
            Ok(obj) => obj.peel_to_tree()?,
            Err(_) => return Ok(DiffOutcome::InsufficientHistory),
        };

        let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        if text.is_empty() {
            return Ok(DiffOutcome::Empty);
        }

        let head = repo.head()?.peel_to_commit()?.id().to_string();

        Ok(DiffOutcome::Extracted(DiffPayload {
            repo_name: handle.project_name.clone(),
            repo_root: handle.root.clone(),
            head,
            text,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_handle(root: &Path) -> RepositoryHandle {
        RepositoryHandle {
            project_name: "alpha".to_string(),
            root: root.to_path_buf(),
            git_dir: root.join(".git"),
        }
    }

    fn commit_file(repo: &Repository, path: &Path, content: &str, message: &str) {
        fs::write(path, content).unwrap();
        let mut index = repo.index().unwrap();
        let workdir = repo.workdir().unwrap().canonicalize().unwrap();
        let canonical_path = path.canonicalize().unwrap();
        index
            .add_path(canonical_path.strip_prefix(&workdir).unwrap())
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@test.com").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_single_commit_is_insufficient_history() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_file(&repo, &dir.path().join("file.txt"), "line1\n", "first");

        let outcome = DiffExtractor::extract(&test_handle(dir.path())).unwrap();
        assert!(matches!(outcome, DiffOutcome::InsufficientHistory));
    }

    #[test]
    fn test_empty_repository_is_insufficient_history() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();

        let outcome = DiffExtractor::extract(&test_handle(dir.path())).unwrap();
        assert!(matches!(outcome, DiffOutcome::InsufficientHistory));
    }

    #[test]
    fn test_two_commits_produce_payload() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("file.txt");
        commit_file(&repo, &file, "line1\n", "first");
        commit_file(&repo, &file, "line1\nnew line\n", "second");

        let outcome = DiffExtractor::extract(&test_handle(dir.path())).unwrap();
        let DiffOutcome::Extracted(payload) = outcome else {
            panic!("expected a payload");
        };

        assert_eq!(payload.repo_name, "alpha");
        assert_eq!(payload.repo_root, dir.path());
        assert!(payload.text.contains("file.txt"));
        assert!(payload.text.contains("+new line"));
        assert_eq!(payload.head.len(), 40);
    }

    #[test]
    fn test_identical_trees_produce_empty_outcome() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("file.txt");
        commit_file(&repo, &file, "line1\n", "first");

        // Second commit with an identical tree
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        let tree = head.tree().unwrap();
        let sig = Signature::now("Test", "test@test.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "no changes", &tree, &[&head])
            .unwrap();

        let outcome = DiffExtractor::extract(&test_handle(dir.path())).unwrap();
        assert!(matches!(outcome, DiffOutcome::Empty));
    }

    #[test]
    fn test_extract_does_not_mutate_repository() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("file.txt");
        commit_file(&repo, &file, "line1\n", "first");
        commit_file(&repo, &file, "line1\nline2\n", "second");

        let head_before = repo.head().unwrap().peel_to_commit().unwrap().id();
        DiffExtractor::extract(&test_handle(dir.path())).unwrap();
        let head_after = repo.head().unwrap().peel_to_commit().unwrap().id();

        assert_eq!(head_before, head_after);
        assert!(repo.statuses(None).unwrap().is_empty());
    }
}
