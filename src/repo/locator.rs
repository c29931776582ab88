//! Resolving the active workspace project to a repository.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::workspace::WorkspaceProject;

/// Why the current selection could not be resolved to a watchable
/// repository.
///
/// None of these schedule a retry. The session manager reports the reason,
/// stays idle, and waits for the next selection change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No active project selected")]
    NoActiveProject,

    #[error("Project '{name}' is closed")]
    ProjectClosed { name: String },

    #[error("Project '{name}' has no location on disk")]
    NoProjectLocation { name: String },

    #[error("Project '{name}' is not a repository")]
    NotARepository { name: String },
}

/// Identifies one repository under a resolved project.
///
/// Created when a project resolves; dropped when the project is deselected
/// or its watch session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Name of the project the repository belongs to.
    pub project_name: String,
    /// Project root, which is also the repository work tree root.
    pub root: PathBuf,
    /// The repository metadata directory (`<root>/.git`).
    pub git_dir: PathBuf,
}

impl RepositoryHandle {
    /// The head pointer file. Its effective target is resolved fresh at
    /// watch start, since it changes when branches are switched.
    pub fn head_file(&self) -> PathBuf {
        self.git_dir.join("HEAD")
    }
}

/// Finds the repository for a workspace project.
pub struct RepositoryLocator;

impl RepositoryLocator {
    /// Resolve the current selection into a repository handle.
    pub fn resolve(
        selection: Option<&WorkspaceProject>,
    ) -> Result<RepositoryHandle, ResolveError> {
        let project = selection.ok_or(ResolveError::NoActiveProject)?;

        if !project.is_open {
            return Err(ResolveError::ProjectClosed {
                name: project.name.clone(),
            });
        }

        let root = project.root.as_ref().ok_or_else(|| ResolveError::NoProjectLocation {
            name: project.name.clone(),
        })?;

        Self::locate(&project.name, root)
    }

    /// Check one candidate directory for repository metadata directly
    /// beneath it.
    ///
    /// A project without a `.git` directory is a valid, quiet outcome, not
    /// a fault; callers report it and take no watch action.
    pub fn locate(name: &str, root: &Path) -> Result<RepositoryHandle, ResolveError> {
        let git_dir = root.join(".git");

        if !git_dir.is_dir() {
            return Err(ResolveError::NotARepository {
                name: name.to_string(),
            });
        }

        Ok(RepositoryHandle {
            project_name: name.to_string(),
            root: root.to_path_buf(),
            git_dir,
        })
    }
}
