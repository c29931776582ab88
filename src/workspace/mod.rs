//! Workspace projects and the active-project selection feed.
//!
//! The watch pipeline does not care where project selections come from. A
//! CLI run scans the workspace directory and publishes one selection; a
//! host embedding the library publishes its own focus changes through the
//! same [`SelectionFeed`].

use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// One project inside a workspace.
///
/// `root` is absent for projects the host knows about but cannot place on
/// disk; `is_open` is false for projects the host has closed. Both cases
/// block repository resolution with a distinct reported reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceProject {
    /// Display name, also used to address the project from the CLI.
    pub name: String,
    /// Project root directory, when the project has a location on disk.
    pub root: Option<PathBuf>,
    /// Whether the project is open in the host.
    pub is_open: bool,
}

impl WorkspaceProject {
    /// A plain on-disk project rooted at `root`.
    pub fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: Some(root.into()),
            is_open: true,
        }
    }
}

/// Publishes active-project changes to the watch session manager.
///
/// Wraps a `tokio::sync::watch` channel: the manager subscribes once and
/// re-evaluates its state machine on every change. The feed always holds
/// the latest selection, so a late subscriber sees the current value.
#[derive(Clone)]
pub struct SelectionFeed {
    sender: watch::Sender<Option<WorkspaceProject>>,
}

impl SelectionFeed {
    /// Create a feed with no project selected.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Publish a new selection. `None` means no project is focused.
    pub fn select(&self, project: Option<WorkspaceProject>) {
        match &project {
            Some(p) => crate::debug_event!("selection", "changed", "{}", p.name),
            None => crate::debug_event!("selection", "cleared"),
        }
        // Send succeeds even with no subscriber; the value is retained
        let _ = self.sender.send(project);
    }

    /// Subscribe to selection changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<WorkspaceProject>> {
        self.sender.subscribe()
    }

    /// The currently published selection.
    pub fn current(&self) -> Option<WorkspaceProject> {
        self.sender.borrow().clone()
    }
}

impl Default for SelectionFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerates projects of a directory-based workspace.
///
/// Every top-level directory is one project; hidden directories are not
/// projects.
pub struct WorkspaceScanner {
    root: PathBuf,
}

impl WorkspaceScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List the workspace's projects, sorted by name.
    pub fn projects(&self) -> io::Result<Vec<WorkspaceProject>> {
        let mut projects = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            projects.push(WorkspaceProject::open(name, entry.path()));
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// Find a project by name.
    pub fn find(&self, name: &str) -> io::Result<Option<WorkspaceProject>> {
        Ok(self.projects()?.into_iter().find(|p| p.name == name))
    }

    /// The first project by name order, if the workspace has any.
    pub fn first(&self) -> io::Result<Option<WorkspaceProject>> {
        Ok(self.projects()?.into_iter().next())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scanner_lists_top_level_dirs() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("beta")).unwrap();
        std::fs::create_dir(temp.path().join("alpha")).unwrap();
        std::fs::create_dir(temp.path().join(".diffwatch")).unwrap();
        std::fs::write(temp.path().join("notes.txt"), "not a project").unwrap();

        let scanner = WorkspaceScanner::new(temp.path());
        let projects = scanner.projects().unwrap();

        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(projects.iter().all(|p| p.is_open));
        assert_eq!(
            projects[0].root.as_deref(),
            Some(temp.path().join("alpha").as_path())
        );
    }

    #[test]
    fn test_scanner_find_by_name() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("alpha")).unwrap();

        let scanner = WorkspaceScanner::new(temp.path());
        assert!(scanner.find("alpha").unwrap().is_some());
        assert!(scanner.find("gamma").unwrap().is_none());
    }

    #[test]
    fn test_feed_retains_latest_selection() {
        let feed = SelectionFeed::new();
        assert!(feed.current().is_none());

        feed.select(Some(WorkspaceProject::open("alpha", "/tmp/alpha")));
        assert_eq!(feed.current().unwrap().name, "alpha");

        // A late subscriber sees the current value
        let rx = feed.subscribe();
        assert_eq!(rx.borrow().as_ref().unwrap().name, "alpha");

        feed.select(None);
        assert!(feed.current().is_none());
    }
}
