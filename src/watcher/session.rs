//! Watch session lifecycle: the idle/watching state machine.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::console::ReviewLog;
use crate::dispatch::Dispatcher;
use crate::repo::{RepositoryHandle, RepositoryLocator};
use crate::workspace::WorkspaceProject;

use super::ref_watcher::RefWatcher;

/// Lifecycle state of the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No project resolved; no worker running.
    Idle,
    /// One session active, its worker running.
    Watching,
}

/// One live binding between a repository and a running watch worker.
pub struct WatchSession {
    handle: RepositoryHandle,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

impl WatchSession {
    /// Cancel the worker and wait for it to fully terminate.
    ///
    /// The worker observes the token within one poll cycle, so this
    /// completes promptly and the watch registration is released before
    /// the call returns.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.worker.await;
    }

    pub fn repo_root(&self) -> &Path {
        &self.handle.root
    }
}

/// Owns the single optional watch session and every transition between
/// idle and watching.
///
/// Transitions run one at a time on whichever task calls in, and a new
/// session is only started after the previous worker has fully stopped.
/// At most one worker is alive at any instant; no other component creates
/// or destroys sessions.
pub struct WatchSessionManager {
    settle_ms: u64,
    dispatcher: Arc<Dispatcher>,
    log: Arc<dyn ReviewLog>,
    session: Option<WatchSession>,
}

impl WatchSessionManager {
    pub fn new(settle_ms: u64, dispatcher: Arc<Dispatcher>, log: Arc<dyn ReviewLog>) -> Self {
        Self {
            settle_ms,
            dispatcher,
            log,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Watching
        } else {
            SessionState::Idle
        }
    }

    /// Root of the repository currently being watched.
    pub fn watched_root(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.repo_root())
    }

    /// Re-evaluate the state machine for a selection change.
    ///
    /// Stops the current session first and waits for its worker, then
    /// attempts resolution for the new selection. When resolution or
    /// registration fails, the reason is reported and the manager stays
    /// idle until the next selection change; nothing is retried on a
    /// timer.
    pub async fn apply_selection(&mut self, selection: Option<WorkspaceProject>) {
        // Re-selecting the watched project is a no-op; restarting the
        // watcher would lose an in-flight settle window. A closed project
        // or a dead worker does not qualify and falls through to a full
        // transition.
        if let (Some(session), Some(project)) = (&self.session, &selection) {
            if project.is_open
                && project.root.as_deref() == Some(session.repo_root())
                && !session.worker.is_finished()
            {
                crate::debug_event!("session", "unchanged", "{}", project.name);
                return;
            }
        }

        self.stop_session().await;

        let handle = match RepositoryLocator::resolve(selection.as_ref()) {
            Ok(handle) => handle,
            Err(e) => {
                crate::log_event!("session", "idle", "{e}");
                self.log.record(&format!("Not watching: {e}"));
                return;
            }
        };

        self.start_session(handle);
    }

    fn start_session(&mut self, handle: RepositoryHandle) {
        let watcher = match RefWatcher::register(
            handle.clone(),
            self.settle_ms,
            self.dispatcher.clone(),
            self.log.clone(),
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::error!("[session] cannot watch {}: {e}", handle.project_name);
                self.log
                    .record(&format!("Not watching {}: {e}", handle.project_name));
                return;
            }
        };

        let cancel = CancellationToken::new();
        let worker = tokio::spawn(watcher.run(cancel.clone()));

        crate::log_event!("session", "watching", "{}", handle.project_name);
        self.session = Some(WatchSession {
            handle,
            cancel,
            worker,
        });
    }

    /// Stop the active session, if any, and wait for its worker to finish.
    pub async fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            crate::log_event!("session", "stopping", "{}", session.handle.project_name);
            session.stop().await;
        }
    }

    /// Consume selection changes until shutdown.
    ///
    /// Subscribes to the feed once; every change re-runs the transition.
    /// With `resolve_on_start` the feed's current value is applied
    /// immediately instead of waiting for the first change. Without it,
    /// a selection already in the feed is announced but not applied
    /// until it changes.
    pub async fn run(
        mut self,
        mut feed: watch::Receiver<Option<WorkspaceProject>>,
        resolve_on_start: bool,
        shutdown: CancellationToken,
    ) {
        if resolve_on_start {
            let current = feed.borrow_and_update().clone();
            self.apply_selection(current).await;
        } else if feed.borrow().is_some() {
            // A selection published before subscription never fires
            // `changed()`, so say out loud that it is being held back.
            crate::log_event!("session", "startup resolution off");
            self.log
                .record("Startup resolution is off; watching begins on the next selection change.");
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                changed = feed.changed() => {
                    if changed.is_err() {
                        // All senders gone; no further selection can arrive
                        break;
                    }
                    let selection = feed.borrow_and_update().clone();
                    self.apply_selection(selection).await;
                }
            }
        }

        self.stop_session().await;
        crate::log_event!("session", "terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSession;
    use crate::dispatch::{ReviewOutcome, ReviewSink, SinkError};
    use crate::store::LastDiffStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    struct NullSink;

    #[async_trait]
    impl ReviewSink for NullSink {
        async fn submit(&self, _diff: &str) -> Result<ReviewOutcome, SinkError> {
            Ok(ReviewOutcome {
                text: "review response (200): ok".to_string(),
            })
        }
    }

    struct RecordingLog {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingLog {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }
    }

    impl crate::console::ReviewLog for RecordingLog {
        fn record(&self, message: &str) {
            self.messages.lock().push(message.to_string());
        }
    }

    fn manager_with_log() -> (WatchSessionManager, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(AuthSession::new()),
            Arc::new(NullSink),
            log.clone(),
            Arc::new(LastDiffStore::new()),
        ));
        (WatchSessionManager::new(50, dispatcher, log.clone()), log)
    }

    fn git_project(temp: &TempDir, name: &str) -> WorkspaceProject {
        let root = temp.path().join(name);
        std::fs::create_dir_all(root.join(".git/refs/heads")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(root.join(".git/refs/heads/main"), "0123abcd\n").unwrap();
        WorkspaceProject::open(name, root)
    }

    #[tokio::test]
    async fn test_starts_idle_and_stays_idle_without_selection() {
        let (mut manager, log) = manager_with_log();
        assert_eq!(manager.state(), SessionState::Idle);

        manager.apply_selection(None).await;
        assert_eq!(manager.state(), SessionState::Idle);
        assert!(
            log.messages
                .lock()
                .iter()
                .any(|m| m.contains("No active project"))
        );
    }

    #[tokio::test]
    async fn test_project_without_repository_stays_idle() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("plain");
        std::fs::create_dir(&root).unwrap();

        let (mut manager, log) = manager_with_log();
        manager
            .apply_selection(Some(WorkspaceProject::open("plain", root)))
            .await;

        assert_eq!(manager.state(), SessionState::Idle);
        assert!(
            log.messages
                .lock()
                .iter()
                .any(|m| m.contains("not a repository"))
        );
    }

    #[tokio::test]
    async fn test_repository_without_head_file_stays_idle() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("headless");
        std::fs::create_dir_all(root.join(".git")).unwrap();

        let (mut manager, log) = manager_with_log();
        manager
            .apply_selection(Some(WorkspaceProject::open("headless", root)))
            .await;

        assert_eq!(manager.state(), SessionState::Idle);
        assert!(
            log.messages
                .lock()
                .iter()
                .any(|m| m.contains("No head reference file"))
        );
    }

    #[tokio::test]
    async fn test_repository_project_starts_watching() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(project.clone())).await;

        assert_eq!(manager.state(), SessionState::Watching);
        assert_eq!(manager.watched_root(), project.root.as_deref());

        manager.stop_session().await;
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_switch_to_non_repository_stops_worker() {
        let temp = TempDir::new().unwrap();
        let p1 = git_project(&temp, "alpha");
        let p2_root = temp.path().join("beta");
        std::fs::create_dir(&p2_root).unwrap();

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(p1)).await;
        assert_eq!(manager.state(), SessionState::Watching);

        manager
            .apply_selection(Some(WorkspaceProject::open("beta", p2_root)))
            .await;

        // The old worker has fully stopped and nothing replaced it
        assert_eq!(manager.state(), SessionState::Idle);
        assert!(manager.watched_root().is_none());
    }

    #[tokio::test]
    async fn test_switch_between_repositories_moves_session() {
        let temp = TempDir::new().unwrap();
        let p1 = git_project(&temp, "alpha");
        let p2 = git_project(&temp, "beta");

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(p1)).await;
        manager.apply_selection(Some(p2.clone())).await;

        assert_eq!(manager.state(), SessionState::Watching);
        assert_eq!(manager.watched_root(), p2.root.as_deref());

        manager.stop_session().await;
    }

    #[tokio::test]
    async fn test_reselecting_same_project_keeps_session() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(project.clone())).await;
        let root_before = manager.watched_root().map(Path::to_path_buf);

        manager.apply_selection(Some(project)).await;
        assert_eq!(manager.state(), SessionState::Watching);
        assert_eq!(manager.watched_root().map(Path::to_path_buf), root_before);

        manager.stop_session().await;
    }

    #[tokio::test]
    async fn test_closing_watched_project_stops_session() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let (mut manager, log) = manager_with_log();
        manager.apply_selection(Some(project.clone())).await;
        assert_eq!(manager.state(), SessionState::Watching);

        // Same root, but the host has closed the project
        let closed = WorkspaceProject {
            is_open: false,
            ..project
        };
        manager.apply_selection(Some(closed)).await;

        assert_eq!(manager.state(), SessionState::Idle);
        assert!(
            log.messages
                .lock()
                .iter()
                .any(|m| m.contains("is closed"))
        );
    }

    #[tokio::test]
    async fn test_reselection_replaces_finished_worker() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(project.clone())).await;

        // Swap in a worker that has already exited, as after a watch
        // stream failure
        let session = manager.session.take().unwrap();
        let handle = session.handle.clone();
        session.stop().await;
        let worker = tokio::spawn(async {});
        while !worker.is_finished() {
            tokio::task::yield_now().await;
        }
        manager.session = Some(WatchSession {
            handle,
            cancel: CancellationToken::new(),
            worker,
        });
        assert_eq!(manager.state(), SessionState::Watching);

        manager.apply_selection(Some(project)).await;

        let session = manager.session.as_ref().unwrap();
        assert!(!session.worker.is_finished());

        manager.stop_session().await;
    }

    #[tokio::test]
    async fn test_deselection_while_watching_goes_idle() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let (mut manager, _log) = manager_with_log();
        manager.apply_selection(Some(project)).await;
        manager.apply_selection(None).await;

        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_run_without_resolve_on_start_announces_held_selection() {
        let temp = TempDir::new().unwrap();
        let project = git_project(&temp, "alpha");

        let feed = crate::workspace::SelectionFeed::new();
        feed.select(Some(project));

        let (manager, log) = manager_with_log();
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(manager.run(feed.subscribe(), false, shutdown.clone()));

        // The announcement happens before the loop, so it is in the log
        // by the time the worker has shut down
        shutdown.cancel();
        worker.await.unwrap();

        assert!(
            log.messages
                .lock()
                .iter()
                .any(|m| m.contains("Startup resolution is off"))
        );
    }
}
