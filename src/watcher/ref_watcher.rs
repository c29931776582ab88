//! One filesystem watch bound to a repository's head reference.

use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use crate::console::ReviewLog;
use crate::dispatch::Dispatcher;
use crate::repo::{DiffExtractor, DiffOutcome, HeadTarget, RepositoryHandle};

use super::debouncer::{CommitDebouncer, CommitEvent};
use super::error::WatchError;

/// Poll interval for settle checks; also bounds how long a cancellation
/// can go unobserved.
const TICK_MS: u64 = 100;

/// Watches the directory holding the effective head-reference file and
/// turns settled ref-file bursts into extraction and dispatch cycles.
///
/// Registration and the event loop are split: [`RefWatcher::register`]
/// claims the watch and can fail, [`RefWatcher::run`] is the worker and
/// cannot. A failed registration therefore never leaves a worker behind.
pub struct RefWatcher {
    handle: RepositoryHandle,
    debouncer: CommitDebouncer,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    _watcher: notify::RecommendedWatcher,
    dispatcher: Arc<Dispatcher>,
    log: Arc<dyn ReviewLog>,
    /// Head commit id observed at the last extraction.
    last_head: Option<String>,
}

impl RefWatcher {
    /// Resolve the head target and register the filesystem watch.
    ///
    /// Fails when the repository has no readable head file or the watch
    /// registration is rejected; in both cases no worker is started.
    pub fn register(
        handle: RepositoryHandle,
        settle_ms: u64,
        dispatcher: Arc<Dispatcher>,
        log: Arc<dyn ReviewLog>,
    ) -> Result<Self, WatchError> {
        let target = HeadTarget::resolve(&handle.git_dir)?;

        let (tx, rx) = mpsc::channel(100);

        // The callback runs on notify's thread; hand events straight over
        // to the worker task.
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(&target.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: target.watch_dir.clone(),
                reason: e.to_string(),
            })?;

        crate::debug_event!("watcher", "watching", "{}", target.watch_dir.display());

        Ok(Self {
            handle,
            debouncer: CommitDebouncer::new(target.ref_name, settle_ms),
            event_rx: rx,
            _watcher: watcher,
            dispatcher,
            log,
            last_head: None,
        })
    }

    /// Run the watch loop until cancelled or the event stream fails.
    ///
    /// Owning the notify watcher keeps the registration alive; returning
    /// from here drops it, so a finished worker never leaks a watch.
    pub async fn run(mut self, cancel: CancellationToken) {
        crate::log_event!(
            "watcher",
            "started",
            "{} tracking {}",
            self.handle.project_name,
            self.debouncer.ref_name()
        );

        loop {
            // Periodic check for settled bursts
            let timeout = sleep(Duration::from_millis(TICK_MS));
            tokio::pin!(timeout);

            tokio::select! {
                _ = cancel.cancelled() => {
                    crate::debug_event!("watcher", "cancelled", "{}", self.handle.project_name);
                    break;
                }

                maybe = self.event_rx.recv() => {
                    match maybe {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => {
                            let err = WatchError::EventError {
                                details: e.to_string(),
                            };
                            tracing::error!("[watcher] {err}");
                            break;
                        }
                        None => {
                            tracing::error!("[watcher] {}", WatchError::ChannelClosed);
                            break;
                        }
                    }
                }

                _ = &mut timeout => {
                    if let Some(event) = self.debouncer.take_ready() {
                        self.process_commit(event).await;
                    }
                }
            }
        }

        crate::log_event!("watcher", "stopped", "{}", self.handle.project_name);
    }

    /// Feed raw filesystem events into the debouncer.
    fn handle_event(&mut self, event: Event) {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }

        for path in event.paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if self.debouncer.matches(name) {
                crate::debug_event!("watcher", "ref event", "{:?} {name}", event.kind);
                self.debouncer.record();
            } else {
                crate::debug_event!("watcher", "unmatched", "{name}");
            }
        }
    }

    /// Extract and dispatch once a burst has settled.
    ///
    /// Benign history shapes are reported and skipped; only real git
    /// failures are errors, and even those leave the session watching.
    async fn process_commit(&mut self, _event: CommitEvent) {
        crate::log_event!("watcher", "commit detected", "{}", self.handle.project_name);

        match DiffExtractor::extract(&self.handle) {
            Ok(DiffOutcome::Extracted(payload)) => {
                if let Some(prev) = &self.last_head {
                    crate::debug_event!(
                        "watcher",
                        "head moved",
                        "{} -> {}",
                        &prev[..7],
                        &payload.head[..7]
                    );
                }
                self.last_head = Some(payload.head.clone());
                self.dispatcher.dispatch(payload).await;
            }
            Ok(DiffOutcome::InsufficientHistory) => {
                self.log.record("Not enough commits to diff yet.");
            }
            Ok(DiffOutcome::Empty) => {
                self.log.record("No diff found for the new commit.");
            }
            Err(e) => {
                tracing::error!("[watcher] diff extraction failed: {e}");
            }
        }
    }
}
