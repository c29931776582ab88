//! Commit watch and AI review relay.
//!
//! Watches the active project's git repository for new commits, extracts
//! the diff between the two most recent commits, and relays it to a review
//! backend, gated on an in-memory auth session.
//!
//! The pipeline: [`workspace::SelectionFeed`] publishes the active project,
//! [`watcher::WatchSessionManager`] resolves it to a repository and owns the
//! single watch session, [`watcher::RefWatcher`] turns head-reference churn
//! into settled commit events, [`repo::DiffExtractor`] reads the diff, and
//! [`dispatch::Dispatcher`] forwards it to the review sink.

pub mod auth;
pub mod cli;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod logging;
pub mod repo;
pub mod store;
pub mod testgen;
pub mod watcher;
pub mod workspace;

pub use auth::AuthSession;
pub use config::Settings;
pub use console::{ConsoleLog, ReviewLog};
pub use dispatch::{Dispatcher, HttpReviewClient, ReviewOutcome, ReviewSink};
pub use repo::{DiffExtractor, DiffOutcome, DiffPayload, RepositoryHandle, RepositoryLocator};
pub use store::LastDiffStore;
pub use watcher::{CommitDebouncer, CommitEvent, SessionState, WatchSessionManager};
pub use workspace::{SelectionFeed, WorkspaceProject, WorkspaceScanner};
