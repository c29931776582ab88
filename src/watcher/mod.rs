//! Commit watch pipeline: detect head movement, settle the burst, hand
//! the diff off for dispatch.
//!
//! # Architecture
//!
//! ```text
//! WatchSessionManager        owns the single optional WatchSession
//!   - selection feed in, start/stop transitions out
//!         |
//!     RefWatcher             one worker task per session
//!   - notify watch on the head-ref directory
//!   - CommitDebouncer        collapses the ref-write burst
//!   - DiffExtractor          reads HEAD~1..HEAD
//!   - Dispatcher             auth gate, then the review sink
//! ```

mod debouncer;
mod error;
mod ref_watcher;
mod session;

pub use debouncer::{CommitDebouncer, CommitEvent};
pub use error::WatchError;
pub use ref_watcher::RefWatcher;
pub use session::{SessionState, WatchSession, WatchSessionManager};
