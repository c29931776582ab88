//! Gating and delivery of extracted diffs.

pub mod review;

pub use review::{HttpReviewClient, ReviewOutcome, ReviewSink, SinkError};

use std::sync::Arc;

use crate::auth::AuthSession;
use crate::console::ReviewLog;
use crate::repo::DiffPayload;
use crate::store::LastDiffStore;

/// Delivers diff payloads to the analysis sink, gated on authorization.
///
/// The predicate is evaluated per payload at dispatch time. An unauthorized
/// payload is discarded whole: it is neither forwarded nor written to the
/// last-diff slot, so no extracted diff leaves this boundary without a
/// login.
pub struct Dispatcher {
    auth: Arc<AuthSession>,
    sink: Arc<dyn ReviewSink>,
    log: Arc<dyn ReviewLog>,
    last_diff: Arc<LastDiffStore>,
}

impl Dispatcher {
    pub fn new(
        auth: Arc<AuthSession>,
        sink: Arc<dyn ReviewSink>,
        log: Arc<dyn ReviewLog>,
        last_diff: Arc<LastDiffStore>,
    ) -> Self {
        Self {
            auth,
            sink,
            log,
            last_diff,
        }
    }

    /// Deliver one payload.
    ///
    /// Never fails the watch session: outcomes and failures are reported
    /// through the review log and the worker carries on.
    pub async fn dispatch(&self, payload: DiffPayload) {
        if !self.auth.is_authorized() {
            crate::log_event!("dispatch", "unauthorized", "{}", payload.repo_name);
            self.log
                .record("Authorization required: commit diff was not sent for review.");
            return;
        }

        self.last_diff.set(payload.text.clone());
        crate::debug_event!(
            "dispatch",
            "submitting",
            "{} bytes from {}",
            payload.text.len(),
            payload.repo_name
        );

        match self.sink.submit(&payload.text).await {
            Ok(outcome) => self.log.record(&outcome.text),
            Err(e) => self.log.record(&format!("Review request failed: {e}")),
        }
    }
}
