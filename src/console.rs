//! Review activity log.

use parking_lot::RwLock;

/// Append-only logging sink for review activity.
///
/// Fire-and-forget: the watch pipeline never blocks on or inspects the
/// result of a record call.
pub trait ReviewLog: Send + Sync {
    fn record(&self, message: &str);
}

/// The in-memory review console.
///
/// Prints each entry to stdout (this is the user-visible output of a watch
/// run) and keeps the full history for later inspection.
#[derive(Default)]
pub struct ConsoleLog {
    history: RwLock<Vec<String>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }

    /// Drop the recorded history.
    pub fn clear(&self) {
        self.history.write().clear();
    }
}

impl ReviewLog for ConsoleLog {
    fn record(&self, message: &str) {
        println!("{message}");
        crate::debug_event!("console", message);
        self.history.write().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_preserves_order() {
        let console = ConsoleLog::new();
        console.record("first");
        console.record("second");

        assert_eq!(console.history(), vec!["first", "second"]);
    }

    #[test]
    fn test_clear_drops_history() {
        let console = ConsoleLog::new();
        console.record("entry");
        console.clear();

        assert!(console.history().is_empty());
    }
}
