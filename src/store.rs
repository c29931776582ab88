//! Single-slot storage for the most recent dispatched diff.

use parking_lot::RwLock;

/// Holds the text of the most recent diff that cleared authorization.
///
/// Write-only from the watch pipeline's perspective; downstream tooling
/// (test generation) reads it. Unauthorized diffs are never written here.
#[derive(Default)]
pub struct LastDiffStore {
    slot: RwLock<Option<String>>,
}

impl LastDiffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored diff.
    pub fn set(&self, diff: impl Into<String>) {
        *self.slot.write() = Some(diff.into());
    }

    /// The most recent diff, if any cleared authorization yet.
    pub fn get(&self) -> Option<String> {
        self.slot.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_holds_latest_value() {
        let store = LastDiffStore::new();
        assert!(store.get().is_none());

        store.set("diff one");
        store.set("diff two");
        assert_eq!(store.get().as_deref(), Some("diff two"));
    }
}
