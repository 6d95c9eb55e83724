use std::collections::HashMap;

use growlink_protocol::{Warning, WarningId};

/// Ordered warning store with upsert-by-id.
///
/// A warning whose id is already cached replaces the cached entry in place;
/// anything else is appended. Warnings without an id are always appended.
#[derive(Debug, Clone, Default)]
pub struct WarningCache {
    entries: Vec<Warning>,
    index: HashMap<WarningId, usize>,
}

impl WarningCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a snapshot, entry by entry, with the same rule as [`upsert`](Self::upsert).
    pub fn load(&mut self, snapshot: impl IntoIterator<Item = Warning>) {
        for warning in snapshot {
            self.upsert(warning);
        }
    }

    pub fn upsert(&mut self, warning: Warning) {
        let Some(id) = warning.id.clone() else {
            self.entries.push(warning);
            return;
        };
        match self.index.get(&id) {
            Some(&position) => self.entries[position] = warning,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push(warning);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Warning> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Provider of previously persisted warnings, read once when a client starts.
pub trait WarningSource {
    fn cached_warnings(&self) -> Vec<Warning>;
}

impl WarningSource for Vec<Warning> {
    fn cached_warnings(&self) -> Vec<Warning> {
        self.clone()
    }
}

impl<F> WarningSource for F
where
    F: Fn() -> Vec<Warning>,
{
    fn cached_warnings(&self) -> Vec<Warning> {
        self()
    }
}
