use std::sync::RwLock;

use crate::snapshot::Snapshot;

/// Single read/write slot for the latest complete snapshot.
///
/// Absent until the first successful fetch, overwritten on each later
/// success, never cleared: a failed fetch leaves the last good value in
/// place, so clients see a stale price rather than none. Constructed once
/// per process and passed by `Arc` into the poll loop and the hub.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: RwLock<Option<Snapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` before the first successful fetch.
    pub fn get(&self) -> Option<Snapshot> {
        self.slot.read().expect("cache lock poisoned").clone()
    }

    /// Unconditional overwrite.
    pub fn set(&self, snapshot: Snapshot) {
        *self.slot.write().expect("cache lock poisoned") = Some(snapshot);
    }
}
