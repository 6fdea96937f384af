//! Mind-change tracking between consecutive decision passes.
//!
//! A mind change is a fact whose decision differs from the one recorded at
//! the end of the previous decision pass. Facts absent from the previous
//! snapshot are not counted. The snapshot is replaced wholesale, never merged.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::fact::Fact;

/// Owns the most recent fact → decision snapshot.
#[derive(Debug)]
pub struct MindChangeTracker<V> {
    snapshot: RwLock<Option<HashMap<Fact<V>, bool>>>,
}

impl<V> Default for MindChangeTracker<V> {
    fn default() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }
}

impl<V: Eq + Hash> MindChangeTracker<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count decisions in `current` that flipped relative to the stored
    /// snapshot, then install `current` as the new snapshot.
    pub fn count_and_replace(&self, current: HashMap<Fact<V>, bool>) -> usize {
        let mut snapshot = self.snapshot.write();

        let changes = match snapshot.as_ref() {
            None => 0,
            Some(previous) => current
                .iter()
                .filter(|(fact, decision)| {
                    previous
                        .get(*fact)
                        .is_some_and(|before| before != *decision)
                })
                .count(),
        };

        *snapshot = Some(current);
        changes
    }

    /// Drop the snapshot; the next pass only re-establishes a baseline.
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Number of facts in the current snapshot (0 when absent).
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.read().as_ref().map_or(0, HashMap::len)
    }
}
