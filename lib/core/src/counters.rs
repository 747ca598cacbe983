//! Observability counters
//!
//! Per-record and per-field anomalies are absorbed, never fatal; counters
//! are the only place they surface. Names are grouped the way a batch
//! framework groups task counters.

use ahash::AHashMap;
use tracing::info;

/// Grouped event counters owned by one job run.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    counts: AHashMap<(String, String), u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, group: &str, name: &str) {
        self.add(group, name, 1);
    }

    pub fn add(&mut self, group: &str, name: &str, delta: u64) {
        *self
            .counts
            .entry((group.to_string(), name.to_string()))
            .or_insert(0) += delta;
    }

    pub fn get(&self, group: &str, name: &str) -> u64 {
        self.counts
            .get(&(group.to_string(), name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fold another counter set into this one, e.g. when merging the
    /// map-side and reduce-side counters of a run.
    pub fn merge(&mut self, other: &Counters) {
        for ((group, name), count) in &other.counts {
            self.add(group, name, *count);
        }
    }

    /// Counters in deterministic order for reporting and assertions.
    pub fn snapshot(&self) -> Vec<(String, String, u64)> {
        let mut entries: Vec<_> = self
            .counts
            .iter()
            .map(|((g, n), c)| (g.clone(), n.clone(), *c))
            .collect();
        entries.sort();
        entries
    }

    /// Log every counter at info level.
    pub fn report(&self) {
        for (group, name, count) in self.snapshot() {
            info!(group = group.as_str(), name = name.as_str(), count, "job counter");
        }
    }
}
