//! Local shuffle runner
//!
//! A single-process rendition of the map/shuffle/reduce contract the
//! sharding keys are written against: map emissions are partitioned by
//! the key's partition function, sorted by the full key (stable on
//! emission order), grouped by `group_eq`, and handed to the reducer
//! one complete group at a time. A reduce invocation always sees the
//! whole group, with side-0 values ahead of side-1 values.

use crate::key::ShuffleKey;
use tracing::debug;

/// Run one map/shuffle/reduce pass over the input lines.
///
/// `map` turns a line into its fan-out emissions (empty for skipped
/// records); `reduce` is invoked once per bucket-pair group with the
/// group's representative key and every (key, value) pair in sorted
/// order. Output is whatever the reducer accumulates through its
/// captured state.
pub fn run_local<'a, K, V, M, R>(
    lines: impl IntoIterator<Item = &'a str>,
    num_partitions: usize,
    mut map: M,
    mut reduce: R,
) where
    K: ShuffleKey,
    M: FnMut(&'a str) -> Vec<(K, V)>,
    R: FnMut(&K, &[(K, V)]),
{
    let mut partitions: Vec<Vec<(usize, K, V)>> =
        (0..num_partitions).map(|_| Vec::new()).collect();

    let mut seq = 0usize;
    for line in lines {
        for (key, value) in map(line) {
            let partition = key.partition(num_partitions);
            partitions[partition].push((seq, key, value));
            seq += 1;
        }
    }
    debug!(emissions = seq, partitions = num_partitions, "map stage complete");

    for partition in partitions {
        let mut entries: Vec<(usize, K, V)> = partition;
        entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let entries: Vec<(K, V)> = entries.into_iter().map(|(_, k, v)| (k, v)).collect();

        let mut start = 0;
        while start < entries.len() {
            let mut end = start + 1;
            while end < entries.len() && entries[end].0.group_eq(&entries[start].0) {
                end += 1;
            }
            reduce(&entries[start].0, &entries[start..end]);
            start = end;
        }
    }
}
