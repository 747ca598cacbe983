//! Bucket-pair key encoding
//!
//! The sharding protocol decomposes an all-pairs comparison over N
//! records into B*(B+1)/2 independent groups. Keys pack an unordered
//! bucket pair (major >= minor) plus a routing tag; the partitioner and
//! the grouping rule look only at the base part of the key, while the
//! full key ordering places side-0 values ahead of side-1 values inside
//! a group.

use pairx_core::stable_hash;

/// Routing contract every shuffle key satisfies.
///
/// `Ord` on the full key fixes the value order inside a group;
/// `group_eq` ignores the side/type tag so one reduce invocation sees
/// all sides together; `partition` sends every emission of a bucket
/// pair to the same worker.
pub trait ShuffleKey: Ord {
    fn group_eq(&self, other: &Self) -> bool;
    fn partition(&self, num_partitions: usize) -> usize;
}

/// Key of one same-type bucket-pair emission.
///
/// `pair` packs `major * multiplier + minor`; `side` is 0 when the
/// record plays the larger-bucket role for this pair. The optional
/// partition value confines comparisons to records sharing a
/// partitioning-column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub partition: Option<String>,
    pub pair: u64,
    pub side: u8,
}

impl PairKey {
    pub fn major(&self, multiplier: u64) -> u64 {
        self.pair / multiplier
    }

    pub fn minor(&self, multiplier: u64) -> u64 {
        self.pair % multiplier
    }

    /// Diagonal groups hold one bucket's records; off-diagonal groups
    /// hold two buckets' records split by side.
    pub fn is_diagonal(&self, multiplier: u64) -> bool {
        self.major(multiplier) == self.minor(multiplier)
    }
}

impl ShuffleKey for PairKey {
    fn group_eq(&self, other: &Self) -> bool {
        self.partition == other.partition && self.pair == other.pair
    }

    fn partition(&self, num_partitions: usize) -> usize {
        let base = (self.partition.as_deref(), self.pair);
        (stable_hash(&base) % num_partitions as u64) as usize
    }
}

/// Key of one cross-type emission: composite slot * 10 + entity type.
///
/// The low-order tag keeps source and target fan-outs from colliding
/// while integer division recovers the slot for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub u64);

const TYPE_TAG_SCALE: u64 = 10;

impl CompositeKey {
    pub fn source(slot: u64) -> Self {
        Self(slot * TYPE_TAG_SCALE)
    }

    pub fn target(slot: u64) -> Self {
        Self(slot * TYPE_TAG_SCALE + 1)
    }

    pub fn slot(&self) -> u64 {
        self.0 / TYPE_TAG_SCALE
    }

    pub fn is_source(&self) -> bool {
        self.0 % TYPE_TAG_SCALE == 0
    }
}

impl ShuffleKey for CompositeKey {
    fn group_eq(&self, other: &Self) -> bool {
        self.slot() == other.slot()
    }

    fn partition(&self, num_partitions: usize) -> usize {
        (self.slot() % num_partitions as u64) as usize
    }
}

/// Same-type fan-out: the B keys one record is replicated into.
///
/// Across the emissions the record appears once in its diagonal group
/// (h, h) and once in every off-diagonal group (max(h,i), min(h,i)),
/// side-tagged by which bucket of the pair it hashed to.
pub fn same_type_fanout(
    bucket: u32,
    bucket_count: u32,
    multiplier: u32,
    partition: Option<&str>,
) -> Vec<PairKey> {
    let h = bucket as u64;
    let multiplier = multiplier as u64;
    (0..bucket_count as u64)
        .map(|i| {
            let (pair, side) = if i < h {
                (h * multiplier + i, 0)
            } else {
                (i * multiplier + h, 1)
            };
            PairKey {
                partition: partition.map(str::to_string),
                pair,
                side,
            }
        })
        .collect()
}

/// Cross-type fan-out: the B composite keys one record is replicated
/// into, tagged by its entity type.
///
/// A source record at hash h covers slots h*B..h*B+B-1; a target record
/// at hash h covers slots i*B+h for all i. Slot k therefore joins every
/// source hashing to k/B with every target hashing to k%B.
pub fn cross_type_fanout(bucket: u32, bucket_count: u32, entity_type: u8) -> Vec<CompositeKey> {
    let h = bucket as u64;
    let b = bucket_count as u64;
    (0..b)
        .map(|i| {
            if entity_type == 0 {
                CompositeKey::source(h * b + i)
            } else {
                CompositeKey::target(i * b + h)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_type_fanout_degree() {
        let keys = same_type_fanout(2, 4, 1000, None);
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_same_type_covers_all_pairs_once() {
        // Scenario: B=4, records hashing to buckets {0, 0, 1, 2, 2, 3}
        let buckets = [0u32, 0, 1, 2, 2, 3];
        let b = 4;
        let mult = 1000;

        // (record index, group) memberships
        let mut memberships: Vec<(usize, u64)> = Vec::new();
        for (idx, &bucket) in buckets.iter().enumerate() {
            for key in same_type_fanout(bucket, b, mult, None) {
                memberships.push((idx, key.pair));
            }
        }

        // every unordered record pair shares exactly one group
        for i in 0..buckets.len() {
            for j in (i + 1)..buckets.len() {
                let groups_i: HashSet<u64> = memberships
                    .iter()
                    .filter(|(idx, _)| *idx == i)
                    .map(|(_, g)| *g)
                    .collect();
                let shared: Vec<u64> = memberships
                    .iter()
                    .filter(|(idx, g)| *idx == j && groups_i.contains(g))
                    .map(|(_, g)| *g)
                    .collect();
                assert_eq!(shared.len(), 1, "records {} and {} share {:?}", i, j, shared);
            }
        }

        // records hashing together land in the diagonal group
        let diagonal: Vec<u64> = memberships
            .iter()
            .filter(|(idx, _)| buckets[*idx] == 0)
            .map(|(_, g)| *g)
            .filter(|g| g / mult as u64 == g % mult as u64)
            .collect();
        assert_eq!(diagonal, vec![0, 0]);
    }

    #[test]
    fn test_same_type_sides() {
        // h=2 plays side 0 against lower buckets, side 1 otherwise
        for key in same_type_fanout(2, 4, 1000, None) {
            if key.minor(1000) < 2 && key.major(1000) == 2 {
                assert_eq!(key.side, 0);
            } else {
                assert_eq!(key.side, 1);
            }
            assert!(key.major(1000) >= key.minor(1000));
        }
    }

    #[test]
    fn test_pair_key_grouping_ignores_side() {
        let a = PairKey { partition: None, pair: 2001, side: 0 };
        let b = PairKey { partition: None, pair: 2001, side: 1 };
        assert!(a.group_eq(&b));
        assert!(a < b, "side 0 sorts before side 1");
        assert_eq!(a.partition(7), b.partition(7));
    }

    #[test]
    fn test_pair_key_partition_value_separates_groups() {
        let a = PairKey { partition: Some("east".into()), pair: 2001, side: 0 };
        let b = PairKey { partition: Some("west".into()), pair: 2001, side: 0 };
        assert!(!a.group_eq(&b));
    }

    #[test]
    fn test_cross_type_composite_slot() {
        // Scenario: source bucket 2 and target bucket 2 with B=5 meet in slot 12
        let source_keys = cross_type_fanout(2, 5, 0);
        let target_keys = cross_type_fanout(2, 5, 1);
        assert!(source_keys.iter().any(|k| k.slot() == 12 && k.is_source()));
        assert!(target_keys.iter().any(|k| k.slot() == 12 && !k.is_source()));
        // tagged keys never collide
        let sources: HashSet<u64> = source_keys.iter().map(|k| k.0).collect();
        assert!(target_keys.iter().all(|k| !sources.contains(&k.0)));
    }

    #[test]
    fn test_cross_type_full_coverage() {
        // every (source bucket, target bucket) combination shares a slot
        let b = 5;
        for src_bucket in 0..b {
            for trg_bucket in 0..b {
                let src_slots: HashSet<u64> = cross_type_fanout(src_bucket, b, 0)
                    .iter()
                    .map(|k| k.slot())
                    .collect();
                let shared = cross_type_fanout(trg_bucket, b, 1)
                    .iter()
                    .filter(|k| src_slots.contains(&k.slot()))
                    .count();
                assert_eq!(shared, 1, "buckets ({}, {})", src_bucket, trg_bucket);
            }
        }
    }

    #[test]
    fn test_composite_key_ordering_sources_first() {
        let source = CompositeKey::source(12);
        let target = CompositeKey::target(12);
        assert!(source.group_eq(&target));
        assert!(source < target);
        assert_eq!(source.partition(3), target.partition(3));
    }
}
