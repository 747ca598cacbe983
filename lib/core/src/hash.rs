//! Stable bucket hashing
//!
//! Bucket assignment must agree across every map task in a job, so the
//! hasher is seeded with fixed keys instead of the per-process random
//! state `ahash` defaults to.

use ahash::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Hash a value identically in every worker of a job.
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let state = RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]);
    let mut hasher = state.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Plain bucket index in [0, bucket_count), used by cross-type fan-out.
pub fn bucket_of(id: &str, bucket_count: u32) -> u32 {
    let m = (stable_hash(id) as i64) % bucket_count as i64;
    ((m + bucket_count as i64) % bucket_count as i64) as u32
}

/// Folded bucket index for same-type fan-out.
///
/// The signed remainder is shifted and halved so the result lands in
/// [0, bucket_count) biased toward the lower half, which keeps the
/// upper-triangular (major >= minor) fan-out well formed.
pub fn pair_bucket(id: &str, bucket_count: u32) -> u32 {
    let m = (stable_hash(id) as i64) % bucket_count as i64;
    ((m + bucket_count as i64) / 2) as u32
}
