//! # PairX Engine
//!
//! The bucket-pair sharding engine and the similarity jobs built on it.
//!
//! An all-pairs comparison over N records is O(N^2) and cannot run as a
//! single reduce: one worker would receive the entire cross product.
//! The engine decomposes the workload into B*(B+1)/2 independent groups
//! keyed by unordered bucket pairs:
//!
//! - the **map stage** replicates each record into every bucket-pair
//!   group it belongs to (fan-out degree B),
//! - the **shuffle** routes and groups emissions by the base key,
//!   ignoring the side/type tag,
//! - the **reduce stage** compares pairs locally inside one group.
//!
//! Every unordered pair of distinct records is compared exactly once;
//! the expected group population is N/B, tunable through the bucket
//! count.
//!
//! Three jobs share the protocol:
//!
//! - [`DynamicSimilarityJob`] - same-type, dynamic attribute sets
//! - [`SameTypeSimilarityJob`] - same-type, schema-driven fields
//! - [`CrossTypeSimilarityJob`] - cross-type, field-mapped schemas
//!
//! ## Example
//!
//! ```rust
//! use pairx_core::JobConfig;
//! use pairx_engine::DynamicSimilarityJob;
//! use pairx_similarity::DynamicAlgorithm;
//!
//! let config = JobConfig { bucket_count: 4, ..JobConfig::default() };
//! let job = DynamicSimilarityJob::new(config, DynamicAlgorithm::Cosine).unwrap();
//!
//! let lines: Vec<String> = vec![
//!     "item1,u1 u2 u3".into(),
//!     "item2,u1 u2".into(),
//!     "item3,u9".into(),
//! ];
//! let output = job.run(&lines).unwrap();
//! assert_eq!(output.pairs.len(), 3);
//! ```

pub mod jobs;
pub mod key;
pub mod shuffle;

pub use jobs::{
    CrossTypeSimilarityJob, DynamicSimilarityJob, JobOutput, SameTypeSimilarityJob, ScoredPair,
};
pub use key::{cross_type_fanout, same_type_fanout, CompositeKey, PairKey, ShuffleKey};
pub use shuffle::run_local;
