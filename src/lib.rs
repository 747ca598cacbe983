//! # PairX
//!
//! A schema-driven pairwise similarity engine with bucket-pair sharding.
//!
//! PairX computes similarity/distance scores across large entity
//! collections - same-type (item vs item) and cross-type (e.g. product
//! vs customer segment) - for use in recommendation pipelines. The core
//! idea is to shard the O(N^2) all-pairs comparison into B*(B+1)/2
//! bounded, independent bucket-pair groups so no single worker ever
//! sees the full cross product.
//!
//! ## Quick Start
//!
//! ```rust
//! use pairx::prelude::*;
//!
//! let config = JobConfig { bucket_count: 8, ..JobConfig::default() };
//! let job = DynamicSimilarityJob::new(config, DynamicAlgorithm::Cosine).unwrap();
//!
//! let lines: Vec<String> = vec![
//!     "item1,u1 u2 u3".into(),
//!     "item2,u1 u2".into(),
//! ];
//! let output = job.run(&lines).unwrap();
//! for line in output.lines(",") {
//!     println!("{}", line);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! PairX is composed of several crates:
//!
//! - [`pairx-core`](https://docs.rs/pairx-core) - Records, configuration, hashing, counters
//! - [`pairx-schema`](https://docs.rs/pairx-schema) - Entity/field schemas and mappings
//! - [`pairx-similarity`](https://docs.rs/pairx-similarity) - Distance strategies and accumulators
//! - [`pairx-engine`](https://docs.rs/pairx-engine) - Bucket-pair sharding and the similarity jobs
//!
//! ## Features
//!
//! - **Bucket-pair sharding**: exactly-once pair coverage with bounded
//!   reduce groups
//! - **Declarative schemas**: per-field types, weights, distance
//!   selectors, bounds, units, and cross-type value mappings
//! - **Weighted accumulators**: linear-blend and Minkowski-style
//!   power-blend scoring
//! - **Dynamic attributes**: cosine and Jaccard measures over variable
//!   attribute sets

// Re-export core types
pub use pairx_core::{bucket_of, pair_bucket, Counters, Error, JobConfig, Record, Result};

// Re-export schema types
pub use pairx_schema::{
    DataType, DistanceAlgorithm, Entity, Field, FieldMapping, MissingValuePolicy,
    NumericSelector, SchemaError, TextAlgorithm, TypeSchema,
};

// Re-export similarity strategies
pub use pairx_similarity::{Accumulator, DynamicAlgorithm, DynamicAttrStrategy, TextStrategy};

// Re-export the engine
pub use pairx_engine::{
    CrossTypeSimilarityJob, DynamicSimilarityJob, JobOutput, SameTypeSimilarityJob, ScoredPair,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Accumulator, Counters, CrossTypeSimilarityJob, DistanceAlgorithm, DynamicAlgorithm,
        DynamicAttrStrategy, DynamicSimilarityJob, Error, JobConfig, JobOutput, Record, Result,
        SameTypeSimilarityJob, ScoredPair, TextStrategy, TypeSchema,
    };
}
