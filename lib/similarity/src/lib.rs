//! # PairX Similarity
//!
//! Distance strategies for the PairX engine.
//!
//! Two families live here:
//!
//! - **Schema-driven**: per-field distance functions (categorical
//!   lookup, numeric soft/hard selectors, text) folded into one scaled
//!   similarity integer by a weighted [`Accumulator`]
//! - **Dynamic-attribute**: distance between two entities represented
//!   as attribute token sets ([`DynamicAttrStrategy`]), with cosine and
//!   Jaccard-style measures
//!
//! All per-field distances are in [0.0, 1.0] where 0.0 means identical;
//! accumulator output is an integer in [0, scale].
//!
//! ## Example
//!
//! ```rust
//! use pairx_similarity::Accumulator;
//! use pairx_schema::DistanceAlgorithm;
//!
//! let mut acc = Accumulator::new(DistanceAlgorithm::Manhattan, 1000);
//! acc.accumulate(0.0, 1.0);
//! acc.accumulate(0.5, 2.0);
//! let score = acc.similarity();
//! assert!((0..=1000).contains(&score));
//! ```

pub mod accumulator;
pub mod dynamic;
pub mod field_distance;
pub mod text;

pub use accumulator::Accumulator;
pub use dynamic::{DynamicAlgorithm, DynamicAttrStrategy};
pub use field_distance::{bounds_position_distance, measured_pair, numeric_distance};
pub use text::TextStrategy;
