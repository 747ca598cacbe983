//! # PairX Core
//!
//! Core library for the PairX similarity engine.
//!
//! This crate provides the pieces every PairX job builds on:
//!
//! - [`Record`] - A delimited input line with ordinal field access
//! - [`JobConfig`] - Immutable per-job configuration with defaults
//! - [`Counters`] - Grouped observability counters
//! - Stable hashing for bucket assignment ([`bucket_of`], [`pair_bucket`])
//!
//! ## Example
//!
//! ```rust
//! use pairx_core::{JobConfig, Record, pair_bucket};
//!
//! let config = JobConfig::default();
//! let record = Record::parse("i42,red,2 kg,cotton shirt", &config.field_delim);
//! assert_eq!(record.field(1), Some("red"));
//!
//! // Bucket assignment is stable across workers
//! let id = record.field(0).unwrap();
//! let bucket = pair_bucket(id, config.bucket_count);
//! assert!(bucket < config.bucket_count);
//! ```

pub mod config;
pub mod counters;
pub mod error;
pub mod hash;
pub mod record;

pub use config::JobConfig;
pub use counters::Counters;
pub use error::{Error, Result};
pub use hash::{bucket_of, pair_bucket, stable_hash};
pub use record::Record;
