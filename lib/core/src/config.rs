//! Job configuration
//!
//! All knobs have defaults; a missing key never fails a job. The config
//! is fixed for the whole job and shared read-only by every worker.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by all similarity jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobConfig {
    /// Number of hash buckets the record population is split into.
    /// Shuffle volume grows as O(N * bucket_count) while the expected
    /// reduce-group population shrinks as N / bucket_count.
    pub bucket_count: u32,

    /// Delimiter between record fields.
    pub field_delim: String,

    /// Delimiter between attribute tokens inside one field; `None`
    /// splits on whitespace.
    pub attr_delim: Option<String>,

    /// Multiplier packing a (major, minor) bucket pair into one integer.
    /// Must be larger than `bucket_count` or distinct pairs collide.
    pub hash_pair_multiplier: u32,

    /// Scale of the integer similarity output: scores land in [0, scale].
    pub distance_scale: i64,

    /// Reduce-side parallelism of the shuffle.
    pub num_reducers: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            bucket_count: 1000,
            field_delim: ",".to_string(),
            attr_delim: None,
            hash_pair_multiplier: 1000,
            distance_scale: 1000,
            num_reducers: 1,
        }
    }
}

impl JobConfig {
    /// Check the invariants the sharding arithmetic relies on.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(Error::InvalidConfig("bucket_count must be positive".into()));
        }
        if self.hash_pair_multiplier < self.bucket_count {
            return Err(Error::InvalidConfig(format!(
                "hash_pair_multiplier {} must be >= bucket_count {}",
                self.hash_pair_multiplier, self.bucket_count
            )));
        }
        if self.distance_scale <= 0 {
            return Err(Error::InvalidConfig("distance_scale must be positive".into()));
        }
        if self.num_reducers == 0 {
            return Err(Error::InvalidConfig("num_reducers must be positive".into()));
        }
        if self.field_delim.is_empty() {
            return Err(Error::InvalidConfig("field_delim must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = JobConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bucket_count, 1000);
        assert_eq!(config.distance_scale, 1000);
    }

    #[test]
    fn test_multiplier_below_bucket_count_rejected() {
        let config = JobConfig {
            bucket_count: 2000,
            hash_pair_multiplier: 1000,
            ..JobConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_bucket_count_rejected() {
        let config = JobConfig {
            bucket_count: 0,
            ..JobConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: JobConfig = serde_json::from_str("{\"bucket_count\": 4}").unwrap();
        assert_eq!(config.bucket_count, 4);
        assert_eq!(config.field_delim, ",");
        assert_eq!(config.num_reducers, 1);
    }
}
