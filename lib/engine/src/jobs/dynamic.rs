//! Same-type similarity over dynamic attribute sets
//!
//! Records carry an id and a variable set of attribute tokens, e.g. an
//! item followed by the users who bought it. No schema is involved; the
//! dynamic-attribute strategy scores the token sets directly and the
//! output is a scaled similarity (scale = identical attribute sets).

use crate::jobs::{JobOutput, ScoredPair};
use crate::key::{same_type_fanout, PairKey};
use crate::shuffle::run_local;
use pairx_core::{pair_bucket, Counters, JobConfig, Result};
use pairx_similarity::{DynamicAlgorithm, DynamicAttrStrategy};
use std::cell::RefCell;
use tracing::{debug, info};

/// Pairwise similarity job over dynamic-attribute records.
pub struct DynamicSimilarityJob {
    config: JobConfig,
    strategy: DynamicAttrStrategy,
}

impl DynamicSimilarityJob {
    pub fn new(config: JobConfig, algorithm: DynamicAlgorithm) -> Result<Self> {
        config.validate()?;
        let strategy = DynamicAttrStrategy::new(algorithm, true, config.attr_delim.clone());
        Ok(Self { config, strategy })
    }

    /// Compare every unordered pair of records exactly once.
    pub fn run(&self, lines: &[String]) -> Result<JobOutput> {
        let delim = self.config.field_delim.as_str();
        let bucket_count = self.config.bucket_count;
        let multiplier = self.config.hash_pair_multiplier;
        let scale = self.config.distance_scale;

        info!(
            records = lines.len(),
            bucket_count, "running dynamic-attribute similarity"
        );

        let counters = RefCell::new(Counters::new());
        let mut pairs: Vec<ScoredPair> = Vec::new();

        run_local(
            lines.iter().map(String::as_str),
            self.config.num_reducers,
            |line| {
                let Some((id, _)) = line.split_once(delim) else {
                    counters.borrow_mut().increment("mapper", "records_skipped");
                    debug!(line, "record without an id field skipped");
                    return Vec::new();
                };
                same_type_fanout(pair_bucket(id, bucket_count), bucket_count, multiplier, None)
                    .into_iter()
                    .map(|key| (key, line))
                    .collect::<Vec<(PairKey, &str)>>()
            },
            |key, group| {
                let mut counters = counters.borrow_mut();
                if key.is_diagonal(multiplier as u64) {
                    counters.increment("reducer", "same_bucket_groups");
                    let values: Vec<(&str, &str)> = group
                        .iter()
                        .filter_map(|(_, line)| line.split_once(delim))
                        .collect();
                    for i in 0..values.len() {
                        for j in (i + 1)..values.len() {
                            let (first_id, first_attrs) = values[i];
                            let (second_id, second_attrs) = values[j];
                            if first_id == second_id {
                                counters.increment("reducer", "same_id");
                                continue;
                            }
                            pairs.push(self.score(first_id, first_attrs, second_id, second_attrs, scale));
                            counters.increment("reducer", "emitted_pairs");
                        }
                    }
                } else {
                    counters.increment("reducer", "different_bucket_groups");
                    let mut side_zero: Vec<(&str, &str)> = Vec::new();
                    for (key, line) in group {
                        let Some((id, attrs)) = line.split_once(delim) else {
                            continue;
                        };
                        if key.side == 0 {
                            side_zero.push((id, attrs));
                        } else {
                            for (first_id, first_attrs) in &side_zero {
                                pairs.push(self.score(first_id, first_attrs, id, attrs, scale));
                                counters.increment("reducer", "emitted_pairs");
                            }
                        }
                    }
                }
            },
        );

        let counters = counters.into_inner();
        info!(pairs = pairs.len(), "dynamic-attribute similarity complete");
        Ok(JobOutput { pairs, counters })
    }

    fn score(
        &self,
        first_id: &str,
        first_attrs: &str,
        second_id: &str,
        second_attrs: &str,
        scale: i64,
    ) -> ScoredPair {
        let similarity = (1.0 - self.strategy.distance(first_attrs, second_attrs))
            * scale as f64;
        ScoredPair::new(first_id, second_id, (similarity as i64).clamp(0, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bucket_count: u32) -> JobConfig {
        JobConfig {
            bucket_count,
            hash_pair_multiplier: 1000,
            ..JobConfig::default()
        }
    }

    fn lines(records: &[&str]) -> Vec<String> {
        records.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_all_pairs_compared_once() {
        let job = DynamicSimilarityJob::new(config(4), DynamicAlgorithm::Cosine).unwrap();
        let input = lines(&[
            "i1,u1 u2 u3",
            "i2,u1 u2",
            "i3,u4",
            "i4,u1 u4",
            "i5,u2 u3 u5",
        ]);
        let output = job.run(&input).unwrap();

        // 5 records -> 10 unordered pairs
        assert_eq!(output.pairs.len(), 10);
        let unique: std::collections::HashSet<(String, String)> = output
            .pairs
            .iter()
            .map(|p| {
                let (a, b) = (p.first_id.clone(), p.second_id.clone());
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect();
        assert_eq!(unique.len(), 10);
        assert_eq!(output.counters.get("reducer", "emitted_pairs"), 10);
    }

    #[test]
    fn test_identical_attribute_sets_score_full_scale() {
        let job = DynamicSimilarityJob::new(config(2), DynamicAlgorithm::Cosine).unwrap();
        let output = job.run(&lines(&["i1,u1 u2", "i2,u1 u2"])).unwrap();
        assert_eq!(output.pairs.len(), 1);
        assert_eq!(output.pairs[0].score, 1000);
    }

    #[test]
    fn test_disjoint_attribute_sets_score_zero() {
        let job = DynamicSimilarityJob::new(config(2), DynamicAlgorithm::Cosine).unwrap();
        let output = job.run(&lines(&["i1,u1 u2", "i2,u3 u4"])).unwrap();
        assert_eq!(output.pairs[0].score, 0);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let job = DynamicSimilarityJob::new(config(2), DynamicAlgorithm::Cosine).unwrap();
        let output = job
            .run(&lines(&["i1,u1 u2", "no-delimiter-here", "i2,u1"]))
            .unwrap();
        assert_eq!(output.counters.get("mapper", "records_skipped"), 1);
        assert_eq!(output.pairs.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_skipped_in_diagonal() {
        let job = DynamicSimilarityJob::new(config(1), DynamicAlgorithm::Cosine).unwrap();
        let output = job.run(&lines(&["i1,u1", "i1,u1 u2", "i2,u3"])).unwrap();
        assert_eq!(output.counters.get("reducer", "same_id"), 1);
        assert_eq!(output.pairs.len(), 2);
    }

    #[test]
    fn test_jaccard_scores_between_bounds() {
        let job = DynamicSimilarityJob::new(
            config(3),
            DynamicAlgorithm::Jaccard {
                src_non_matching_weight: 1.0,
                trg_non_matching_weight: 1.0,
            },
        )
        .unwrap();
        let output = job.run(&lines(&["i1,u1 u2", "i2,u1 u3"])).unwrap();
        // jaccard 1/3 similarity
        assert_eq!(output.pairs[0].score, 333);
    }
}
