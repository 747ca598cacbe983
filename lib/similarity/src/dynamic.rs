//! Dynamic-attribute similarity
//!
//! Entities here carry no fixed schema: each record is the set of
//! attributes active for it, e.g. the users who bought an item or the
//! terms of a document. Distance is computed over the two attribute
//! token sets.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Measure selector for dynamic-attribute distance.
///
/// A closed enum; an unrecognized name fails deserialization before any
/// records are processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "name")]
pub enum DynamicAlgorithm {
    /// Dot product over shared attributes normalized by magnitudes.
    Cosine,
    /// Jaccard-style measure with asymmetric penalties for attributes
    /// present on only one side.
    Jaccard {
        #[serde(default = "default_non_matching_weight")]
        src_non_matching_weight: f64,
        #[serde(default = "default_non_matching_weight")]
        trg_non_matching_weight: f64,
    },
}

fn default_non_matching_weight() -> f64 {
    1.0
}

impl Default for DynamicAlgorithm {
    fn default() -> Self {
        Self::Cosine
    }
}

/// Distance between two dynamic attribute vectors.
///
/// In boolean-vector mode only presence matters; otherwise repeated
/// tokens contribute their counts (cosine only — the Jaccard measure is
/// inherently set-valued).
#[derive(Debug, Clone)]
pub struct DynamicAttrStrategy {
    algorithm: DynamicAlgorithm,
    boolean_vec: bool,
    attr_delim: Option<String>,
}

impl DynamicAttrStrategy {
    pub fn new(algorithm: DynamicAlgorithm, boolean_vec: bool, attr_delim: Option<String>) -> Self {
        Self {
            algorithm,
            boolean_vec,
            attr_delim,
        }
    }

    /// Distance in [0.0, 1.0] between two attribute strings.
    pub fn distance(&self, src: &str, trg: &str) -> f64 {
        let distance = match self.algorithm {
            DynamicAlgorithm::Cosine => {
                if self.boolean_vec {
                    1.0 - self.boolean_cosine(src, trg)
                } else {
                    1.0 - self.counted_cosine(src, trg)
                }
            }
            DynamicAlgorithm::Jaccard {
                src_non_matching_weight,
                trg_non_matching_weight,
            } => 1.0 - self.jaccard(src, trg, src_non_matching_weight, trg_non_matching_weight),
        };
        distance.clamp(0.0, 1.0)
    }

    fn tokens<'a>(&self, value: &'a str) -> Vec<&'a str> {
        match &self.attr_delim {
            Some(delim) => value.split(delim.as_str()).filter(|t| !t.is_empty()).collect(),
            None => value.split_whitespace().collect(),
        }
    }

    fn boolean_cosine(&self, src: &str, trg: &str) -> f64 {
        let src_set: AHashSet<&str> = self.tokens(src).into_iter().collect();
        let trg_set: AHashSet<&str> = self.tokens(trg).into_iter().collect();
        if src_set.is_empty() && trg_set.is_empty() {
            return 1.0;
        }
        if src_set.is_empty() || trg_set.is_empty() {
            return 0.0;
        }
        let shared = src_set.intersection(&trg_set).count() as f64;
        shared / ((src_set.len() as f64).sqrt() * (trg_set.len() as f64).sqrt())
    }

    fn counted_cosine(&self, src: &str, trg: &str) -> f64 {
        let src_counts = count_tokens(self.tokens(src));
        let trg_counts = count_tokens(self.tokens(trg));
        if src_counts.is_empty() && trg_counts.is_empty() {
            return 1.0;
        }
        let dot: f64 = src_counts
            .iter()
            .filter_map(|(token, c)| trg_counts.get(token).map(|t| c * t))
            .sum();
        let src_mag: f64 = src_counts.values().map(|c| c * c).sum::<f64>().sqrt();
        let trg_mag: f64 = trg_counts.values().map(|c| c * c).sum::<f64>().sqrt();
        if src_mag == 0.0 || trg_mag == 0.0 {
            return 0.0;
        }
        dot / (src_mag * trg_mag)
    }

    fn jaccard(&self, src: &str, trg: &str, src_weight: f64, trg_weight: f64) -> f64 {
        let src_set: AHashSet<&str> = self.tokens(src).into_iter().collect();
        let trg_set: AHashSet<&str> = self.tokens(trg).into_iter().collect();
        let matched = src_set.intersection(&trg_set).count() as f64;
        let src_only = src_set.difference(&trg_set).count() as f64;
        let trg_only = trg_set.difference(&src_set).count() as f64;

        let denominator = matched + src_weight * src_only + trg_weight * trg_only;
        if denominator == 0.0 {
            return 1.0;
        }
        matched / denominator
    }
}

fn count_tokens(tokens: Vec<&str>) -> AHashMap<&str, f64> {
    let mut counts = AHashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}
