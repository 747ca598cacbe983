//! Similarity job orchestrations
//!
//! Each job wires a fan-out mapper to a reduce-side comparison over the
//! local shuffle runner and produces scored id pairs plus its counters.
//! A job owns its per-worker context (schema, strategies, config) for
//! the whole run; nothing is shared across runs.

pub mod cross_type;
pub mod dynamic;
pub mod same_type;

pub use cross_type::CrossTypeSimilarityJob;
pub use dynamic::DynamicSimilarityJob;
pub use same_type::SameTypeSimilarityJob;

use pairx_core::Counters;

/// One compared pair: `id1 <delim> id2 <delim> score` on output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoredPair {
    pub first_id: String,
    pub second_id: String,
    pub score: i64,
}

impl ScoredPair {
    pub fn new(first_id: &str, second_id: &str, score: i64) -> Self {
        Self {
            first_id: first_id.to_string(),
            second_id: second_id.to_string(),
            score,
        }
    }

    pub fn to_line(&self, delim: &str) -> String {
        format!("{}{}{}{}{}", self.first_id, delim, self.second_id, delim, self.score)
    }
}

/// Result of one job run: the scored pairs and the run's counters.
///
/// Pair order follows group processing order and is not significant;
/// consumers should treat the output as an unordered multiset.
#[derive(Debug)]
pub struct JobOutput {
    pub pairs: Vec<ScoredPair>,
    pub counters: Counters,
}

impl JobOutput {
    /// Render the output records as delimited lines.
    pub fn lines(&self, delim: &str) -> Vec<String> {
        self.pairs.iter().map(|p| p.to_line(delim)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_pair_line() {
        let pair = ScoredPair::new("p1", "p2", 250);
        assert_eq!(pair.to_line(","), "p1,p2,250");
        assert_eq!(pair.to_line("[]"), "p1[]p2[]250");
    }
}
