//! Text field distance
//!
//! Free-text fields are compared through set similarity over character
//! trigrams or whitespace tokens. Both measures are symmetric and
//! return a distance in [0.0, 1.0].

use ahash::AHashSet;
use pairx_schema::{TextAlgorithm, TypeSchema};

/// Pluggable text distance, constructed once per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStrategy {
    Trigram,
    TokenJaccard,
}

impl TextStrategy {
    pub fn new(algorithm: TextAlgorithm) -> Self {
        match algorithm {
            TextAlgorithm::Trigram => Self::Trigram,
            TextAlgorithm::TokenJaccard => Self::TokenJaccard,
        }
    }

    /// The text strategy a schema document selects.
    pub fn for_schema(schema: &TypeSchema) -> Self {
        Self::new(schema.text_algorithm)
    }

    /// Normalized distance between two text values.
    pub fn distance(&self, first: &str, second: &str) -> f64 {
        let similarity = match self {
            Self::Trigram => trigram_similarity(first, second),
            Self::TokenJaccard => token_jaccard(first, second),
        };
        (1.0 - similarity).clamp(0.0, 1.0)
    }
}

/// Jaccard index over lowercased whitespace tokens.
fn token_jaccard(a: &str, b: &str) -> f64 {
    let tokens_a: AHashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let tokens_b: AHashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Jaccard index over padded character trigrams, for fuzzy matching.
fn trigram_similarity(a: &str, b: &str) -> f64 {
    let trigrams_a = generate_trigrams(&a.to_lowercase());
    let trigrams_b = generate_trigrams(&b.to_lowercase());

    if trigrams_a.is_empty() && trigrams_b.is_empty() {
        return 1.0;
    }
    if trigrams_a.is_empty() || trigrams_b.is_empty() {
        return 0.0;
    }

    let intersection = trigrams_a.intersection(&trigrams_b).count();
    let union = trigrams_a.union(&trigrams_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn generate_trigrams(s: &str) -> AHashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    if chars.len() < 3 {
        return AHashSet::new();
    }
    chars
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}
