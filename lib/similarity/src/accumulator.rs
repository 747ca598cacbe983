//! Weighted distance accumulators
//!
//! An accumulator folds one (distance, weight) observation per
//! contributing field into a single scaled similarity integer. Weights
//! soften the quadratic term of the blend: the effective distance is
//! `(1/w)*d + (1 - 1/w)*d^2`, which for w >= 1 stays within [0, 1]
//! whenever d does. Schema validation guarantees w >= 1.

use pairx_schema::DistanceAlgorithm;

/// A weighted distance accumulator with a closed set of variants.
///
/// Constructed once per worker from the schema's algorithm selector and
/// reset between comparisons.
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Linear blend: mean of effective distances.
    LinearBlend { scale: i64, sum: f64, count: u32 },
    /// Power blend: Minkowski-style mean with exponent `power`.
    PowerBlend {
        scale: i64,
        power: f64,
        sum: f64,
        count: u32,
    },
}

impl Accumulator {
    pub fn new(algorithm: DistanceAlgorithm, scale: i64) -> Self {
        match algorithm {
            DistanceAlgorithm::Manhattan => Self::LinearBlend {
                scale,
                sum: 0.0,
                count: 0,
            },
            DistanceAlgorithm::Minkowski { power } => Self::PowerBlend {
                scale,
                power,
                sum: 0.0,
                count: 0,
            },
        }
    }

    /// Clear accumulated state before the next comparison.
    pub fn reset(&mut self) {
        match self {
            Self::LinearBlend { sum, count, .. } | Self::PowerBlend { sum, count, .. } => {
                *sum = 0.0;
                *count = 0;
            }
        }
    }

    /// Fold in one field observation.
    pub fn accumulate(&mut self, distance: f64, weight: f64) {
        let d = distance.abs();
        let effective = (1.0 / weight) * d + (1.0 - 1.0 / weight) * d * d;
        match self {
            Self::LinearBlend { sum, count, .. } => {
                *sum += effective;
                *count += 1;
            }
            Self::PowerBlend {
                sum, count, power, ..
            } => {
                *sum += effective.powf(*power);
                *count += 1;
            }
        }
    }

    /// Scaled similarity in [0, scale]; 0 = identical.
    ///
    /// With no observations there is no evidence the pair is similar,
    /// so the result is maximal distance rather than a division fault.
    pub fn similarity(&self) -> i64 {
        let (scale, raw) = match *self {
            Self::LinearBlend { scale, sum, count } => {
                if count == 0 {
                    return scale;
                }
                (scale, sum / count as f64)
            }
            Self::PowerBlend {
                scale,
                power,
                sum,
                count,
            } => {
                if count == 0 {
                    return scale;
                }
                (scale, (sum / count as f64).powf(1.0 / power))
            }
        };
        ((raw * scale as f64) as i64).clamp(0, scale)
    }
}
