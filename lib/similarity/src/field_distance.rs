//! Per-field numeric distance functions
//!
//! All functions return a distance in [0.0, 1.0] where 0.0 means the
//! values are equivalent under the field's selector.

use pairx_schema::NumericSelector;

/// Distance between a source and target numeric value.
///
/// Hard selectors are binary. Soft selectors produce a linear distance
/// normalized by the field bounds; without distinct bounds the relative
/// difference is compared against `threshold` and the result is binary.
/// The one-sided soft selectors short-circuit to 0 when the target
/// already satisfies the condition.
pub fn numeric_distance(
    selector: NumericSelector,
    src: f64,
    trg: f64,
    bounds: Option<(f64, f64)>,
    threshold: f64,
) -> f64 {
    let linear = match selector {
        NumericSelector::EqualHard => return if src == trg { 0.0 } else { 1.0 },
        NumericSelector::MinHard => return if trg >= src { 0.0 } else { 1.0 },
        NumericSelector::MaxHard => return if trg <= src { 0.0 } else { 1.0 },
        NumericSelector::EqualSoft => true,
        NumericSelector::MinSoft => trg < src,
        NumericSelector::MaxSoft => trg > src,
    };
    if !linear {
        return 0.0;
    }

    match bounds {
        Some((min, max)) => ((src - trg).abs() / (max - min)).min(1.0),
        None => {
            let magnitude = src.abs().max(trg.abs());
            if magnitude == 0.0 {
                return 0.0;
            }
            let relative = (src - trg).abs() / magnitude;
            if relative > threshold {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Distance synthesized for a missing value: how far the known value
/// sits from the nearer end of its bounds, i.e. the worst-case distance
/// to an arbitrary counterpart. Degenerate bounds give maximal distance.
pub fn bounds_position_distance(bounds: Option<(f64, f64)>, value: f64) -> f64 {
    match bounds {
        Some((min, max)) => {
            let span = max - min;
            let upper = (max - value) / span;
            let lower = (value - min) / span;
            upper.max(lower).clamp(0.0, 1.0)
        }
        None => 1.0,
    }
}

/// Validate a pair of raw numeric values against the field's unit.
///
/// A value is either a bare number ("5") or a number with a unit token
/// ("5 kg"). Both sides must agree: two bare numbers, or two measured
/// values whose unit token matches the field's declared unit. Returns
/// the numeric tokens, or `None` when the pair is invalid and the field
/// must be excluded from this comparison.
pub fn measured_pair<'a>(
    first: &'a str,
    second: &'a str,
    unit: Option<&str>,
) -> Option<(&'a str, &'a str)> {
    let first_tokens: Vec<&str> = first.split_whitespace().collect();
    let second_tokens: Vec<&str> = second.split_whitespace().collect();
    match (first_tokens.as_slice(), second_tokens.as_slice()) {
        ([a], [b]) => Some((a, b)),
        ([a, a_unit], [b, b_unit]) => {
            let unit = unit?;
            (*a_unit == unit && *b_unit == unit).then_some((*a, *b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairx_schema::NumericSelector::*;

    #[test]
    fn test_equal_hard() {
        assert_eq!(numeric_distance(EqualHard, 5.0, 5.0, None, 0.5), 0.0);
        assert_eq!(numeric_distance(EqualHard, 5.0, 7.0, None, 0.5), 1.0);
    }

    #[test]
    fn test_one_sided_hard() {
        assert_eq!(numeric_distance(MinHard, 5.0, 7.0, None, 0.5), 0.0);
        assert_eq!(numeric_distance(MinHard, 5.0, 3.0, None, 0.5), 1.0);
        assert_eq!(numeric_distance(MaxHard, 5.0, 3.0, None, 0.5), 0.0);
        assert_eq!(numeric_distance(MaxHard, 5.0, 7.0, None, 0.5), 1.0);
    }

    #[test]
    fn test_equal_soft_with_bounds() {
        let bounds = Some((0.0, 10.0));
        assert_eq!(numeric_distance(EqualSoft, 3.0, 7.0, bounds, 0.5), 0.4);
        assert_eq!(numeric_distance(EqualSoft, 7.0, 3.0, bounds, 0.5), 0.4);
        // out-of-bounds values clamp rather than exceed 1
        assert_eq!(numeric_distance(EqualSoft, 0.0, 25.0, bounds, 0.5), 1.0);
    }

    #[test]
    fn test_soft_short_circuit() {
        let bounds = Some((0.0, 10.0));
        assert_eq!(numeric_distance(MinSoft, 5.0, 7.0, bounds, 0.5), 0.0);
        assert_eq!(numeric_distance(MinSoft, 5.0, 3.0, bounds, 0.5), 0.2);
        assert_eq!(numeric_distance(MaxSoft, 5.0, 3.0, bounds, 0.5), 0.0);
        assert_eq!(numeric_distance(MaxSoft, 5.0, 7.0, bounds, 0.5), 0.2);
    }

    #[test]
    fn test_threshold_fallback_without_bounds() {
        // relative difference 2/10 = 0.2 under threshold
        assert_eq!(numeric_distance(EqualSoft, 10.0, 8.0, None, 0.5), 0.0);
        // relative difference 6/10 over threshold
        assert_eq!(numeric_distance(EqualSoft, 10.0, 4.0, None, 0.5), 1.0);
        // both zero
        assert_eq!(numeric_distance(EqualSoft, 0.0, 0.0, None, 0.5), 0.0);
    }

    #[test]
    fn test_bounds_position_distance() {
        // value 3 in [0, 10]: upper 0.7, lower 0.3
        assert_eq!(bounds_position_distance(Some((0.0, 10.0)), 3.0), 0.7);
        assert_eq!(bounds_position_distance(Some((0.0, 10.0)), 5.0), 0.5);
        assert_eq!(bounds_position_distance(None, 3.0), 1.0);
    }

    #[test]
    fn test_measured_pair() {
        assert_eq!(measured_pair("5", "7", None), Some(("5", "7")));
        assert_eq!(measured_pair("5 kg", "7 kg", Some("kg")), Some(("5", "7")));
        // unit mismatch
        assert_eq!(measured_pair("5 kg", "7 lb", Some("kg")), None);
        // mixed arity
        assert_eq!(measured_pair("5", "7 kg", Some("kg")), None);
        // measured values without a declared unit
        assert_eq!(measured_pair("5 kg", "7 kg", None), None);
    }

    #[test]
    fn test_symmetry() {
        for selector in [EqualSoft, EqualHard] {
            for bounds in [None, Some((0.0, 20.0))] {
                let d1 = numeric_distance(selector, 4.0, 9.0, bounds, 0.5);
                let d2 = numeric_distance(selector, 9.0, 4.0, bounds, 0.5);
                assert_eq!(d1, d2, "{:?} {:?}", selector, bounds);
            }
        }
    }
}
