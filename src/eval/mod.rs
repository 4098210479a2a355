pub mod registry;

use crate::error::{QscoreError, Result};
use crate::model::finding::Finding;
use std::collections::BTreeSet;

/// Aggregates a node's own inputs into that node's raw value. Diagnostics
/// feed their finding set in; measures feed the values of their child
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluator {
    /// Cardinality of the finding set. Default for diagnostics.
    FindingCount,
    /// Sum of finding severities, for rules where impact scales with
    /// severity rather than occurrence count.
    SeveritySum,
    /// Sum of child values. Default for measures.
    ChildSum,
}

impl Evaluator {
    pub fn key(&self) -> &'static str {
        match self {
            Evaluator::FindingCount => "finding_count",
            Evaluator::SeveritySum => "severity_sum",
            Evaluator::ChildSum => "child_sum",
        }
    }

    pub fn evaluate(&self, findings: &BTreeSet<Finding>, child_values: &[f64]) -> f64 {
        match self {
            Evaluator::FindingCount => findings.len() as f64,
            Evaluator::SeveritySum => findings.iter().map(|f| f64::from(f.severity)).sum(),
            Evaluator::ChildSum => child_values.iter().sum(),
        }
    }
}

/// Maps a raw aggregate into a bounded, comparable domain before the value
/// participates in any parent combination.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalizer {
    Identity,
    /// Divides the raw value by a lines-of-code figure injected before
    /// evaluation from the distinguished LOC tool result.
    LinesOfCode { loc: Option<f64> },
    /// Piecewise-linear interpolation of the raw value through the node's
    /// calibrated breakpoints into [0, 1]. Values outside the breakpoint
    /// range clamp to the domain extremes, and the mapping direction follows
    /// the measure's polarity so a higher normalized value always means
    /// better quality.
    Threshold,
}

impl Normalizer {
    pub fn key(&self) -> &'static str {
        match self {
            Normalizer::Identity => "identity",
            Normalizer::LinesOfCode { .. } => "loc",
            Normalizer::Threshold => "threshold",
        }
    }

    pub fn set_lines_of_code(&mut self, value: f64) {
        if let Normalizer::LinesOfCode { loc } = self {
            *loc = Some(value);
        }
    }

    pub fn normalize(&self, raw: f64, thresholds: Option<&[f64]>, positive: bool) -> Result<f64> {
        match self {
            Normalizer::Identity => Ok(raw),
            Normalizer::LinesOfCode { loc } => {
                let loc = loc.ok_or_else(|| {
                    QscoreError::Validation(
                        "lines of code figure was never injected into the normalizer".to_string(),
                    )
                })?;
                Ok(raw / loc)
            }
            Normalizer::Threshold => {
                let breakpoints = thresholds.filter(|t| t.len() >= 2).ok_or_else(|| {
                    QscoreError::Validation(
                        "threshold normalizer requires at least two calibrated breakpoints"
                            .to_string(),
                    )
                })?;
                Ok(interpolate(raw, breakpoints, positive))
            }
        }
    }
}

/// Piecewise-linear utility through ordered breakpoints. Interior
/// breakpoints are evenly spaced in utility, so a three-point calibration
/// maps t1 -> 0, t2 -> 0.5, t3 -> 1 before the polarity flip.
fn interpolate(raw: f64, breakpoints: &[f64], positive: bool) -> f64 {
    let last = breakpoints.len() - 1;
    let utility = if raw <= breakpoints[0] {
        0.0
    } else if raw >= breakpoints[last] {
        1.0
    } else {
        let step = 1.0 / last as f64;
        let mut mapped = 1.0;
        for segment in 0..last {
            let (lo, hi) = (breakpoints[segment], breakpoints[segment + 1]);
            if raw <= hi {
                let fraction = if hi > lo { (raw - lo) / (hi - lo) } else { 1.0 };
                mapped = step * (segment as f64 + fraction);
                break;
            }
        }
        mapped
    };

    if positive {
        utility
    } else {
        1.0 - utility
    }
}

/// Combines already-normalized child values with their weights into the
/// parent's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityFunction {
    /// `sum(weight_i * value_i)`. The default at every composite tier.
    WeightedSum,
}

impl UtilityFunction {
    pub fn key(&self) -> &'static str {
        match self {
            UtilityFunction::WeightedSum => "weighted_sum",
        }
    }

    pub fn combine(&self, weighted_values: &[(f64, f64)]) -> f64 {
        match self {
            UtilityFunction::WeightedSum => weighted_values
                .iter()
                .map(|(weight, value)| weight * value)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding_set(count: u32) -> BTreeSet<Finding> {
        (0..count)
            .map(|i| Finding::new(format!("file/{i}.rs"), i + 1, 1, 2))
            .collect()
    }

    #[test]
    fn finding_count_is_cardinality() {
        let findings = finding_set(3);
        assert_eq!(Evaluator::FindingCount.evaluate(&findings, &[]), 3.0);
    }

    #[test]
    fn severity_sum_adds_severities() {
        let findings = finding_set(3);
        assert_eq!(Evaluator::SeveritySum.evaluate(&findings, &[]), 6.0);
    }

    #[test]
    fn child_sum_adds_child_values() {
        let empty = BTreeSet::new();
        assert_eq!(Evaluator::ChildSum.evaluate(&empty, &[3.0, 3.0]), 6.0);
    }

    #[test]
    fn loc_normalizer_divides_by_injected_figure() {
        let mut normalizer = Normalizer::LinesOfCode { loc: None };
        normalizer.set_lines_of_code(100.0);
        let normalized = normalizer
            .normalize(6.0, None, false)
            .expect("normalization should succeed");
        assert!((normalized - 0.06).abs() < 1e-9);
    }

    #[test]
    fn loc_normalizer_without_injection_is_a_validation_error() {
        let normalizer = Normalizer::LinesOfCode { loc: None };
        let err = normalizer.normalize(6.0, None, false).unwrap_err();
        assert!(matches!(err, QscoreError::Validation(_)));
    }

    #[test]
    fn threshold_normalizer_clamps_outside_breakpoints() {
        let normalizer = Normalizer::Threshold;
        let thresholds = [0.01, 0.02, 0.03];
        // negative polarity: few findings is good
        let low = normalizer
            .normalize(0.005, Some(&thresholds), false)
            .expect("normalize should succeed");
        let high = normalizer
            .normalize(0.05, Some(&thresholds), false)
            .expect("normalize should succeed");
        assert_eq!(low, 1.0);
        assert_eq!(high, 0.0);
    }

    #[test]
    fn threshold_normalizer_interpolates_between_breakpoints() {
        let normalizer = Normalizer::Threshold;
        let thresholds = [0.0, 0.5, 1.0];
        let mid = normalizer
            .normalize(0.5, Some(&thresholds), false)
            .expect("normalize should succeed");
        assert!((mid - 0.5).abs() < 1e-9);
        let quarter = normalizer
            .normalize(0.25, Some(&thresholds), false)
            .expect("normalize should succeed");
        assert!((quarter - 0.75).abs() < 1e-9);
    }

    #[test]
    fn threshold_normalizer_flips_for_positive_polarity() {
        let normalizer = Normalizer::Threshold;
        let thresholds = [0.0, 0.5, 1.0];
        // positive polarity: a high raw value (e.g. coverage) is good
        let high = normalizer
            .normalize(0.9, Some(&thresholds), true)
            .expect("normalize should succeed");
        assert!(high > 0.5);
    }

    #[test]
    fn threshold_normalizer_without_breakpoints_is_a_validation_error() {
        let err = Normalizer::Threshold.normalize(0.5, None, false).unwrap_err();
        assert!(matches!(err, QscoreError::Validation(_)));
    }

    #[test]
    fn weighted_sum_combines_weights_and_values() {
        let combined = UtilityFunction::WeightedSum.combine(&[(0.5, 0.8), (0.5, 0.4)]);
        assert!((combined - 0.6).abs() < 1e-9);
    }
}
