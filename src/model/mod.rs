#[cfg(test)]
pub mod builder;
pub mod export;
pub mod finding;
pub mod import;
pub mod quality_model;

use crate::calibrate::Weighter;
use crate::error::{QscoreError, Result};
use crate::eval::{Evaluator, Normalizer, UtilityFunction};
use finding::Finding;
use std::collections::{BTreeMap, BTreeSet};

/// Tier of a node within the quality-model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Tqi,
    QualityAspect,
    ProductFactor,
    Measure,
    Diagnostic,
}

impl NodeKind {
    /// Composite tiers combine typed children through weights and a utility
    /// function; measures and diagnostics do not.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            NodeKind::Tqi | NodeKind::QualityAspect | NodeKind::ProductFactor
        )
    }
}

/// One node of the quality-model tree. All tiers share this shape; the kind
/// decides which parts participate in evaluation. The tree is strictly
/// hierarchical: children are owned, never shared across branches.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub kind: NodeKind,
    pub name: String,
    pub description: String,
    /// Cached result of the most recent `evaluate` call.
    pub value: f64,
    /// Child name to weight. Keys are always a subset of `children` keys;
    /// completeness is a precondition checked before evaluation.
    pub weights: BTreeMap<String, f64>,
    /// Ordered breakpoints filled in by calibration. Measures only.
    pub thresholds: Option<Vec<f64>>,
    pub children: BTreeMap<String, ModelNode>,
    /// Raw tool observations. Diagnostics only.
    pub findings: BTreeSet<Finding>,
    /// Name of the tool expected to feed this node. Diagnostics only.
    pub tool_name: Option<String>,
    /// Polarity: does a higher raw value mean better quality? Measures only.
    pub positive: bool,
    pub evaluator: Evaluator,
    pub normalizer: Normalizer,
    pub utility_function: UtilityFunction,
}

impl ModelNode {
    pub fn new(kind: NodeKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        let (evaluator, normalizer) = match kind {
            NodeKind::Diagnostic => (Evaluator::FindingCount, Normalizer::Identity),
            NodeKind::Measure => (Evaluator::ChildSum, Normalizer::LinesOfCode { loc: None }),
            _ => (Evaluator::ChildSum, Normalizer::Identity),
        };

        Self {
            kind,
            name: name.into(),
            description: description.into(),
            value: 0.0,
            weights: BTreeMap::new(),
            thresholds: None,
            children: BTreeMap::new(),
            findings: BTreeSet::new(),
            tool_name: None,
            positive: false,
            evaluator,
            normalizer,
            utility_function: UtilityFunction::WeightedSum,
        }
    }

    pub fn set_child(&mut self, child: ModelNode) {
        self.children.insert(child.name.clone(), child);
    }

    pub fn set_weight(&mut self, child_name: impl Into<String>, weight: f64) {
        self.weights.insert(child_name.into(), weight);
    }

    /// Post-order evaluation of the subtree rooted at this node. Children
    /// are evaluated first; this node's value is then derived per tier:
    /// diagnostics run their evaluator over the finding set, measures
    /// normalize the aggregate of their diagnostics, and composite tiers
    /// combine child values through the utility function and weight map.
    ///
    /// Pure over the subtree's current state: repeated calls without finding
    /// mutations return identical values. The only side effect is updating
    /// each node's cached value.
    pub fn evaluate(&mut self) -> Result<f64> {
        let value = match self.kind {
            NodeKind::Diagnostic => self.evaluator.evaluate(&self.findings, &[]),
            NodeKind::Measure => {
                let mut child_values = Vec::with_capacity(self.children.len());
                for child in self.children.values_mut() {
                    child_values.push(child.evaluate()?);
                }
                let raw = self.evaluator.evaluate(&self.findings, &child_values);
                self.normalizer
                    .normalize(raw, self.thresholds.as_deref(), self.positive)?
            }
            _ => {
                let mut weighted_values = Vec::with_capacity(self.children.len());
                for (name, child) in self.children.iter_mut() {
                    let weight = *self.weights.get(name).ok_or_else(|| {
                        QscoreError::Validation(format!(
                            "node {} has no weight for child {name}",
                            self.name
                        ))
                    })?;
                    weighted_values.push((weight, child.evaluate()?));
                }
                self.utility_function.combine(&weighted_values)
            }
        };

        self.value = value;
        Ok(value)
    }

    /// Evaluates only the measure tier and below, leaving composite tiers
    /// untouched. Calibration uses this: aggregation above measures is
    /// irrelevant to threshold derivation.
    pub fn evaluate_measures(&mut self) -> Result<()> {
        if self.kind == NodeKind::Measure {
            self.evaluate()?;
            return Ok(());
        }
        for child in self.children.values_mut() {
            child.evaluate_measures()?;
        }
        Ok(())
    }

    /// Checks that every composite node in the subtree carries a weight for
    /// each of its children.
    pub fn validate_weights(&self) -> Result<()> {
        if self.kind.is_composite() {
            for name in self.children.keys() {
                if !self.weights.contains_key(name) {
                    return Err(QscoreError::Validation(format!(
                        "node {} has no weight for child {name}",
                        self.name
                    )));
                }
            }
        }
        for child in self.children.values() {
            child.validate_weights()?;
        }
        Ok(())
    }

    /// Injects the lines-of-code figure into every measure normalizer in the
    /// subtree. No-op for measures bound to other normalizer strategies.
    pub fn inject_lines_of_code(&mut self, loc: f64) {
        if self.kind == NodeKind::Measure {
            self.normalizer.set_lines_of_code(loc);
        }
        for child in self.children.values_mut() {
            child.inject_lines_of_code(loc);
        }
    }

    /// Adds the given findings to every diagnostic in the subtree with the
    /// given name. The fully-connected topology duplicates measure subtrees
    /// under several product factors, so all copies must receive the same
    /// findings. Returns whether any diagnostic matched.
    pub fn attach_findings(&mut self, diagnostic: &str, findings: &[Finding]) -> bool {
        if self.kind == NodeKind::Diagnostic {
            if self.name == diagnostic {
                self.findings.extend(findings.iter().cloned());
                return true;
            }
            return false;
        }

        let mut matched = false;
        for child in self.children.values_mut() {
            matched |= child.attach_findings(diagnostic, findings);
        }
        matched
    }

    /// Unique measures of the subtree, keyed by name. Duplicated copies of a
    /// measure under different product factors collapse onto the first
    /// occurrence.
    pub fn measures(&self) -> BTreeMap<&str, &ModelNode> {
        let mut out = BTreeMap::new();
        self.collect_measures(&mut out);
        out
    }

    fn collect_measures<'a>(&'a self, out: &mut BTreeMap<&'a str, &'a ModelNode>) {
        if self.kind == NodeKind::Measure {
            out.entry(self.name.as_str()).or_insert(self);
            return;
        }
        for child in self.children.values() {
            child.collect_measures(out);
        }
    }

    /// Sets the given breakpoints on every measure in the subtree with the
    /// given name.
    pub(crate) fn apply_measure_thresholds(&mut self, measure: &str, thresholds: [f64; 3]) {
        if self.kind == NodeKind::Measure {
            if self.name == measure {
                self.thresholds = Some(thresholds.to_vec());
            }
            return;
        }
        for child in self.children.values_mut() {
            child.apply_measure_thresholds(measure, thresholds);
        }
    }

    /// Replaces every composite node's weight map with weights derived by
    /// the given weighter.
    pub(crate) fn apply_weights(&mut self, weighter: &Weighter) {
        if self.kind.is_composite() {
            let child_names: Vec<String> = self.children.keys().cloned().collect();
            self.weights = weighter.weights(&child_names);
        }
        for child in self.children.values_mut() {
            child.apply_weights(weighter);
        }
    }
}
