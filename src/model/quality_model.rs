use crate::calibrate::{Benchmarker, Weighter};
use crate::error::{QscoreError, Result};
use crate::model::finding::Finding;
use crate::model::ModelNode;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// The quality-model template: the root of the tier structure plus the
/// model-level weighter and benchmarker choice.
///
/// Lifecycle: imported once from a model description, then deep-cloned per
/// evaluated project. The clone is populated with findings, evaluated,
/// exported and discarded; the template itself is treated as immutable after
/// load and reused for the next project. `Clone` is a full structural copy:
/// the tree owns all of its nodes, so no state is shared between the
/// template and any project clone, or between sibling clones.
#[derive(Debug, Clone)]
pub struct QualityModel {
    pub name: String,
    pub tqi: ModelNode,
    pub weighter: Weighter,
    pub benchmarker: Benchmarker,
}

impl QualityModel {
    pub fn new(name: impl Into<String>, tqi: ModelNode) -> Self {
        Self {
            name: name.into(),
            tqi,
            weighter: Weighter::Naive,
            benchmarker: Benchmarker::Naive,
        }
    }

    pub fn quality_aspects(&self) -> &BTreeMap<String, ModelNode> {
        &self.tqi.children
    }

    /// Unique product factors across all quality aspects, keyed by name.
    pub fn product_factors(&self) -> BTreeMap<&str, &ModelNode> {
        let mut out = BTreeMap::new();
        for aspect in self.tqi.children.values() {
            for factor in aspect.children.values() {
                out.entry(factor.name.as_str()).or_insert(factor);
            }
        }
        out
    }

    /// Unique measures of the whole tree, keyed by name.
    pub fn measures(&self) -> BTreeMap<&str, &ModelNode> {
        self.tqi.measures()
    }

    pub fn measure_names(&self) -> BTreeSet<String> {
        self.measures().keys().map(|name| name.to_string()).collect()
    }

    /// Precondition for full evaluation: every composite node carries a
    /// complete weight map. Checked before any tool is invoked so a
    /// malformed model never triggers an analysis run.
    pub fn validate_for_evaluation(&self) -> Result<()> {
        self.tqi.validate_weights()
    }

    /// Evaluates the whole tree and returns the root index value.
    pub fn evaluate(&mut self) -> Result<f64> {
        self.tqi.evaluate()
    }

    /// Evaluates the measure tier only; see [`ModelNode::evaluate_measures`].
    pub fn evaluate_measures(&mut self) -> Result<()> {
        self.tqi.evaluate_measures()
    }

    /// Normalized value per unique measure, as of the last evaluation.
    pub fn measure_values(&self) -> BTreeMap<String, f64> {
        self.measures()
            .into_iter()
            .map(|(name, node)| (name.to_string(), node.value))
            .collect()
    }

    pub fn inject_lines_of_code(&mut self, loc: f64) {
        self.tqi.inject_lines_of_code(loc);
    }

    /// Merges tool results into the tree by diagnostic name. A tool result
    /// with no matching model diagnostic is dropped with a warning; a model
    /// diagnostic with no tool result keeps its empty finding set.
    pub fn attach_tool_findings(&mut self, results: &BTreeMap<String, Vec<Finding>>) {
        for (diagnostic, findings) in results {
            if !self.tqi.attach_findings(diagnostic, findings) {
                tracing::warn!(
                    diagnostic = %diagnostic,
                    "tool reported findings for a diagnostic not present in the model; dropped"
                );
            }
        }
    }

    /// Maps calibrated breakpoints back onto the model's measures. Every
    /// measure must receive thresholds and every threshold must name a known
    /// measure; anything else means the calibration output and the model
    /// have diverged.
    pub fn apply_thresholds(&mut self, thresholds: &BTreeMap<String, [f64; 3]>) -> Result<()> {
        let measure_names = self.measure_names();
        for name in thresholds.keys() {
            if !measure_names.contains(name) {
                return Err(QscoreError::Calibration(format!(
                    "threshold output names unknown measure: {name}"
                )));
            }
        }
        for name in &measure_names {
            if !thresholds.contains_key(name) {
                return Err(QscoreError::Calibration(format!(
                    "no thresholds derived for measure: {name}"
                )));
            }
        }

        for (name, breakpoints) in thresholds {
            self.tqi.apply_measure_thresholds(name, *breakpoints);
        }
        Ok(())
    }

    /// Fills every composite node's weights through the model's weighter.
    pub fn apply_weights(&mut self) {
        let weighter = self.weighter;
        self.tqi.apply_weights(&weighter);
    }

    /// Serializes the evaluated tree into the output directory; see
    /// [`crate::model::export`].
    pub fn export_evaluation(&self, directory: &Path) -> Result<PathBuf> {
        let stem = format!("qscore_eval_{}", compact_name(&self.name));
        crate::model::export::export_quality_model(self, directory, &stem)
    }

    /// Serializes the (typically calibrated) model as a re-importable model
    /// description.
    pub fn export_description(&self, directory: &Path) -> Result<PathBuf> {
        let stem = format!("qscore_model_{}_calibrated", compact_name(&self.name));
        crate::model::export::export_quality_model(self, directory, &stem)
    }
}

fn compact_name(name: &str) -> String {
    name.split_whitespace().collect()
}
