use crate::error::{QscoreError, Result};
use crate::eval::registry::StrategyRegistry;
use crate::model::finding::Finding;
use crate::model::quality_model::QualityModel;
use crate::model::{ModelNode, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk shape of a quality-model description. The same shape, with the
/// optional `value`/`findings`/`generated` fields filled in, is what an
/// evaluation export produces, so exports re-import cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_config: Option<GlobalConfigDescription>,
    pub factors: FactorsDescription,
    pub measures: BTreeMap<String, MeasureDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfigDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorsDescription {
    pub tqi: BTreeMap<String, FactorDescription>,
    pub quality_aspects: BTreeMap<String, FactorDescription>,
    pub product_factors: BTreeMap<String, FactorDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorDescription {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Explicit child list for product factors. Absent means the tier is
    /// fully connected upward with zero weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measures: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility_function: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureDescription {
    pub description: String,
    pub positive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_strategy: Option<String>,
    pub diagnostics: Vec<DiagnosticDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticDescription {
    pub name: String,
    pub description: String,
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

pub fn import_quality_model(path: &Path, registry: &StrategyRegistry) -> Result<QualityModel> {
    let raw = fs::read_to_string(path)?;
    let description: ModelDescription = serde_json::from_str(&raw).map_err(|e| {
        QscoreError::Configuration(format!(
            "malformed model description {}: {e}",
            path.display()
        ))
    })?;
    build_quality_model(&description, registry)
}

/// Builds the tree out of a parsed description: name, global strategy
/// overrides, quality aspects, product factors, measures, then weights.
pub fn build_quality_model(
    description: &ModelDescription,
    registry: &StrategyRegistry,
) -> Result<QualityModel> {
    let weighter_key = description
        .global_config
        .as_ref()
        .and_then(|g| g.weights_strategy.as_deref())
        .unwrap_or("naive");
    let benchmarker_key = description
        .global_config
        .as_ref()
        .and_then(|g| g.benchmark_strategy.as_deref())
        .unwrap_or("naive");
    let weighter = registry.weighter(weighter_key)?;
    let benchmarker = registry.benchmarker(benchmarker_key)?;

    let mut tqi = build_tqi(description, registry)?;
    let measures = build_measures(description, registry)?;
    let mut aspects = build_quality_aspects(description, registry)?;
    connect_product_factors(description, &measures, &mut aspects, registry)?;

    // quality aspects are fully connected to the single root
    for (name, aspect) in aspects {
        tqi.set_weight(&name, 0.0);
        tqi.set_child(aspect);
    }

    apply_declared_weights(description, &mut tqi)?;

    let mut model = QualityModel::new(&description.name, tqi);
    model.weighter = weighter;
    model.benchmarker = benchmarker;
    Ok(model)
}

fn build_tqi(description: &ModelDescription, registry: &StrategyRegistry) -> Result<ModelNode> {
    let mut entries = description.factors.tqi.iter();
    let (name, factor) = entries.next().ok_or_else(|| {
        QscoreError::Configuration("model description declares no tqi node".to_string())
    })?;
    if entries.next().is_some() {
        return Err(QscoreError::Configuration(
            "model description declares more than one tqi node".to_string(),
        ));
    }

    let mut tqi = ModelNode::new(NodeKind::Tqi, name, &factor.description);
    if let Some(key) = &factor.utility_function {
        tqi.utility_function = registry.utility_function(key)?;
    }
    Ok(tqi)
}

fn build_measures(
    description: &ModelDescription,
    registry: &StrategyRegistry,
) -> Result<BTreeMap<String, ModelNode>> {
    let mut measures = BTreeMap::new();
    for (name, measure_description) in &description.measures {
        let mut measure = ModelNode::new(NodeKind::Measure, name, &measure_description.description);
        measure.positive = measure_description.positive;
        measure.thresholds = measure_description.thresholds.clone();
        if let Some(key) = &measure_description.normalizer {
            measure.normalizer = registry.normalizer(key)?;
        }
        if let Some(key) = &measure_description.eval_strategy {
            measure.evaluator = registry.evaluator(key)?;
        }

        for diagnostic_description in &measure_description.diagnostics {
            let mut diagnostic = ModelNode::new(
                NodeKind::Diagnostic,
                &diagnostic_description.name,
                &diagnostic_description.description,
            );
            diagnostic.tool_name = Some(diagnostic_description.tool_name.clone());
            if let Some(key) = &diagnostic_description.eval_strategy {
                diagnostic.evaluator = registry.evaluator(key)?;
            }
            diagnostic
                .findings
                .extend(diagnostic_description.findings.iter().cloned());
            measure.set_child(diagnostic);
        }

        measures.insert(name.clone(), measure);
    }
    Ok(measures)
}

fn build_quality_aspects(
    description: &ModelDescription,
    registry: &StrategyRegistry,
) -> Result<BTreeMap<String, ModelNode>> {
    let mut aspects = BTreeMap::new();
    for (name, factor) in &description.factors.quality_aspects {
        let mut aspect = ModelNode::new(NodeKind::QualityAspect, name, &factor.description);
        if let Some(key) = &factor.utility_function {
            aspect.utility_function = registry.utility_function(key)?;
        }
        aspects.insert(name.clone(), aspect);
    }
    if aspects.is_empty() {
        return Err(QscoreError::Configuration(
            "model description declares no quality aspects".to_string(),
        ));
    }
    Ok(aspects)
}

/// Topology resolution for the lower tiers. A product factor with an
/// explicit `measures` list gets exactly those children, and its weights
/// come only from a declared `weights` object. One without a list is fully
/// connected to every measure at weight 0.0, the explicit "uncalibrated"
/// starting state. Each product factor is then attached to every quality
/// aspect.
fn connect_product_factors(
    description: &ModelDescription,
    measures: &BTreeMap<String, ModelNode>,
    aspects: &mut BTreeMap<String, ModelNode>,
    registry: &StrategyRegistry,
) -> Result<()> {
    if description.factors.product_factors.is_empty() {
        return Err(QscoreError::Configuration(
            "model description declares no product factors".to_string(),
        ));
    }

    for (factor_name, factor_description) in &description.factors.product_factors {
        let mut factor = ModelNode::new(
            NodeKind::ProductFactor,
            factor_name,
            &factor_description.description,
        );
        if let Some(key) = &factor_description.utility_function {
            factor.utility_function = registry.utility_function(key)?;
        }

        match &factor_description.measures {
            Some(explicit) => {
                for measure_name in explicit {
                    let measure = measures.get(measure_name).ok_or_else(|| {
                        QscoreError::Configuration(format!(
                            "product factor {factor_name} references unknown measure: {measure_name}"
                        ))
                    })?;
                    factor.set_child(measure.clone());
                }
            }
            None => {
                for (measure_name, measure) in measures {
                    factor.set_weight(measure_name, 0.0);
                    factor.set_child(measure.clone());
                }
            }
        }

        if let Some(weights) = &factor_description.weights {
            for (target, weight) in weights {
                if !factor.children.contains_key(target) {
                    return Err(QscoreError::Configuration(format!(
                        "product factor {factor_name} declares a weight for unknown child: {target}"
                    )));
                }
                factor.set_weight(target, *weight);
            }
        }

        for aspect in aspects.values_mut() {
            aspect.set_weight(factor_name, 0.0);
            aspect.set_child(factor.clone());
        }
    }
    Ok(())
}

/// Crawls back up the description applying declared weights at the quality
/// aspect and root tiers. A weight naming a node that is not a child of its
/// tier is a configuration error.
fn apply_declared_weights(description: &ModelDescription, tqi: &mut ModelNode) -> Result<()> {
    for (aspect_name, factor) in &description.factors.quality_aspects {
        if let Some(weights) = &factor.weights {
            let aspect = tqi.children.get_mut(aspect_name).ok_or_else(|| {
                QscoreError::Configuration(format!("unknown quality aspect: {aspect_name}"))
            })?;
            for (target, weight) in weights {
                if !aspect.children.contains_key(target) {
                    return Err(QscoreError::Configuration(format!(
                        "quality aspect {aspect_name} declares a weight for unknown child: {target}"
                    )));
                }
                aspect.set_weight(target, *weight);
            }
        }
    }

    for factor in description.factors.tqi.values() {
        if let Some(weights) = &factor.weights {
            for (target, weight) in weights {
                if !tqi.children.contains_key(target) {
                    return Err(QscoreError::Configuration(format!(
                        "tqi declares a weight for unknown child: {target}"
                    )));
                }
                tqi.set_weight(target, *weight);
            }
        }
    }
    Ok(())
}
