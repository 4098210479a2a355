use crate::error::Result;
use crate::model::import::{
    DiagnosticDescription, FactorDescription, FactorsDescription, GlobalConfigDescription,
    MeasureDescription, ModelDescription,
};
use crate::model::quality_model::QualityModel;
use crate::model::ModelNode;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Serializes the tree back into the model-description shape, carrying the
/// computed value at every node and the findings under each diagnostic. The
/// result re-imports: names, tiers, weights and thresholds survive the round
/// trip.
pub fn export_quality_model(
    model: &QualityModel,
    directory: &Path,
    file_stem: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let description = to_description(model);
    let path = directory.join(format!("{file_stem}.json"));
    let rendered = serde_json::to_string_pretty(&description)?;
    fs::write(&path, rendered)?;
    tracing::debug!(path = %path.display(), "exported quality model");
    Ok(path)
}

pub fn to_description(model: &QualityModel) -> ModelDescription {
    let mut tqi = BTreeMap::new();
    tqi.insert(
        model.tqi.name.clone(),
        FactorDescription {
            description: model.tqi.description.clone(),
            value: Some(model.tqi.value),
            measures: None,
            weights: Some(model.tqi.weights.clone()),
            utility_function: Some(model.tqi.utility_function.key().to_string()),
        },
    );

    let mut quality_aspects = BTreeMap::new();
    for (name, aspect) in model.quality_aspects() {
        quality_aspects.insert(
            name.clone(),
            FactorDescription {
                description: aspect.description.clone(),
                value: Some(aspect.value),
                measures: None,
                weights: Some(aspect.weights.clone()),
                utility_function: Some(aspect.utility_function.key().to_string()),
            },
        );
    }

    let mut product_factors = BTreeMap::new();
    for (name, factor) in model.product_factors() {
        product_factors.insert(
            name.to_string(),
            FactorDescription {
                description: factor.description.clone(),
                value: Some(factor.value),
                measures: Some(factor.children.keys().cloned().collect()),
                weights: Some(factor.weights.clone()),
                utility_function: Some(factor.utility_function.key().to_string()),
            },
        );
    }

    let mut measures = BTreeMap::new();
    for (name, measure) in model.measures() {
        measures.insert(name.to_string(), measure_description(measure));
    }

    ModelDescription {
        name: model.name.clone(),
        generated: Some(Utc::now()),
        global_config: Some(GlobalConfigDescription {
            benchmark_strategy: Some(model.benchmarker.key().to_string()),
            weights_strategy: Some(model.weighter.key().to_string()),
        }),
        factors: FactorsDescription {
            tqi,
            quality_aspects,
            product_factors,
        },
        measures,
    }
}

fn measure_description(measure: &ModelNode) -> MeasureDescription {
    let diagnostics = measure
        .children
        .values()
        .map(|diagnostic| DiagnosticDescription {
            name: diagnostic.name.clone(),
            description: diagnostic.description.clone(),
            tool_name: diagnostic.tool_name.clone().unwrap_or_default(),
            eval_strategy: Some(diagnostic.evaluator.key().to_string()),
            value: Some(diagnostic.value),
            findings: diagnostic.findings.iter().cloned().collect(),
        })
        .collect();

    MeasureDescription {
        description: measure.description.clone(),
        positive: measure.positive,
        value: Some(measure.value),
        thresholds: measure.thresholds.clone(),
        normalizer: Some(measure.normalizer.key().to_string()),
        eval_strategy: Some(measure.evaluator.key().to_string()),
        diagnostics,
    }
}
