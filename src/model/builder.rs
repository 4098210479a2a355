//! Test helpers building "as simple as possible" model instances.

use crate::model::finding::Finding;
use crate::model::quality_model::QualityModel;
use crate::model::{ModelNode, NodeKind};

pub fn finding(file_path: &str, line_number: u32, severity: u32) -> Finding {
    Finding::new(file_path, line_number, 11, severity)
}

/// Diagnostic with three findings.
pub fn diagnostic(id: &str) -> ModelNode {
    let mut node = ModelNode::new(NodeKind::Diagnostic, id, "Sample Description");
    node.tool_name = Some("Sample Tool".to_string());
    node.findings.insert(finding(&format!("{id}/file/path/f1"), 1, 1));
    node.findings.insert(finding(&format!("{id}/file/path/f2"), 2, 2));
    node.findings.insert(finding(&format!("{id}/file/path/f3"), 3, 2));
    node
}

/// Measure with two diagnostics (six findings total) and the default
/// lines-of-code normalizer.
pub fn measure(name: &str) -> ModelNode {
    let mut node = ModelNode::new(NodeKind::Measure, name, format!("{name} description"));
    node.set_child(diagnostic(&format!("{name}_Diagnostic 01")));
    node.set_child(diagnostic(&format!("{name}_Diagnostic 02")));
    node
}

pub fn product_factor(name: &str) -> ModelNode {
    let mut node = ModelNode::new(NodeKind::ProductFactor, name, format!("{name} description"));
    let measure_name = format!("{name}_Measure 01");
    node.set_child(measure(&measure_name));
    node.set_weight(measure_name, 1.0);
    node
}

pub fn quality_aspect(name: &str) -> ModelNode {
    let mut node = ModelNode::new(NodeKind::QualityAspect, name, format!("{name} description"));
    for suffix in ["ProductFactor 01", "ProductFactor 02"] {
        let factor_name = format!("{name}_{suffix}");
        node.set_child(product_factor(&factor_name));
        node.set_weight(factor_name, 0.5);
    }
    node
}

pub fn tqi(name: &str) -> ModelNode {
    let mut node = ModelNode::new(NodeKind::Tqi, name, format!("{name} description"));
    for aspect_name in ["QA01", "QA02"] {
        node.set_child(quality_aspect(aspect_name));
        node.set_weight(aspect_name, 0.5);
    }
    node
}

pub fn quality_model(name: &str) -> QualityModel {
    QualityModel::new(name, tqi("Total Quality"))
}

/// Quality aspect whose evaluation yields exactly `value`: one product
/// factor over one measure holding four findings, with the lines-of-code
/// figure chosen so the normalized measure equals the target.
pub fn pinned_aspect(name: &str, value: f64) -> ModelNode {
    let mut diag = ModelNode::new(
        NodeKind::Diagnostic,
        format!("{name} pinned diagnostic"),
        "pinned",
    );
    for i in 0u32..4 {
        diag.findings.insert(finding(&format!("{name}/f{i}.rs"), i + 1, 1));
    }

    let measure_name = format!("{name} pinned measure");
    let mut pinned_measure = ModelNode::new(NodeKind::Measure, &measure_name, "pinned");
    pinned_measure.set_child(diag);
    pinned_measure.inject_lines_of_code(4.0 / value);

    let factor_name = format!("{name} pinned factor");
    let mut factor = ModelNode::new(NodeKind::ProductFactor, &factor_name, "pinned");
    factor.set_child(pinned_measure);
    factor.set_weight(measure_name, 1.0);

    let mut aspect = ModelNode::new(NodeKind::QualityAspect, name, "pinned");
    aspect.set_child(factor);
    aspect.set_weight(factor_name, 1.0);
    aspect
}
