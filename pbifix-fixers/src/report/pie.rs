use crate::document::DocumentRule;
use crate::fixer::FixerMeta;
use anyhow::Context;
use pbifix_pbir::DocKind;
use pbifix_pbir::literal::visual_type;
use pbifix_types::Layer;
use serde_json::Value;

const PIE_TYPES: &[&str] = &["pieChart", "donutChart"];

/// Formatting objects only pie and donut charts understand.
const PIE_ONLY_OBJECTS: &[&str] = &["slices"];

/// Converts pie and donut charts to another visual type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieToBar {
    replacement: String,
}

impl PieToBar {
    pub const META: FixerMeta = FixerMeta {
        key: "pie-charts",
        title: "Fix Pie Charts",
        layer: Layer::Report,
        description: "Replaces pie and donut charts with a bar chart (clusteredBarChart unless \
                      configured otherwise) and drops the slice formatting that no longer applies.",
    };

    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }
}

impl DocumentRule for PieToBar {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn kind(&self) -> DocKind {
        DocKind::Visual
    }

    fn subject(&self) -> &'static str {
        "pie charts"
    }

    fn selects(&self, doc: &Value) -> bool {
        visual_type(doc).is_some_and(|t| PIE_TYPES.contains(&t))
    }

    fn needs_change(&self, doc: &Value) -> bool {
        self.selects(doc)
    }

    fn rewrite(&self, doc: &mut Value) -> anyhow::Result<()> {
        let visual = doc
            .get_mut("visual")
            .and_then(Value::as_object_mut)
            .context("visual document has no `visual` object")?;
        visual.insert(
            "visualType".to_string(),
            Value::String(self.replacement.clone()),
        );
        if let Some(objects) = visual.get_mut("objects").and_then(Value::as_object_mut) {
            for name in PIE_ONLY_OBJECTS {
                objects.remove(*name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn donut_becomes_bar_and_loses_slices() {
        let rule = PieToBar::new("clusteredBarChart");
        let mut doc = json!({
            "name": "v1",
            "visual": {
                "visualType": "donutChart",
                "query": {"queryState": {"Category": {}, "Y": {}}},
                "objects": {"slices": [{"properties": {}}], "legend": [{"properties": {}}]}
            }
        });
        assert!(rule.needs_change(&doc));
        rule.rewrite(&mut doc).unwrap();
        assert_eq!(
            doc,
            json!({
                "name": "v1",
                "visual": {
                    "visualType": "clusteredBarChart",
                    "query": {"queryState": {"Category": {}, "Y": {}}},
                    "objects": {"legend": [{"properties": {}}]}
                }
            })
        );
        assert!(!rule.selects(&doc));
    }

    #[test]
    fn other_visuals_are_not_selected() {
        let rule = PieToBar::new("clusteredBarChart");
        assert!(!rule.selects(&json!({"visual": {"visualType": "card"}})));
        assert!(!rule.selects(&json!({"name": "group"})));
    }
}
