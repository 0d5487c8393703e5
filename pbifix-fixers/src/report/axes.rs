use crate::document::DocumentRule;
use crate::fixer::FixerMeta;
use pbifix_pbir::DocKind;
use pbifix_pbir::literal::{bool_literal, ensure_object_properties, is_bool_literal, object_properties, visual_type};
use pbifix_types::Layer;
use serde_json::Value;

pub const BAR_CHARTS: &[&str] = &[
    "clusteredBarChart",
    "stackedBarChart",
    "hundredPercentStackedBarChart",
];

pub const COLUMN_CHARTS: &[&str] = &[
    "clusteredColumnChart",
    "stackedColumnChart",
    "hundredPercentStackedColumnChart",
];

/// Value-axis properties that only matter while the axis is shown.
const VALUE_AXIS_LEFTOVERS: &[&str] = &[
    "titleText",
    "labelDisplayUnits",
    "labelPrecision",
    "start",
    "end",
];

/// (object, property, value) pairs every decluttered chart carries.
const FLAGS: &[(&str, &str, bool)] = &[
    ("valueAxis", "show", false),
    ("valueAxis", "gridlineShow", false),
    ("categoryAxis", "showAxisTitle", false),
    ("labels", "show", true),
];

/// Hides the value axis in favour of data labels on bar-like charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisDeclutter {
    meta: FixerMeta,
    subject: &'static str,
    visual_types: &'static [&'static str],
}

impl AxisDeclutter {
    pub fn bar_charts() -> Self {
        Self {
            meta: FixerMeta {
                key: "bar-charts",
                title: "Fix Bar Charts",
                layer: Layer::Report,
                description: "On bar charts hides the value axis, its gridlines and the category \
                              axis title, removes leftover value-axis formatting and turns data \
                              labels on.",
            },
            subject: "bar charts",
            visual_types: BAR_CHARTS,
        }
    }

    pub fn column_charts() -> Self {
        Self {
            meta: FixerMeta {
                key: "column-charts",
                title: "Fix Column Charts",
                layer: Layer::Report,
                description: "On column charts hides the value axis, its gridlines and the \
                              category axis title, removes leftover value-axis formatting and \
                              turns data labels on.",
            },
            subject: "column charts",
            visual_types: COLUMN_CHARTS,
        }
    }
}

impl DocumentRule for AxisDeclutter {
    fn meta(&self) -> FixerMeta {
        self.meta
    }

    fn kind(&self) -> DocKind {
        DocKind::Visual
    }

    fn subject(&self) -> &'static str {
        self.subject
    }

    fn selects(&self, doc: &Value) -> bool {
        visual_type(doc).is_some_and(|t| self.visual_types.contains(&t))
    }

    fn needs_change(&self, doc: &Value) -> bool {
        let flags_ok = FLAGS.iter().all(|(object, prop, value)| {
            is_bool_literal(
                object_properties(doc, object).and_then(|p| p.get(*prop)),
                *value,
            )
        });
        let leftovers = object_properties(doc, "valueAxis")
            .is_some_and(|p| VALUE_AXIS_LEFTOVERS.iter().any(|k| p.contains_key(*k)));
        !flags_ok || leftovers
    }

    fn rewrite(&self, doc: &mut Value) -> anyhow::Result<()> {
        for (object, prop, value) in FLAGS {
            ensure_object_properties(doc, object)?.insert(prop.to_string(), bool_literal(*value));
        }
        let value_axis = ensure_object_properties(doc, "valueAxis")?;
        for key in VALUE_AXIS_LEFTOVERS {
            value_axis.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbifix_pbir::literal::literal;
    use serde_json::json;

    #[test]
    fn declutter_reaches_desired_state() {
        let rule = AxisDeclutter::bar_charts();
        let mut doc = json!({
            "name": "v1",
            "visual": {
                "visualType": "stackedBarChart",
                "objects": {
                    "valueAxis": [{"properties": {
                        "show": bool_literal(true),
                        "titleText": literal("'Revenue'"),
                        "fontSize": literal("9D")
                    }}]
                }
            }
        });
        assert!(rule.selects(&doc));
        assert!(rule.needs_change(&doc));
        rule.rewrite(&mut doc).unwrap();
        assert!(!rule.needs_change(&doc));

        let value_axis = object_properties(&doc, "valueAxis").unwrap();
        assert!(value_axis.get("titleText").is_none());
        assert_eq!(value_axis.get("fontSize"), Some(&literal("9D")));
        assert!(is_bool_literal(
            object_properties(&doc, "labels").unwrap().get("show"),
            true
        ));
    }

    #[test]
    fn column_rule_ignores_bar_charts() {
        let rule = AxisDeclutter::column_charts();
        assert!(!rule.selects(&json!({"visual": {"visualType": "clusteredBarChart"}})));
        assert!(rule.selects(&json!({"visual": {"visualType": "clusteredColumnChart"}})));
    }
}
