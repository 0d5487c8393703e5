use crate::document::DocumentRule;
use crate::fixer::FixerMeta;
use anyhow::Context;
use pbifix_pbir::DocKind;
use pbifix_types::Layer;
use serde_json::Value;

const HIDDEN_KEY: &str = "isHiddenInViewMode";

/// Hides visual-level filters from report consumers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HideVisualFilters;

impl HideVisualFilters {
    pub const META: FixerMeta = FixerMeta {
        key: "hide-visual-filters",
        title: "Hide Visual Filters",
        layer: Layer::Report,
        description: "Marks every visual-level filter as hidden in view mode so the filter \
                      pane only shows page and report filters.",
    };
}

fn filters(doc: &Value) -> Option<&Vec<Value>> {
    doc.pointer("/filterConfig/filters").and_then(Value::as_array)
}

impl DocumentRule for HideVisualFilters {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn kind(&self) -> DocKind {
        DocKind::Visual
    }

    fn subject(&self) -> &'static str {
        "visual filters"
    }

    fn selects(&self, doc: &Value) -> bool {
        filters(doc).is_some_and(|f| !f.is_empty())
    }

    fn needs_change(&self, doc: &Value) -> bool {
        filters(doc).is_some_and(|f| {
            f.iter()
                .any(|filter| filter.get(HIDDEN_KEY).and_then(Value::as_bool) != Some(true))
        })
    }

    fn rewrite(&self, doc: &mut Value) -> anyhow::Result<()> {
        let filters = doc
            .pointer_mut("/filterConfig/filters")
            .and_then(Value::as_array_mut)
            .context("visual has no `filterConfig.filters` array")?;
        for (idx, filter) in filters.iter_mut().enumerate() {
            filter
                .as_object_mut()
                .with_context(|| format!("filter #{idx} is not an object"))?
                .insert(HIDDEN_KEY.to_string(), Value::Bool(true));
        }
        Ok(())
    }
}
