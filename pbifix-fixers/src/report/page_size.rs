use crate::document::DocumentRule;
use crate::fixer::FixerMeta;
use anyhow::Context;
use pbifix_pbir::DocKind;
use pbifix_types::Layer;
use serde_json::{json, Value};

/// Every page in scope has the target canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub const META: FixerMeta = FixerMeta {
        key: "page-size",
        title: "Fix Page Size",
        layer: Layer::Report,
        description: "Sets the width and height of every page to the configured canvas size \
                      (1920 x 1080 unless configured otherwise).",
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

fn dimension(doc: &Value, key: &str) -> Option<f64> {
    doc.get(key).and_then(Value::as_f64)
}

impl DocumentRule for PageSize {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn kind(&self) -> DocKind {
        DocKind::Page
    }

    fn subject(&self) -> &'static str {
        "page size"
    }

    fn selects(&self, _doc: &Value) -> bool {
        true
    }

    fn needs_change(&self, doc: &Value) -> bool {
        dimension(doc, "width") != Some(f64::from(self.width))
            || dimension(doc, "height") != Some(f64::from(self.height))
    }

    fn rewrite(&self, doc: &mut Value) -> anyhow::Result<()> {
        let page = doc
            .as_object_mut()
            .context("page document is not a JSON object")?;
        page.insert("width".to_string(), json!(self.width));
        page.insert("height".to_string(), json!(self.height));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_dimensions_match_target() {
        let rule = PageSize::new(1920, 1080);
        assert!(!rule.needs_change(&json!({"width": 1920.0, "height": 1080})));
        assert!(rule.needs_change(&json!({"width": 1280, "height": 720})));
        assert!(rule.needs_change(&json!({"name": "p1"})));
    }

    #[test]
    fn rewrite_keeps_other_keys() {
        let rule = PageSize::new(1920, 1080);
        let mut doc = json!({"name": "p1", "displayName": "Overview", "width": 1280, "height": 720, "displayOption": "FitToPage"});
        rule.rewrite(&mut doc).unwrap();
        assert_eq!(
            doc,
            json!({"name": "p1", "displayName": "Overview", "width": 1920, "height": 1080, "displayOption": "FitToPage"})
        );
    }
}
