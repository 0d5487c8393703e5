//! Helpers for PBIR formatting properties.
//!
//! Visual formatting lives under `visual.objects.<object>[i].properties.<name>`, and every
//! scalar is wrapped as `{"expr": {"Literal": {"Value": "..."}}}`. Booleans are the strings
//! `true`/`false`; strings carry their own single quotes.

use anyhow::Context;
use serde_json::{json, Map, Value};

pub fn literal(value: &str) -> Value {
    json!({ "expr": { "Literal": { "Value": value } } })
}

pub fn bool_literal(value: bool) -> Value {
    literal(if value { "true" } else { "false" })
}

/// The raw literal string of a property, if it is a literal.
pub fn literal_value(prop: &Value) -> Option<&str> {
    prop.pointer("/expr/Literal/Value").and_then(Value::as_str)
}

pub fn is_bool_literal(prop: Option<&Value>, expected: bool) -> bool {
    let want = if expected { "true" } else { "false" };
    prop.and_then(literal_value) == Some(want)
}

pub fn visual_type(doc: &Value) -> Option<&str> {
    doc.pointer("/visual/visualType").and_then(Value::as_str)
}

/// Properties of the default (selector-less) entry of a formatting object.
pub fn object_properties<'a>(doc: &'a Value, object: &str) -> Option<&'a Map<String, Value>> {
    doc.pointer("/visual/objects")
        .and_then(|o| o.get(object))
        .and_then(Value::as_array)?
        .iter()
        .find(|entry| entry.get("selector").is_none())
        .and_then(|entry| entry.get("properties"))
        .and_then(Value::as_object)
}

/// Like [`object_properties`], creating the object and its default entry when missing.
///
/// Fails when the document does not have the shape of a visual.
pub fn ensure_object_properties<'a>(
    doc: &'a mut Value,
    object: &str,
) -> anyhow::Result<&'a mut Map<String, Value>> {
    let visual = doc
        .as_object_mut()
        .context("visual document is not a JSON object")?
        .get_mut("visual")
        .and_then(Value::as_object_mut)
        .context("visual document has no `visual` object")?;
    let objects = visual
        .entry("objects")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .context("`visual.objects` is not an object")?;
    let entries = objects
        .entry(object.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .with_context(|| format!("`visual.objects.{object}` is not an array"))?;

    let idx = match entries.iter().position(|e| e.get("selector").is_none()) {
        Some(idx) => idx,
        None => {
            entries.insert(0, json!({ "properties": {} }));
            0
        }
    };
    entries[idx]
        .as_object_mut()
        .with_context(|| format!("`visual.objects.{object}` entry is not an object"))?
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .with_context(|| format!("`visual.objects.{object}` properties is not an object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_shape() {
        assert_eq!(
            bool_literal(true),
            json!({"expr": {"Literal": {"Value": "true"}}})
        );
        assert_eq!(literal_value(&literal("'Segoe UI'")), Some("'Segoe UI'"));
    }

    #[test]
    fn object_properties_skips_selector_entries() {
        let doc = json!({"visual": {"objects": {"labels": [
            {"selector": {"metadata": "Sales.Amount"}, "properties": {"color": 1}},
            {"properties": {"show": bool_literal(true)}}
        ]}}});
        let props = object_properties(&doc, "labels").unwrap();
        assert!(is_bool_literal(props.get("show"), true));
        assert!(props.get("color").is_none());
    }

    #[test]
    fn ensure_creates_missing_object() {
        let mut doc = json!({"name": "v1", "visual": {"visualType": "clusteredBarChart"}});
        ensure_object_properties(&mut doc, "labels")
            .unwrap()
            .insert("show".into(), bool_literal(true));
        assert!(is_bool_literal(
            object_properties(&doc, "labels").unwrap().get("show"),
            true
        ));
        assert_eq!(visual_type(&doc), Some("clusteredBarChart"));
    }

    #[test]
    fn ensure_rejects_malformed_visual() {
        let mut doc = json!({"visual": []});
        assert!(ensure_object_properties(&mut doc, "labels").is_err());
    }
}
