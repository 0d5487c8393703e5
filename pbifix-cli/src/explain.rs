//! Output for the `pbifix explain` and `pbifix list-fixers` commands.

use pbifix_fixers::{FixerMeta, Registry};
use pbifix_types::Layer;

const BANNER: &str =
    "================================================================================";
const RULE: &str =
    "--------------------------------------------------------------------------------";

/// What selecting a fixer of this layer means for the user.
pub fn layer_meaning(layer: Layer) -> &'static str {
    match layer {
        Layer::Report => {
            "Rewrites report layout documents (pages and visuals). Runs without confirmation; \
             the report definition can be restored from source control."
        }
        Layer::Model => {
            "Changes the semantic model. Runs only after the confirmation gate. Once a model \
             is modified this way the report can no longer be downloaded with its data."
        }
    }
}

pub fn render_explanation(meta: &FixerMeta) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&format!("FIXER: {}\n", meta.title));
    out.push_str(BANNER);
    out.push_str("\n\n");
    out.push_str(&format!("Key:    {}\n", meta.key));
    out.push_str(&format!("Layer:  {}\n\n", meta.layer));

    out.push_str("DESCRIPTION\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(meta.description);
    out.push_str("\n\n");

    out.push_str(&format!("LAYER: {}\n", meta.layer.label().to_uppercase()));
    out.push_str(RULE);
    out.push('\n');
    out.push_str(layer_meaning(meta.layer));
    out.push_str("\n\n");

    out.push_str("IDEMPOTENCE\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(
        "Running this fixer on its own output changes nothing. A scan that reports\n\
         \"0 changes\" means the artifact is already in the fixed state.\n",
    );
    out
}

pub fn render_fixer_table(registry: &Registry) -> String {
    let mut out = String::from("Available fixers:\n\n");
    out.push_str(&format!("  {:<28} {:<8} TITLE\n", "KEY", "LAYER"));
    out.push_str(&format!("  {:<28} {:<8} -----\n", "---", "-----"));
    for fixer in registry.iter() {
        let meta = fixer.meta();
        out.push_str(&format!(
            "  {:<28} {:<8} {}\n",
            meta.key,
            meta.layer.label(),
            meta.title
        ));
    }
    out.push_str("\nUse 'pbifix explain <key>' for details.\n");
    out
}

pub fn fixer_table_json(registry: &Registry) -> serde_json::Value {
    registry
        .iter()
        .map(|f| {
            let meta = f.meta();
            serde_json::json!({
                "key": meta.key,
                "title": meta.title,
                "layer": meta.layer,
                "description": meta.description,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbifix_fixers::FixerSettings;

    #[test]
    fn test_every_fixer_has_an_explanation() {
        let registry = Registry::builtin(&FixerSettings::default());
        for fixer in registry.iter() {
            let meta = fixer.meta();
            assert!(!meta.description.is_empty(), "{} has no description", meta.key);
            let text = render_explanation(&meta);
            assert!(text.contains(&format!("Key:    {}", meta.key)));
            assert!(text.contains(meta.title));
        }
    }

    #[test]
    fn test_model_fixers_mention_the_gate() {
        let registry = Registry::builtin(&FixerSettings::default());
        let meta = registry.get("explicit-measures").unwrap().meta();
        assert!(render_explanation(&meta).contains("confirmation gate"));
    }

    #[test]
    fn test_table_lists_registry_order() {
        let registry = Registry::builtin(&FixerSettings::default());
        let table = render_fixer_table(&registry);
        let positions: Vec<usize> = registry
            .keys()
            .iter()
            .map(|k| table.find(&format!("  {k} ")).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);

        let json = fixer_table_json(&registry);
        assert_eq!(json.as_array().unwrap().len(), registry.len());
        assert_eq!(json[0]["key"], registry.keys()[0]);
    }
}
