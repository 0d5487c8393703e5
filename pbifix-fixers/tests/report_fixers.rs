use pbifix_fixers::{Fixer, FixerSettings, Registry, ReportFixer};
use pbifix_pbir::literal::{bool_literal, literal, object_properties, visual_type};
use pbifix_pbir::{DocId, InMemoryReportStore, PageScope, ReportFormat, ReportStore};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn page(id: &str, width: u32, height: u32) -> Value {
    json!({"name": id, "displayName": format!("Page {id}"), "width": width, "height": height})
}

fn visual(id: &str, visual_type: &str) -> Value {
    json!({
        "name": id,
        "position": {"x": 0, "y": 0, "width": 300, "height": 200},
        "visual": {"visualType": visual_type, "drillFilterOtherVisuals": true}
    })
}

fn report() -> InMemoryReportStore {
    InMemoryReportStore::new("Sales")
        .with_page("p1", page("p1", 1280, 720))
        .with_page("p2", page("p2", 1920, 1080))
        .with_visual("p1", "pie", visual("pie", "pieChart"))
        .with_visual("p1", "bar", visual("bar", "clusteredBarChart"))
        .with_visual("p2", "col", visual("col", "stackedColumnChart"))
        .with_visual(
            "p2",
            "filtered",
            json!({
                "name": "filtered",
                "visual": {"visualType": "card"},
                "filterConfig": {"filters": [{"name": "f1", "field": {"Column": {}}}]}
            }),
        )
}

fn report_fixer<'a>(registry: &'a Registry, key: &str) -> &'a dyn ReportFixer {
    match registry.get(key) {
        Some(Fixer::Report(f)) => f.as_ref(),
        other => panic!("expected report fixer for {key}, got {other:?}"),
    }
}

#[test]
fn page_size_detail_strings() {
    let registry = Registry::builtin(&FixerSettings::default());
    let fixer = report_fixer(&registry, "page-size");
    let mut store = report();

    let scan = fixer.assess(&store, &PageScope::All).unwrap();
    assert!(scan.would_change);
    assert_eq!(scan.targets, vec!["pages/p1".to_string()]);
    assert!(scan.preview.as_deref().unwrap().contains("+  \"width\": 1920"));

    let first = fixer.apply(&mut store, &PageScope::All).unwrap();
    assert_eq!(first.detail, "page size updated: 1 page");
    assert_eq!(first.changed, 1);

    let second = fixer.apply(&mut store, &PageScope::All).unwrap();
    assert_eq!(second.detail, "page size already correct: 0 changes");
    assert_eq!(second.changed, 0);
}

#[test]
fn page_scope_limits_documents() {
    let registry = Registry::builtin(&FixerSettings::default());
    let fixer = report_fixer(&registry, "pie-charts");
    let mut store = report();

    let outcome = fixer
        .apply(&mut store, &PageScope::Page("p2".to_string()))
        .unwrap();
    assert!(!outcome.made_change());
    let pie = store.get(&DocId::visual("p1", "pie")).unwrap();
    assert_eq!(visual_type(pie), Some("pieChart"));

    fixer.apply(&mut store, &PageScope::All).unwrap();
    let pie = store.get(&DocId::visual("p1", "pie")).unwrap();
    assert_eq!(visual_type(pie), Some("clusteredBarChart"));
    assert_eq!(pie["visual"]["drillFilterOtherVisuals"], json!(true));
}

#[test]
fn bar_and_column_rules_touch_only_their_types() {
    let registry = Registry::builtin(&FixerSettings::default());
    let mut store = report();

    let bars = report_fixer(&registry, "bar-charts")
        .apply(&mut store, &PageScope::All)
        .unwrap();
    assert_eq!(bars.detail, "bar charts updated: 1 visual");
    let col = store.get(&DocId::visual("p2", "col")).unwrap();
    assert!(object_properties(col, "valueAxis").is_none());

    let cols = report_fixer(&registry, "column-charts")
        .apply(&mut store, &PageScope::All)
        .unwrap();
    assert_eq!(cols.changed, 1);
    let col = store.get(&DocId::visual("p2", "col")).unwrap();
    let labels = object_properties(col, "labels").unwrap();
    assert_eq!(labels.get("show"), Some(&bool_literal(true)));
}

#[test]
fn visual_filters_are_hidden_and_unknown_keys_survive() {
    let registry = Registry::builtin(&FixerSettings::default());
    let mut store = report();
    report_fixer(&registry, "hide-visual-filters")
        .apply(&mut store, &PageScope::All)
        .unwrap();

    let doc = store.get(&DocId::visual("p2", "filtered")).unwrap();
    assert_eq!(
        doc["filterConfig"]["filters"][0],
        json!({"name": "f1", "field": {"Column": {}}, "isHiddenInViewMode": true})
    );
}

#[test]
fn upgrade_runs_once_and_unblocks_document_fixers() {
    let registry = Registry::builtin(&FixerSettings::default());
    let mut store = report().with_format(ReportFormat::PbirLegacy);

    assert!(
        report_fixer(&registry, "page-size")
            .assess(&store, &PageScope::All)
            .is_err()
    );

    let upgrade = report_fixer(&registry, "upgrade-to-pbir");
    assert!(upgrade.assess(&store, &PageScope::All).unwrap().would_change);
    assert_eq!(upgrade.apply(&mut store, &PageScope::All).unwrap().changed, 1);
    assert_eq!(store.format().unwrap(), ReportFormat::Pbir);
    assert!(!upgrade.apply(&mut store, &PageScope::All).unwrap().made_change());

    assert!(
        report_fixer(&registry, "page-size")
            .assess(&store, &PageScope::All)
            .unwrap()
            .would_change
    );
}

#[test]
fn upgrade_rejects_unknown_formats() {
    let registry = Registry::builtin(&FixerSettings::default());
    let store = report().with_format(ReportFormat::Other("pbix".to_string()));
    let err = report_fixer(&registry, "upgrade-to-pbir")
        .assess(&store, &PageScope::All)
        .unwrap_err();
    assert!(err.to_string().contains("only PBIRLegacy"));
}

#[test]
fn leftover_value_axis_formatting_is_removed() {
    let registry = Registry::builtin(&FixerSettings::default());
    let mut doc = visual("bar", "clusteredBarChart");
    doc["visual"]["objects"] = json!({
        "valueAxis": [{"properties": {"labelDisplayUnits": literal("1000D")}}]
    });
    let mut store = InMemoryReportStore::new("Sales")
        .with_page("p1", page("p1", 1920, 1080))
        .with_visual("p1", "bar", doc);

    report_fixer(&registry, "bar-charts")
        .apply(&mut store, &PageScope::All)
        .unwrap();
    let bar = store.get(&DocId::visual("p1", "bar")).unwrap();
    let axis = object_properties(bar, "valueAxis").unwrap();
    assert!(axis.get("labelDisplayUnits").is_none());
    assert_eq!(axis.get("show"), Some(&bool_literal(false)));
}
