use crate::doc::{DocId, PageRef, ReportFormat};
use crate::error::StoreError;
use crate::store::ReportStore;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde_json::Value;
use tracing::debug;

const REPORT_SUFFIX: &str = ".Report";

/// A `<Name>.Report` folder on disk.
#[derive(Debug, Clone)]
pub struct FsReportStore {
    root: Utf8PathBuf,
    name: String,
}

impl FsReportStore {
    pub fn open(root: impl Into<Utf8PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        let file_name = root.file_name().unwrap_or_default().to_string();
        if !root.is_dir() {
            return Err(StoreError::InvalidLayout {
                report: file_name,
                reason: format!("{} is not a directory", root),
            }
            .into());
        }
        let name = file_name
            .strip_suffix(REPORT_SUFFIX)
            .unwrap_or(&file_name)
            .to_string();
        Ok(Self { root, name })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The `datasetReference.byPath.path` from `definition.pbir`, if the report binds to a
    /// local semantic model folder.
    pub fn dataset_path(&self) -> anyhow::Result<Option<String>> {
        let path = self.root.join("definition.pbir");
        if !path.exists() {
            return Ok(None);
        }
        let doc = read_json(&path)?;
        Ok(doc
            .pointer("/datasetReference/byPath/path")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn definition_dir(&self) -> Utf8PathBuf {
        self.root.join("definition")
    }

    fn pages_dir(&self) -> Utf8PathBuf {
        self.definition_dir().join("pages")
    }

    fn path_for(&self, id: &DocId) -> Utf8PathBuf {
        match id {
            DocId::Page { page } => self.pages_dir().join(page).join("page.json"),
            DocId::Visual { page, visual } => self
                .pages_dir()
                .join(page)
                .join("visuals")
                .join(visual)
                .join("visual.json"),
        }
    }

    fn require_pbir(&self) -> anyhow::Result<()> {
        match self.format()? {
            ReportFormat::Pbir => Ok(()),
            other => Err(StoreError::NotPbir {
                report: self.name.clone(),
                format: other.to_string(),
            }
            .into()),
        }
    }

    fn page_ids(&self) -> anyhow::Result<Vec<String>> {
        let pages_json = self.pages_dir().join("pages.json");
        if pages_json.exists() {
            let doc = read_json(&pages_json)?;
            if let Some(order) = doc.get("pageOrder").and_then(Value::as_array) {
                let ids: Vec<String> = order
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .filter(|id| self.pages_dir().join(id).join("page.json").exists())
                    .collect();
                if !ids.is_empty() {
                    return Ok(ids);
                }
            }
        }
        sorted_child_dirs(&self.pages_dir(), "page.json")
    }
}

impl ReportStore for FsReportStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> anyhow::Result<ReportFormat> {
        if self.definition_dir().is_dir() {
            Ok(ReportFormat::Pbir)
        } else if self.root.join("report.json").exists() {
            Ok(ReportFormat::PbirLegacy)
        } else {
            Err(StoreError::InvalidLayout {
                report: self.name.clone(),
                reason: "neither definition/ nor report.json found".to_string(),
            }
            .into())
        }
    }

    fn pages(&self) -> anyhow::Result<Vec<PageRef>> {
        self.require_pbir()?;
        let mut out = Vec::new();
        for id in self.page_ids()? {
            let doc = self.read(&DocId::page(id.clone()))?;
            let display_name = doc
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or(&id)
                .to_string();
            out.push(PageRef { id, display_name });
        }
        Ok(out)
    }

    fn visuals(&self, page: &str) -> anyhow::Result<Vec<String>> {
        self.require_pbir()?;
        sorted_child_dirs(&self.pages_dir().join(page).join("visuals"), "visual.json")
    }

    fn read(&self, id: &DocId) -> anyhow::Result<Value> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::MissingDocument {
                report: self.name.clone(),
                id: id.to_string(),
            }
            .into());
        }
        read_json(&path)
    }

    fn write(&mut self, id: &DocId, doc: &Value) -> anyhow::Result<()> {
        let path = self.path_for(id);
        let mut contents = serde_json::to_string_pretty(doc).context("serialize document")?;
        contents.push('\n');
        fs::write(&path, contents).with_context(|| format!("write {}", path))?;
        debug!(report = self.name.as_str(), doc = %id, "wrote document");
        Ok(())
    }

    fn upgrade_format(&mut self) -> anyhow::Result<ReportFormat> {
        match self.format()? {
            ReportFormat::Pbir => Ok(ReportFormat::Pbir),
            _ => Err(StoreError::UpgradeUnsupported {
                report: self.name.clone(),
                reason: "the service converts PBIRLegacy definitions; save the report with the \
                         enhanced report format enabled and re-run"
                    .to_string(),
            }
            .into()),
        }
    }
}

fn read_json(path: &Utf8Path) -> anyhow::Result<Value> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path))
}

fn sorted_child_dirs(dir: &Utf8Path, marker: &str) -> anyhow::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("list {}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if !path.join(marker).is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            out.push(name.to_string());
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Utf8Path, rel: &str, v: Value) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&v).unwrap()).unwrap();
    }

    fn report_dir() -> (TempDir, Utf8PathBuf) {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().join("Sales.Report")).unwrap();
        write(
            &root,
            "definition.pbir",
            json!({"version": "4.0", "datasetReference": {"byPath": {"path": "../Sales.SemanticModel"}}}),
        );
        write(&root, "definition/report.json", json!({"themeCollection": {}}));
        write(
            &root,
            "definition/pages/pages.json",
            json!({"pageOrder": ["p2", "p1"], "activePageName": "p2"}),
        );
        write(
            &root,
            "definition/pages/p1/page.json",
            json!({"name": "p1", "displayName": "Details", "width": 1280, "height": 720}),
        );
        write(
            &root,
            "definition/pages/p2/page.json",
            json!({"name": "p2", "displayName": "Overview", "width": 1280, "height": 720}),
        );
        write(
            &root,
            "definition/pages/p2/visuals/b/visual.json",
            json!({"name": "b", "visual": {"visualType": "pieChart"}}),
        );
        write(
            &root,
            "definition/pages/p2/visuals/a/visual.json",
            json!({"name": "a", "visual": {"visualType": "card"}}),
        );
        (td, root)
    }

    #[test]
    fn pages_follow_page_order() {
        let (_td, root) = report_dir();
        let store = FsReportStore::open(root).unwrap();
        assert_eq!(store.name(), "Sales");
        let ids: Vec<_> = store.pages().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[test]
    fn visuals_are_sorted() {
        let (_td, root) = report_dir();
        let store = FsReportStore::open(root).unwrap();
        assert_eq!(store.visuals("p2").unwrap(), vec!["a", "b"]);
        assert!(store.visuals("p1").unwrap().is_empty());
    }

    #[test]
    fn write_then_read_preserves_unknown_keys() {
        let (_td, root) = report_dir();
        let mut store = FsReportStore::open(root).unwrap();
        let id = DocId::page("p1");
        let mut doc = store.read(&id).unwrap();
        doc["width"] = json!(1920);
        store.write(&id, &doc).unwrap();

        let back = store.read(&id).unwrap();
        assert_eq!(back["width"], 1920);
        assert_eq!(back["displayName"], "Details");
        let keys: Vec<_> = back.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "displayName", "width", "height"]);
    }

    #[test]
    fn dataset_path_comes_from_definition_pbir() {
        let (_td, root) = report_dir();
        let store = FsReportStore::open(root).unwrap();
        assert_eq!(
            store.dataset_path().unwrap().as_deref(),
            Some("../Sales.SemanticModel")
        );
    }

    #[test]
    fn legacy_report_refuses_pbir_access() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().join("Old.Report")).unwrap();
        write(&root, "report.json", json!({"sections": []}));

        let mut store = FsReportStore::open(root).unwrap();
        assert_eq!(store.format().unwrap(), ReportFormat::PbirLegacy);
        let err = store.pages().unwrap_err();
        assert!(err.to_string().contains("PBIRLegacy"));
        assert!(store.upgrade_format().is_err());
    }

    #[test]
    fn missing_document_is_reported_by_id() {
        let (_td, root) = report_dir();
        let store = FsReportStore::open(root).unwrap();
        let err = store.read(&DocId::visual("p1", "zz")).unwrap_err();
        assert!(err.to_string().contains("pages/p1/visuals/zz"));
    }
}
