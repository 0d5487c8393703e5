use crate::doc::{DocId, PageRef, ReportFormat};
use crate::error::StoreError;
use crate::store::ReportStore;
use serde_json::Value;
use std::collections::BTreeMap;

/// In-memory report for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryReportStore {
    name: String,
    format: ReportFormat,
    pages: Vec<PageRef>,
    docs: BTreeMap<DocId, Value>,
    writes: usize,
}

impl InMemoryReportStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: ReportFormat::Pbir,
            pages: Vec::new(),
            docs: BTreeMap::new(),
            writes: 0,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds a page; `doc["displayName"]` is used as display name when present.
    pub fn with_page(mut self, id: &str, doc: Value) -> Self {
        let display_name = doc
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string();
        self.pages.push(PageRef::new(id, display_name));
        self.docs.insert(DocId::page(id), doc);
        self
    }

    pub fn with_visual(mut self, page: &str, id: &str, doc: Value) -> Self {
        self.docs.insert(DocId::visual(page, id), doc);
        self
    }

    /// Number of `write` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn get(&self, id: &DocId) -> Option<&Value> {
        self.docs.get(id)
    }
}

impl ReportStore for InMemoryReportStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> anyhow::Result<ReportFormat> {
        Ok(self.format.clone())
    }

    fn pages(&self) -> anyhow::Result<Vec<PageRef>> {
        if self.format != ReportFormat::Pbir {
            return Err(StoreError::NotPbir {
                report: self.name.clone(),
                format: self.format.to_string(),
            }
            .into());
        }
        Ok(self.pages.clone())
    }

    fn visuals(&self, page: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .docs
            .keys()
            .filter_map(|id| match id {
                DocId::Visual { page: p, visual } if p == page => Some(visual.clone()),
                _ => None,
            })
            .collect())
    }

    fn read(&self, id: &DocId) -> anyhow::Result<Value> {
        self.docs.get(id).cloned().ok_or_else(|| {
            StoreError::MissingDocument {
                report: self.name.clone(),
                id: id.to_string(),
            }
            .into()
        })
    }

    fn write(&mut self, id: &DocId, doc: &Value) -> anyhow::Result<()> {
        if !self.docs.contains_key(id) {
            return Err(StoreError::MissingDocument {
                report: self.name.clone(),
                id: id.to_string(),
            }
            .into());
        }
        self.docs.insert(id.clone(), doc.clone());
        self.writes += 1;
        Ok(())
    }

    fn upgrade_format(&mut self) -> anyhow::Result<ReportFormat> {
        match &self.format {
            ReportFormat::Pbir => {}
            ReportFormat::PbirLegacy => self.format = ReportFormat::Pbir,
            ReportFormat::Other(f) => {
                return Err(StoreError::UpgradeUnsupported {
                    report: self.name.clone(),
                    reason: format!("{f} reports cannot be converted"),
                }
                .into());
            }
        }
        Ok(self.format.clone())
    }
}
