//! Default filesystem-backed and scripted port implementations.
//!
//! The filesystem layout is one directory per workspace:
//!
//! ```text
//! <root>/<Workspace>/<Report>.Report/
//! <root>/<Workspace>/<Model>.SemanticModel/model.bim
//! ```

use crate::ports::{
    Catalog, Confirmation, ConfirmationRequest, DatasetRef, FixerChoice, ModelConnector,
    Selector,
};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use pbifix_pbir::{FsReportStore, PageRef, ReportStore};
use pbifix_tom::{BimFileSession, ModelSession};
use pbifix_types::RunMode;
use tracing::debug;

const REPORT_SUFFIX: &str = ".Report";
const MODEL_SUFFIX: &str = ".SemanticModel";
const MODEL_FILE: &str = "model.bim";

/// Workspaces and reports from a directory tree.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    pub root: Utf8PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn report_dir(&self, workspace: &str, report: &str) -> Utf8PathBuf {
        self.root
            .join(workspace)
            .join(format!("{report}{REPORT_SUFFIX}"))
    }
}

fn child_dirs(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("read directory {dir}"))?
    {
        let entry = entry.with_context(|| format!("read directory {dir}"))?;
        if entry.path().is_dir() {
            out.push(entry.file_name().to_string());
        }
    }
    out.sort();
    Ok(out)
}

impl Catalog for FsCatalog {
    fn workspaces(&self) -> anyhow::Result<Vec<String>> {
        Ok(child_dirs(&self.root)?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect())
    }

    fn reports(&self, workspace: &str) -> anyhow::Result<Vec<String>> {
        Ok(child_dirs(&self.root.join(workspace))?
            .into_iter()
            .filter_map(|name| name.strip_suffix(REPORT_SUFFIX).map(str::to_string))
            .collect())
    }

    fn open_report(&self, workspace: &str, report: &str) -> anyhow::Result<Box<dyn ReportStore>> {
        let store = FsReportStore::open(self.report_dir(workspace, report))?;
        Ok(Box::new(store))
    }

    fn dataset_for_report(&self, workspace: &str, report: &str) -> anyhow::Result<DatasetRef> {
        let store = FsReportStore::open(self.report_dir(workspace, report))?;
        let by_path = store.dataset_path()?.with_context(|| {
            format!("report '{report}' is not bound to a semantic model folder in definition.pbir")
        })?;
        let model_dir = store.root().join(&by_path);
        let folder = model_dir.file_name().unwrap_or_default();
        let name = folder.strip_suffix(MODEL_SUFFIX).unwrap_or(folder).to_string();
        debug!(report, dataset = name.as_str(), path = %model_dir, "resolved semantic model");
        Ok(DatasetRef {
            workspace: workspace.to_string(),
            name,
            path: Some(model_dir.join(MODEL_FILE)),
        })
    }
}

/// Opens `model.bim` files as model sessions.
#[derive(Debug, Clone)]
pub struct FsModelConnector {
    pub root: Utf8PathBuf,
}

impl FsModelConnector {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelConnector for FsModelConnector {
    fn connect(
        &self,
        dataset: &DatasetRef,
        readonly: bool,
    ) -> anyhow::Result<Box<dyn ModelSession>> {
        let path = dataset.path.clone().unwrap_or_else(|| {
            self.root
                .join(&dataset.workspace)
                .join(format!("{}{MODEL_SUFFIX}", dataset.name))
                .join(MODEL_FILE)
        });
        let session = BimFileSession::open(path, dataset.name.clone(), readonly)?;
        Ok(Box::new(session))
    }
}

/// Confirms every request (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&mut self, _request: &ConfirmationRequest) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Declines every request, remembering what was asked.
#[derive(Debug, Clone, Default)]
pub struct NeverConfirm {
    pub asked: Vec<ConfirmationRequest>,
}

impl Confirmation for NeverConfirm {
    fn confirm(&mut self, request: &ConfirmationRequest) -> anyhow::Result<bool> {
        self.asked.push(request.clone());
        Ok(false)
    }
}

/// A selector with fixed answers, for non-interactive runs and tests.
///
/// Unset answers choose nothing, except the page (all pages) and the mode (scan).
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    pub workspace: Option<String>,
    pub report: Option<String>,
    pub page: Option<String>,
    pub fixers: Vec<String>,
    pub mode: Option<RunMode>,
}

impl Selector for ScriptedSelector {
    fn choose_workspace(&mut self, _workspaces: &[String]) -> anyhow::Result<Option<String>> {
        Ok(self.workspace.clone())
    }

    fn choose_report(
        &mut self,
        _workspace: &str,
        _reports: &[String],
    ) -> anyhow::Result<Option<String>> {
        Ok(self.report.clone())
    }

    fn choose_page(&mut self, _pages: &[PageRef]) -> anyhow::Result<Option<String>> {
        Ok(self.page.clone())
    }

    fn choose_fixers(&mut self, _fixers: &[FixerChoice]) -> anyhow::Result<Vec<String>> {
        Ok(self.fixers.clone())
    }

    fn choose_mode(&mut self) -> anyhow::Result<RunMode> {
        Ok(self.mode.unwrap_or_default())
    }
}
