//! Port traits abstracting artifact access and user interaction away from the orchestrator.

use camino::Utf8PathBuf;
use pbifix_pbir::{PageRef, ReportStore};
use pbifix_tom::ModelSession;
use pbifix_types::{Layer, RunMode};
use serde::Serialize;

/// The semantic model a report is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRef {
    pub workspace: String,
    pub name: String,

    /// Location of the model definition, when the catalog knows it.
    pub path: Option<Utf8PathBuf>,
}

/// Workspaces and the reports in them.
pub trait Catalog {
    fn workspaces(&self) -> anyhow::Result<Vec<String>>;

    fn reports(&self, workspace: &str) -> anyhow::Result<Vec<String>>;

    fn open_report(&self, workspace: &str, report: &str) -> anyhow::Result<Box<dyn ReportStore>>;

    fn dataset_for_report(&self, workspace: &str, report: &str) -> anyhow::Result<DatasetRef>;
}

/// Opens sessions on semantic models.
pub trait ModelConnector {
    /// A read-only session refuses every mutation.
    fn connect(&self, dataset: &DatasetRef, readonly: bool)
    -> anyhow::Result<Box<dyn ModelSession>>;
}

/// A registry entry as offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixerChoice {
    pub key: &'static str,
    pub title: &'static str,
    pub layer: Layer,
}

/// Fills in the parts of a run request the caller left open.
///
/// Returning `None` (or no fixers) means nothing was chosen.
pub trait Selector {
    fn choose_workspace(&mut self, workspaces: &[String]) -> anyhow::Result<Option<String>>;

    fn choose_report(
        &mut self,
        workspace: &str,
        reports: &[String],
    ) -> anyhow::Result<Option<String>>;

    /// `None` runs report fixers on every page.
    fn choose_page(&mut self, pages: &[PageRef]) -> anyhow::Result<Option<String>>;

    fn choose_fixers(&mut self, fixers: &[FixerChoice]) -> anyhow::Result<Vec<String>>;

    fn choose_mode(&mut self) -> anyhow::Result<RunMode>;
}

/// What the user is asked to confirm before the semantic model is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRequest {
    pub dataset: String,
    pub mode: RunMode,
    /// Titles of the model-layer fixers that may write.
    pub fixers: Vec<String>,
}

pub trait Confirmation {
    fn confirm(&mut self, request: &ConfirmationRequest) -> anyhow::Result<bool>;
}
