use crate::mode::RunMode;
use serde::{Deserialize, Serialize};

/// The user's selection for one run.
///
/// Built when the selection is submitted and consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixPlan {
    pub workspace: String,
    pub report: String,

    /// Restricts report-layer fixers to one page (page id or display name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Fixer keys. Execution follows registry order, not the order given here.
    pub fixers: Vec<String>,

    pub mode: RunMode,
}

impl FixPlan {
    pub fn new(workspace: impl Into<String>, report: impl Into<String>, mode: RunMode) -> Self {
        Self {
            workspace: workspace.into(),
            report: report.into(),
            page: None,
            fixers: Vec::new(),
            mode,
        }
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_fixers<I, S>(mut self, fixers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixers = fixers.into_iter().map(Into::into).collect();
        self
    }
}
