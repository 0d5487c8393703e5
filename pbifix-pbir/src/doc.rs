use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one report document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocId {
    Page { page: String },
    Visual { page: String, visual: String },
}

impl DocId {
    pub fn page(page: impl Into<String>) -> Self {
        DocId::Page { page: page.into() }
    }

    pub fn visual(page: impl Into<String>, visual: impl Into<String>) -> Self {
        DocId::Visual {
            page: page.into(),
            visual: visual.into(),
        }
    }

    pub fn kind(&self) -> DocKind {
        match self {
            DocId::Page { .. } => DocKind::Page,
            DocId::Visual { .. } => DocKind::Visual,
        }
    }

    pub fn page_id(&self) -> &str {
        match self {
            DocId::Page { page } | DocId::Visual { page, .. } => page,
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Page { page } => write!(f, "pages/{page}"),
            DocId::Visual { page, visual } => write!(f, "pages/{page}/visuals/{visual}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Page,
    Visual,
}

impl DocKind {
    pub fn noun(self) -> &'static str {
        match self {
            DocKind::Page => "page",
            DocKind::Visual => "visual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    pub display_name: String,
}

impl PageRef {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Matches the page id exactly or the display name case-insensitively.
    pub fn matches(&self, query: &str) -> bool {
        self.id == query || self.display_name.eq_ignore_ascii_case(query.trim())
    }
}

/// Pages a report-layer fixer is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageScope {
    #[default]
    All,
    Page(String),
}

impl PageScope {
    pub fn contains(&self, page_id: &str) -> bool {
        match self {
            PageScope::All => true,
            PageScope::Page(id) => id == page_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    #[serde(rename = "PBIR")]
    Pbir,
    #[serde(rename = "PBIRLegacy")]
    PbirLegacy,
    #[serde(untagged)]
    Other(String),
}

impl ReportFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "PBIR" => ReportFormat::Pbir,
            "PBIRLegacy" => ReportFormat::PbirLegacy,
            other => ReportFormat::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Pbir => f.write_str("PBIR"),
            ReportFormat::PbirLegacy => f.write_str("PBIRLegacy"),
            ReportFormat::Other(s) => f.write_str(s),
        }
    }
}
