use serde::{Deserialize, Serialize};

/// Result of a read-only scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub would_change: bool,
    pub detail: String,

    /// Objects that would be touched (document ids, table or measure names).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Unified diff of the rewrite, when the fixer can produce one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Assessment {
    pub fn clean(detail: impl Into<String>) -> Self {
        Self {
            would_change: false,
            detail: detail.into(),
            targets: Vec::new(),
            preview: None,
        }
    }

    pub fn pending(detail: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            would_change: true,
            detail: detail.into(),
            targets,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: Option<String>) -> Self {
        self.preview = preview.filter(|p| !p.is_empty());
        self
    }
}

/// Result of an apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Number of documents or objects changed.
    pub changed: u64,
    pub detail: String,
}

impl Outcome {
    pub fn changed(changed: u64, detail: impl Into<String>) -> Self {
        Self {
            changed,
            detail: detail.into(),
        }
    }

    pub fn unchanged(detail: impl Into<String>) -> Self {
        Self {
            changed: 0,
            detail: detail.into(),
        }
    }

    pub fn made_change(&self) -> bool {
        self.changed > 0
    }
}

/// `1 page`, `3 visuals`.
pub fn count_noun(n: u64, singular: &str) -> String {
    if n == 1 {
        format!("1 {singular}")
    } else {
        format!("{n} {singular}s")
    }
}
