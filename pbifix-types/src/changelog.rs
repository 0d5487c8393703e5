use crate::assess::Assessment;
use crate::mode::{Layer, RunMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Scan found nothing to do.
    Clean,
    /// Scan found pending work; nothing was written.
    WouldChange,
    /// The fixer wrote at least one change.
    Applied,
    /// The fixer ran and found the target already in the desired state.
    Unchanged,
    /// Scan and a fresh assessment disagreed; nothing was written.
    Stale,
    Failed,
}

impl EntryStatus {
    pub fn label(self) -> &'static str {
        match self {
            EntryStatus::Clean => "clean",
            EntryStatus::WouldChange => "would change",
            EntryStatus::Applied => "applied",
            EntryStatus::Unchanged => "unchanged",
            EntryStatus::Stale => "stale",
            EntryStatus::Failed => "failed",
        }
    }
}

/// One record per selected fixer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub fixer: String,
    pub title: String,
    pub layer: Layer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<Assessment>,

    pub applied: bool,

    #[serde(default)]
    pub changed: u64,

    pub status: EntryStatus,
    pub detail: String,
}

impl ChangeEntry {
    pub fn new(fixer: impl Into<String>, title: impl Into<String>, layer: Layer) -> Self {
        Self {
            fixer: fixer.into(),
            title: title.into(),
            layer,
            scan: None,
            applied: false,
            changed: 0,
            status: EntryStatus::Clean,
            detail: String::new(),
        }
    }

    pub fn record_scan(&mut self, assessment: Assessment) {
        self.status = if assessment.would_change {
            EntryStatus::WouldChange
        } else {
            EntryStatus::Clean
        };
        self.detail = assessment.detail.clone();
        self.scan = Some(assessment);
    }

    pub fn record_apply(&mut self, changed: u64, detail: impl Into<String>) {
        self.applied = changed > 0;
        self.changed = changed;
        self.status = if changed > 0 {
            EntryStatus::Applied
        } else {
            EntryStatus::Unchanged
        };
        self.detail = detail.into();
    }

    pub fn record_stale(&mut self, detail: impl Into<String>) {
        self.applied = false;
        self.changed = 0;
        self.status = EntryStatus::Stale;
        self.detail = detail.into();
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.applied = false;
        self.status = EntryStatus::Failed;
        self.detail = message.into();
    }

    pub fn scan_would_change(&self) -> bool {
        self.scan.as_ref().is_some_and(|s| s.would_change)
    }

    pub fn is_failed(&self) -> bool {
        self.status == EntryStatus::Failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTarget {
    pub workspace: String,
    pub report: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Semantic model behind the report, when a model-layer fixer ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total: u64,
    pub clean: u64,
    pub would_change: u64,
    pub applied: u64,
    pub unchanged: u64,
    pub stale: u64,
    pub failed: u64,
}

/// Ordered, append-only record of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLog {
    pub schema: String,
    pub run_id: Uuid,
    pub mode: RunMode,
    pub target: RunTarget,
    pub run: RunInfo,

    #[serde(default)]
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new(mode: RunMode, target: RunTarget) -> Self {
        Self {
            schema: crate::schema::PBIFIX_CHANGE_LOG_V1.to_string(),
            run_id: Uuid::new_v4(),
            mode,
            target,
            run: RunInfo {
                started_at: Some(Utc::now()),
                ended_at: None,
            },
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ChangeEntry) {
        self.entries.push(entry);
    }

    pub fn finish(&mut self) {
        self.run.ended_at = Some(Utc::now());
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks every applied entry of `layer` as failed, e.g. when the batch could not be
    /// persisted. Returns how many entries were affected.
    pub fn fail_applied(&mut self, layer: Layer, message: &str) -> usize {
        let mut n = 0;
        for e in self
            .entries
            .iter_mut()
            .filter(|e| e.layer == layer && e.status == EntryStatus::Applied)
        {
            e.record_failure(format!("{message} (was: {})", e.detail));
            n += 1;
        }
        n
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(ChangeEntry::is_failed)
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut s = ChangeSummary {
            total: self.entries.len() as u64,
            ..Default::default()
        };
        for e in &self.entries {
            match e.status {
                EntryStatus::Clean => s.clean += 1,
                EntryStatus::WouldChange => s.would_change += 1,
                EntryStatus::Applied => s.applied += 1,
                EntryStatus::Unchanged => s.unchanged += 1,
                EntryStatus::Stale => s.stale += 1,
                EntryStatus::Failed => s.failed += 1,
            }
        }
        s
    }
}
