//! The orchestrator state machine.
//!
//! ```text
//! Idle -> Selecting -> [Scanning] -> [AwaitingConfirmation] -> [Applying] -> Reporting -> Idle
//! ```
//!
//! Every abort before `Applying` happens before any mutation. Once fixers run, a failing fixer
//! only fails its own change-log entry.

use crate::error::RunError;
use crate::ports::{
    Catalog, Confirmation, ConfirmationRequest, FixerChoice, ModelConnector, Selector,
};
use crate::settings::RunSettings;
use anyhow::Context;
use pbifix_fixers::{Fixer, Registry};
use pbifix_pbir::{PageRef, PageScope, ReportStore, StoreError};
use pbifix_tom::ModelSession;
use pbifix_types::{
    Assessment, ChangeEntry, ChangeLog, FixPlan, Layer, Outcome, RunMode, RunTarget,
};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Selecting,
    Scanning,
    AwaitingConfirmation,
    Applying,
    Reporting,
}

/// A possibly incomplete selection. Missing parts are asked from a [`Selector`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub workspace: Option<String>,
    pub report: Option<String>,
    pub page: Option<String>,
    /// Empty means "ask".
    pub fixers: Vec<String>,
    pub mode: Option<RunMode>,
}

#[derive(Debug)]
struct StateTrail {
    state: RunState,
    history: Vec<RunState>,
}

impl StateTrail {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            history: vec![RunState::Idle],
        }
    }

    fn enter(&mut self, state: RunState) {
        debug!(from = ?self.state, to = ?state, "orchestrator state");
        self.state = state;
        self.history.push(state);
    }
}

pub struct Orchestrator {
    registry: Registry,
    catalog: Box<dyn Catalog>,
    connector: Box<dyn ModelConnector>,
    trail: StateTrail,
}

impl Orchestrator {
    pub fn new(
        registry: Registry,
        catalog: impl Catalog + 'static,
        connector: impl ModelConnector + 'static,
    ) -> Self {
        Self {
            registry,
            catalog: Box::new(catalog),
            connector: Box::new(connector),
            trail: StateTrail::new(),
        }
    }

    pub fn with_settings(
        settings: &RunSettings,
        catalog: impl Catalog + 'static,
        connector: impl ModelConnector + 'static,
    ) -> Self {
        Self::new(settings.registry(), catalog, connector)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> RunState {
        self.trail.state
    }

    /// States visited by the last run, starting and ending with `Idle`.
    pub fn history(&self) -> &[RunState] {
        &self.trail.history
    }

    /// Runs a complete plan.
    pub fn run(
        &mut self,
        plan: &FixPlan,
        confirmation: &mut dyn Confirmation,
    ) -> Result<ChangeLog, RunError> {
        self.trail = StateTrail::new();
        self.trail.enter(RunState::Selecting);
        let result = self.execute(plan, confirmation);
        self.trail.enter(RunState::Idle);
        result
    }

    /// Completes `request` through `selector`, then runs it.
    pub fn select_and_run(
        &mut self,
        request: RunRequest,
        selector: &mut dyn Selector,
        confirmation: &mut dyn Confirmation,
    ) -> Result<ChangeLog, RunError> {
        self.trail = StateTrail::new();
        self.trail.enter(RunState::Selecting);
        let result = self
            .resolve(request, selector)
            .and_then(|plan| self.execute(&plan, confirmation));
        self.trail.enter(RunState::Idle);
        result
    }

    fn resolve(
        &self,
        request: RunRequest,
        selector: &mut dyn Selector,
    ) -> Result<FixPlan, RunError> {
        let workspace = match request.workspace {
            Some(w) => w,
            None => {
                let options = self
                    .catalog
                    .workspaces()
                    .map_err(|e| RunError::connection("the workspace catalog", &e))?;
                selector
                    .choose_workspace(&options)
                    .map_err(selection_failed)?
                    .ok_or_else(|| RunError::precondition("no workspace selected"))?
            }
        };

        let report = match request.report {
            Some(r) => r,
            None => {
                let options = self
                    .catalog
                    .reports(&workspace)
                    .map_err(|e| RunError::connection(format!("workspace '{workspace}'"), &e))?;
                selector
                    .choose_report(&workspace, &options)
                    .map_err(selection_failed)?
                    .ok_or_else(|| RunError::precondition("no report selected"))?
            }
        };

        let page = match request.page {
            Some(p) => Some(p),
            None => {
                let store = open_known_report(self.catalog.as_ref(), &workspace, &report)?;
                let pages = selectable_pages(store.as_ref())?;
                selector.choose_page(&pages).map_err(selection_failed)?
            }
        };

        let fixers = if request.fixers.is_empty() {
            let choices: Vec<FixerChoice> = self
                .registry
                .iter()
                .map(|f| {
                    let meta = f.meta();
                    FixerChoice {
                        key: meta.key,
                        title: meta.title,
                        layer: meta.layer,
                    }
                })
                .collect();
            selector.choose_fixers(&choices).map_err(selection_failed)?
        } else {
            request.fixers
        };

        let mode = match request.mode {
            Some(m) => m,
            None => selector.choose_mode().map_err(selection_failed)?,
        };

        let mut plan = FixPlan::new(workspace, report, mode).with_fixers(fixers);
        plan.page = page;
        Ok(plan)
    }

    fn execute(
        &mut self,
        plan: &FixPlan,
        confirmation: &mut dyn Confirmation,
    ) -> Result<ChangeLog, RunError> {
        let registry = &self.registry;
        let trail = &mut self.trail;

        // Selecting: everything that can abort the run is checked before any fixer runs.
        if plan.fixers.is_empty() {
            return Err(RunError::precondition("no fixers selected"));
        }
        let selected = registry.select(&plan.fixers).map_err(|e| RunError::NotFound {
            kind: "fixer",
            name: e.0,
        })?;

        let mut report = open_known_report(self.catalog.as_ref(), &plan.workspace, &plan.report)?;
        let report_target = format!("report '{}'", plan.report);

        let scope = match &plan.page {
            None => PageScope::All,
            Some(query) => {
                let page = report
                    .find_page(query)
                    .map_err(|e| RunError::connection(report_target.as_str(), &e))?
                    .ok_or_else(|| RunError::NotFound {
                        kind: "page",
                        name: query.clone(),
                    })?;
                PageScope::Page(page.id)
            }
        };

        let model_fixers: Vec<&str> = selected
            .iter()
            .filter(|f| f.layer().is_model())
            .map(|f| f.meta().title)
            .collect();
        let mut session: Option<Box<dyn ModelSession>> = None;
        if !model_fixers.is_empty() {
            let dataset = self
                .catalog
                .dataset_for_report(&plan.workspace, &plan.report)
                .map_err(|e| {
                    RunError::connection(format!("the semantic model of {report_target}"), &e)
                })?;
            let readonly = !plan.mode.fixes();
            let opened = self.connector.connect(&dataset, readonly).map_err(|e| {
                RunError::connection(format!("semantic model '{}'", dataset.name), &e)
            })?;
            info!(dataset = dataset.name.as_str(), readonly, "connected to semantic model");
            session = Some(opened);
        }

        let mut log = ChangeLog::new(
            plan.mode,
            RunTarget {
                workspace: plan.workspace.clone(),
                report: plan.report.clone(),
                page: match &scope {
                    PageScope::All => None,
                    PageScope::Page(id) => Some(id.clone()),
                },
                dataset: session.as_ref().map(|s| s.dataset().to_string()),
            },
        );
        let mut entries: Vec<ChangeEntry> = selected
            .iter()
            .map(|f| {
                let meta = f.meta();
                ChangeEntry::new(meta.key, meta.title, meta.layer)
            })
            .collect();

        if plan.mode.scans() {
            trail.enter(RunState::Scanning);
            for (fixer, entry) in selected.iter().zip(entries.iter_mut()) {
                match assess(fixer, report.as_ref(), &scope, &session) {
                    Ok(assessment) => entry.record_scan(assessment),
                    Err(e) => record_failure(entry, &e),
                }
            }
        }

        let mut save_error = None;
        if plan.mode.fixes() {
            if let Some(session) = &session {
                trail.enter(RunState::AwaitingConfirmation);
                let request = ConfirmationRequest {
                    dataset: session.dataset().to_string(),
                    mode: plan.mode,
                    fixers: model_fixers.iter().map(|t| t.to_string()).collect(),
                };
                let confirmed = confirmation.confirm(&request).map_err(|e| {
                    RunError::precondition(format!("confirmation failed: {e:#}"))
                })?;
                if !confirmed {
                    return Err(RunError::precondition(format!(
                        "changes to semantic model '{}' were not confirmed",
                        request.dataset
                    )));
                }
            }

            trail.enter(RunState::Applying);
            for (fixer, entry) in selected.iter().zip(entries.iter_mut()) {
                if plan.mode == RunMode::ScanFix {
                    if !entry.scan_would_change() {
                        continue;
                    }
                    // The scan result is only trusted while it still holds.
                    match assess(fixer, report.as_ref(), &scope, &session) {
                        Ok(fresh) if !fresh.would_change => {
                            entry.record_stale(format!(
                                "scan is stale ({}); nothing applied, scan again",
                                fresh.detail
                            ));
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            record_failure(entry, &e);
                            continue;
                        }
                    }
                }
                match apply(fixer, report.as_mut(), &scope, &mut session) {
                    Ok(outcome) => entry.record_apply(outcome.changed, outcome.detail),
                    Err(e) => record_failure(entry, &e),
                }
            }

            if let Some(session) = session.as_mut() {
                if session.has_changes() {
                    match session.save_changes() {
                        Ok(()) => info!(dataset = session.dataset(), "saved semantic model"),
                        Err(e) => {
                            warn!(dataset = session.dataset(), error = %format!("{e:#}"), "saving semantic model failed");
                            save_error = Some(format!(
                                "saving semantic model '{}' failed: {e:#}",
                                session.dataset()
                            ));
                        }
                    }
                }
            }
        }

        trail.enter(RunState::Reporting);
        for entry in entries {
            info!(
                fixer = entry.fixer.as_str(),
                status = entry.status.label(),
                "{}",
                entry.detail
            );
            log.push(entry);
        }
        if let Some(message) = save_error {
            log.fail_applied(Layer::Model, &message);
        }
        log.finish();
        Ok(log)
    }
}

/// Opens a report after checking that its workspace and the report itself are listed.
fn open_known_report(
    catalog: &dyn Catalog,
    workspace: &str,
    report: &str,
) -> Result<Box<dyn ReportStore>, RunError> {
    let workspaces = catalog
        .workspaces()
        .map_err(|e| RunError::connection("the workspace catalog", &e))?;
    if !workspaces.iter().any(|w| w == workspace) {
        return Err(RunError::NotFound {
            kind: "workspace",
            name: workspace.to_string(),
        });
    }
    let reports = catalog
        .reports(workspace)
        .map_err(|e| RunError::connection(format!("workspace '{workspace}'"), &e))?;
    if !reports.iter().any(|r| r == report) {
        return Err(RunError::NotFound {
            kind: "report",
            name: report.to_string(),
        });
    }
    catalog
        .open_report(workspace, report)
        .map_err(|e| RunError::connection(format!("report '{report}'"), &e))
}

/// Pages offered for selection. A PBIRLegacy report has no page documents, so it offers none.
fn selectable_pages(report: &dyn ReportStore) -> Result<Vec<PageRef>, RunError> {
    match report.pages() {
        Ok(pages) => Ok(pages),
        Err(e) if matches!(e.downcast_ref::<StoreError>(), Some(StoreError::NotPbir { .. })) => {
            debug!(report = report.name(), "legacy report, no pages to offer");
            Ok(Vec::new())
        }
        Err(e) => Err(RunError::connection(
            format!("report '{}'", report.name()),
            &e,
        )),
    }
}

fn selection_failed(err: anyhow::Error) -> RunError {
    RunError::precondition(format!("selection failed: {err:#}"))
}

fn record_failure(entry: &mut ChangeEntry, err: &anyhow::Error) {
    let err = RunError::apply(entry.fixer.as_str(), err);
    warn!(fixer = entry.fixer.as_str(), "{err}");
    entry.record_failure(err.to_string());
}

fn assess(
    fixer: &Fixer,
    report: &dyn ReportStore,
    scope: &PageScope,
    session: &Option<Box<dyn ModelSession>>,
) -> anyhow::Result<Assessment> {
    match fixer {
        Fixer::Report(f) => f.assess(report, scope),
        Fixer::Model(f) => {
            let session = session
                .as_deref()
                .context("no semantic model session is open")?;
            f.assess(session.model())
        }
    }
}

fn apply(
    fixer: &Fixer,
    report: &mut dyn ReportStore,
    scope: &PageScope,
    session: &mut Option<Box<dyn ModelSession>>,
) -> anyhow::Result<Outcome> {
    match fixer {
        Fixer::Report(f) => f.apply(report, scope),
        Fixer::Model(f) => {
            let session = session
                .as_deref_mut()
                .context("no semantic model session is open")?;
            f.apply(session)
        }
    }
}
