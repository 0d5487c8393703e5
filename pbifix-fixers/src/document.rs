use crate::fixer::{FixerMeta, ReportFixer};
use anyhow::Context;
use diffy::PatchFormatter;
use pbifix_pbir::{DocId, DocKind, PageScope, ReportStore};
use pbifix_types::{count_noun, Assessment, Outcome};
use serde_json::Value;
use tracing::debug;

/// A per-document desired state.
///
/// `rewrite` must leave the document in a state where `needs_change` is false, and must not
/// touch keys the rule does not own.
pub trait DocumentRule {
    fn meta(&self) -> FixerMeta;

    fn kind(&self) -> DocKind;

    /// What the rule enforces, used in log details (`page size`, `pie charts`).
    fn subject(&self) -> &'static str;

    /// Whether the rule applies to this document at all.
    fn selects(&self, doc: &Value) -> bool;

    fn needs_change(&self, doc: &Value) -> bool;

    fn rewrite(&self, doc: &mut Value) -> anyhow::Result<()>;
}

/// Runs a [`DocumentRule`] over every document of its kind in scope.
pub struct DocumentFixer<R> {
    rule: R,
}

impl<R: DocumentRule> DocumentFixer<R> {
    pub fn new(rule: R) -> Self {
        Self { rule }
    }

    fn pending(
        &self,
        report: &dyn ReportStore,
        scope: &PageScope,
    ) -> anyhow::Result<Vec<(DocId, Value)>> {
        let mut out = Vec::new();
        for id in report.documents(scope, self.rule.kind())? {
            let doc = report.read(&id)?;
            if self.rule.selects(&doc) && self.rule.needs_change(&doc) {
                debug!(fixer = self.rule.meta().key, doc = %id, "document needs change");
                out.push((id, doc));
            }
        }
        Ok(out)
    }

    fn rewritten(&self, id: &DocId, doc: &Value) -> anyhow::Result<Value> {
        let mut next = doc.clone();
        self.rule
            .rewrite(&mut next)
            .with_context(|| format!("rewrite {id}"))?;
        if self.rule.selects(&next) && self.rule.needs_change(&next) {
            anyhow::bail!("rewrite of {id} did not reach the desired state");
        }
        Ok(next)
    }
}

impl<R: DocumentRule> ReportFixer for DocumentFixer<R> {
    fn meta(&self) -> FixerMeta {
        self.rule.meta()
    }

    fn assess(&self, report: &dyn ReportStore, scope: &PageScope) -> anyhow::Result<Assessment> {
        let pending = self.pending(report, scope)?;
        let noun = self.rule.kind().noun();
        if pending.is_empty() {
            return Ok(Assessment::clean(format!(
                "{} already correct: 0 changes",
                self.rule.subject()
            )));
        }

        let mut preview = String::new();
        for (id, doc) in &pending {
            let next = self.rewritten(id, doc)?;
            preview.push_str(&render_diff(id, doc, &next)?);
        }
        let targets = pending.iter().map(|(id, _)| id.to_string()).collect();
        Ok(Assessment::pending(
            format!(
                "{} needs update: {}",
                self.rule.subject(),
                count_noun(pending.len() as u64, noun)
            ),
            targets,
        )
        .with_preview(Some(preview)))
    }

    fn apply(
        &self,
        report: &mut dyn ReportStore,
        scope: &PageScope,
    ) -> anyhow::Result<Outcome> {
        let pending = self.pending(&*report, scope)?;
        if pending.is_empty() {
            return Ok(Outcome::unchanged(format!(
                "{} already correct: 0 changes",
                self.rule.subject()
            )));
        }

        let mut changed = 0u64;
        for (id, doc) in pending {
            let next = self.rewritten(&id, &doc)?;
            report.write(&id, &next)?;
            changed += 1;
        }
        Ok(Outcome::changed(
            changed,
            format!(
                "{} updated: {}",
                self.rule.subject(),
                count_noun(changed, self.rule.kind().noun())
            ),
        ))
    }
}

fn render_diff(id: &DocId, before: &Value, after: &Value) -> anyhow::Result<String> {
    let old = serde_json::to_string_pretty(before).context("serialize document")?;
    let new = serde_json::to_string_pretty(after).context("serialize document")?;
    let patch = diffy::create_patch(&old, &new);
    let body = PatchFormatter::new().fmt_patch(&patch).to_string();

    // diffy's own `--- original` / `+++ modified` header is replaced by the document id.
    let mut out = format!("--- a/{id}\n+++ b/{id}\n");
    for line in body.lines().skip(2) {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}
