use crate::fixer::{FixerMeta, ModelFixer};
use pbifix_tom::{Measure, Model, ModelSession, ROLE_ANNOTATION, SOURCE_COLUMN_ANNOTATION};
use pbifix_types::{count_noun, Assessment, Layer, Outcome};
use tracing::debug;

pub(crate) const EXPLICIT_MEASURE_ROLE: &str = "explicit-measure";

/// A column that still summarizes implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    table: String,
    column: String,
    qualified: String,
}

/// Every visible numeric column gets an explicit `SUM` measure and stops summarizing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitMeasures;

impl ExplicitMeasures {
    pub const META: FixerMeta = FixerMeta {
        key: "explicit-measures",
        title: "Add Explicit Measures",
        layer: Layer::Model,
        description: "Adds a 'Total <Column>' SUM measure for every visible numeric column that \
                      still summarizes implicitly, then sets the column to not summarize.",
    };
}

fn candidates(model: &Model) -> Vec<Candidate> {
    model
        .tables()
        .iter()
        .filter(|t| !t.is_calculation_group())
        .flat_map(|t| {
            t.columns
                .iter()
                .filter(|c| c.is_numeric() && !c.is_hidden() && c.summarizes())
                .filter(|c| c.kind.as_deref() != Some("rowNumber"))
                .map(|c| Candidate {
                    table: t.name.clone(),
                    column: c.name.clone(),
                    qualified: c.qualified(&t.name),
                })
        })
        .collect()
}

/// An existing measure already covering the column: marked for it, or an unmarked measure in
/// the same table named by convention.
fn has_explicit_measure(model: &Model, candidate: &Candidate) -> bool {
    let conventional = format!("Total {}", candidate.column);
    model
        .measures()
        .any(|(t, m)| match m.annotation(SOURCE_COLUMN_ANNOTATION) {
            Some(source) => source == candidate.qualified,
            None => t.name == candidate.table && m.name.eq_ignore_ascii_case(&conventional),
        })
}

fn free_name(model: &Model, candidate: &Candidate) -> String {
    let taken = |name: &str| {
        model.find_measure(name).is_some()
            || model
                .table(&candidate.table)
                .is_some_and(|t| t.column(name).is_some())
    };
    let base = format!("Total {}", candidate.column);
    if !taken(&base) {
        return base;
    }
    let qualified = format!("Total {} ({})", candidate.column, candidate.table);
    if !taken(&qualified) {
        return qualified;
    }
    (2..)
        .map(|n| format!("{qualified} {n}"))
        .find(|name| !taken(name))
        .unwrap_or(qualified)
}

impl ModelFixer for ExplicitMeasures {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        let pending = candidates(model);
        if pending.is_empty() {
            return Ok(Assessment::clean(
                "no numeric column summarizes implicitly",
            ));
        }
        Ok(Assessment::pending(
            format!(
                "{} would get explicit measures",
                count_noun(pending.len() as u64, "column")
            ),
            pending.into_iter().map(|c| c.qualified).collect(),
        ))
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }

        // Built on a copy so a failure part-way leaves the session untouched.
        let pending = candidates(session.model());
        let mut model = session.model().clone();
        let mut added = 0u64;
        for candidate in &pending {
            if !has_explicit_measure(&model, candidate) {
                let name = free_name(&model, candidate);
                let format_string = model
                    .table(&candidate.table)
                    .and_then(|t| t.column(&candidate.column))
                    .and_then(|c| c.format_string.clone());
                let mut measure =
                    Measure::new(name.clone(), format!("SUM ( {} )", candidate.qualified));
                measure.format_string = format_string;
                measure.set_annotation(ROLE_ANNOTATION, EXPLICIT_MEASURE_ROLE);
                measure.set_annotation(SOURCE_COLUMN_ANNOTATION, &candidate.qualified);
                model.add_measure(&candidate.table, measure)?;
                debug!(measure = %name, column = %candidate.qualified, "added explicit measure");
                added += 1;
            }
            if let Some(column) = model
                .table_mut(&candidate.table)
                .and_then(|t| t.column_mut(&candidate.column))
            {
                column.summarize_by = Some("none".to_string());
            }
        }
        *session.model_mut()? = model;

        Ok(Outcome::changed(
            pending.len() as u64,
            format!(
                "explicit measures added: {added}; {} set to not summarize",
                count_noun(pending.len() as u64, "column")
            ),
        ))
    }
}
