//! Calculation groups that rewrite the selected measure.
//!
//! Both groups only touch measures listed in `ISSELECTEDMEASURE(...)`; ratio and percentage
//! measures are left out of that list, so scaling or time-shifting never reaches them.

use crate::fixer::{FixerMeta, ModelFixer};
use pbifix_tom::{
    CalculationGroup, CalculationItem, Column, Measure, Model, ModelSession, Partition, Table,
};
use pbifix_types::{count_noun, Assessment, Layer, Outcome};
use tracing::debug;

pub(crate) const UNITS_ROLE: &str = "units";
pub(crate) const TIME_INTELLIGENCE_ROLE: &str = "time-intelligence";

/// Measures a calculation group may rewrite: every non-ratio measure outside calculation
/// groups, in model order.
fn eligible_measures(model: &Model) -> Vec<&Measure> {
    model
        .measures()
        .filter(|(t, m)| !t.is_calculation_group() && !m.is_ratio())
        .map(|(_, m)| m)
        .collect()
}

fn measure_list(measures: &[&Measure]) -> String {
    measures
        .iter()
        .map(|m| m.reference())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The group already serving `role`, detected by marker or by name plus type.
fn existing_group<'m>(model: &'m Model, name: &str, role: &str) -> anyhow::Result<Option<&'m Table>> {
    if let Some(table) = model.table_with_role(role) {
        return Ok(Some(table));
    }
    match model.table(name) {
        Some(table) if table.is_calculation_group() => Ok(Some(table)),
        Some(_) => anyhow::bail!("table '{name}' already exists and is not a calculation group"),
        None => Ok(None),
    }
}

fn group_table(name: &str, role: &str, precedence: i64) -> Table {
    let mut table = Table::new(name);
    table.calculation_group = Some(CalculationGroup {
        precedence,
        ..Default::default()
    });

    let mut item_column = Column::new(name, "string");
    item_column.source_column = Some("Name".to_string());
    item_column.sort_by_column = Some("Ordinal".to_string());
    item_column.summarize_by = Some("none".to_string());
    let mut ordinal = Column::new("Ordinal", "int64");
    ordinal.source_column = Some("Ordinal".to_string());
    ordinal.is_hidden = Some(true);
    ordinal.summarize_by = Some("none".to_string());
    table.columns = vec![item_column, ordinal];

    let mut partition = Partition::new(format!("Partition {name}"), "calculationGroup", None);
    partition.mode = None;
    table.partitions = vec![partition];
    table.set_role(role);
    table
}

/// The group is assembled on a copy of the model; the session only sees the complete result.
fn create_group(
    session: &mut dyn ModelSession,
    name: &str,
    role: &str,
    items: Vec<CalculationItem>,
) -> anyhow::Result<()> {
    let mut next = session.model().clone();
    let precedence = next.next_calculation_group_precedence();
    next.add_table(group_table(name, role, precedence))?;
    for item in items {
        next.add_calculation_item(name, item)?;
    }
    next.set_discourage_implicit_measures(true);
    *session.model_mut()? = next;
    debug!(group = name, precedence, "added calculation group");
    Ok(())
}

fn guarded(list: &str, expression: &str, fallback: &str) -> String {
    format!("IF ( ISSELECTEDMEASURE ( {list} ), {expression}, {fallback} )")
}

/// Display-unit scaling: Actual, Thousands, Millions, Billions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitsGroup {
    name: String,
}

const SCALES: &[(&str, &str, &str)] = &[
    ("Thousands", "1000", "K"),
    ("Millions", "1000000", "M"),
    ("Billions", "1000000000", "B"),
];

impl UnitsGroup {
    pub const META: FixerMeta = FixerMeta {
        key: "calc-group-units",
        title: "Add Units Calculation Group",
        layer: Layer::Model,
        description: "Adds a calculation group with Actual, Thousands, Millions and Billions \
                      items that scale every non-ratio measure. Ratio and percentage measures \
                      are never scaled.",
    };

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn items(&self, measures: &[&Measure]) -> Vec<CalculationItem> {
        let list = measure_list(measures);
        let mut items = vec![CalculationItem::new("Actual", "SELECTEDMEASURE ()")];
        for (name, divisor, suffix) in SCALES {
            let expression = guarded(
                &list,
                &format!("SELECTEDMEASURE () / {divisor}"),
                "SELECTEDMEASURE ()",
            );
            let format = guarded(
                &list,
                &format!("\"#,0.0\"\"{suffix}\"\"\""),
                "SELECTEDMEASUREFORMATSTRING ()",
            );
            items.push(CalculationItem::new(*name, expression).with_format_string(format));
        }
        items
    }
}

impl ModelFixer for UnitsGroup {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        if let Some(existing) = existing_group(model, &self.name, UNITS_ROLE)? {
            return Ok(Assessment::clean(format!(
                "calculation group '{}' already present",
                existing.name
            )));
        }
        let measures = eligible_measures(model);
        if measures.is_empty() {
            return Ok(Assessment::clean("no non-ratio measures to scale"));
        }
        Ok(Assessment::pending(
            format!(
                "calculation group '{}' would be added for {}",
                self.name,
                count_noun(measures.len() as u64, "measure")
            ),
            measures.iter().map(|m| m.name.clone()).collect(),
        ))
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }
        let items = self.items(&eligible_measures(session.model()));
        create_group(session, &self.name, UNITS_ROLE, items)?;
        Ok(Outcome::changed(
            1,
            format!(
                "calculation group '{}' added for {}",
                self.name,
                count_noun(assessment.targets.len() as u64, "measure")
            ),
        ))
    }
}

/// Period comparisons over the marked date table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIntelligenceGroup {
    name: String,
}

impl TimeIntelligenceGroup {
    pub const META: FixerMeta = FixerMeta {
        key: "calc-group-time-intelligence",
        title: "Add Time Intelligence Calculation Group",
        layer: Layer::Model,
        description: "Adds a calculation group with Current, PY, YoY, YoY %, YTD, QTD and MTD \
                      items over the date table's key column. Needs a table marked as date \
                      table; ratio and percentage measures are never shifted.",
    };

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn date_column(model: &Model) -> anyhow::Result<String> {
        let table = model.date_table().ok_or_else(|| {
            anyhow::anyhow!("no table is marked as date table; add a calendar table first")
        })?;
        let key = table.date_key_column().ok_or_else(|| {
            anyhow::anyhow!("date table '{}' has no date key column", table.name)
        })?;
        Ok(key.qualified(&table.name))
    }

    fn items(&self, measures: &[&Measure], date: &str) -> Vec<CalculationItem> {
        let list = measure_list(measures);
        let prior = format!("CALCULATE ( SELECTEDMEASURE (), SAMEPERIODLASTYEAR ( {date} ) )");
        let shifted = [
            ("PY", prior.clone()),
            ("YoY", format!("SELECTEDMEASURE () - {prior}")),
            (
                "YoY %",
                format!("DIVIDE ( SELECTEDMEASURE () - {prior}, {prior} )"),
            ),
            (
                "YTD",
                format!("CALCULATE ( SELECTEDMEASURE (), DATESYTD ( {date} ) )"),
            ),
            (
                "QTD",
                format!("CALCULATE ( SELECTEDMEASURE (), DATESQTD ( {date} ) )"),
            ),
            (
                "MTD",
                format!("CALCULATE ( SELECTEDMEASURE (), DATESMTD ( {date} ) )"),
            ),
        ];

        let mut items = vec![CalculationItem::new("Current", "SELECTEDMEASURE ()")];
        for (name, expression) in shifted {
            let mut item = CalculationItem::new(name, guarded(&list, &expression, "BLANK ()"));
            if name == "YoY %" {
                item = item.with_format_string(guarded(
                    &list,
                    "\"0.0%\"",
                    "SELECTEDMEASUREFORMATSTRING ()",
                ));
            }
            items.push(item);
        }
        items
    }
}

impl ModelFixer for TimeIntelligenceGroup {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        if let Some(existing) = existing_group(model, &self.name, TIME_INTELLIGENCE_ROLE)? {
            return Ok(Assessment::clean(format!(
                "calculation group '{}' already present",
                existing.name
            )));
        }
        let measures = eligible_measures(model);
        if measures.is_empty() {
            return Ok(Assessment::clean("no non-ratio measures to shift"));
        }
        let date = Self::date_column(model)?;
        Ok(Assessment::pending(
            format!(
                "calculation group '{}' would be added over {date} for {}",
                self.name,
                count_noun(measures.len() as u64, "measure")
            ),
            measures.iter().map(|m| m.name.clone()).collect(),
        ))
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }
        let date = Self::date_column(session.model())?;
        let items = self.items(&eligible_measures(session.model()), &date);
        create_group(
            session,
            &self.name,
            TIME_INTELLIGENCE_ROLE,
            items,
        )?;
        Ok(Outcome::changed(
            1,
            format!(
                "calculation group '{}' added over {date} for {}",
                self.name,
                count_noun(assessment.targets.len() as u64, "measure")
            ),
        ))
    }
}
