use crate::fixer::{FixerMeta, ModelFixer};
use pbifix_tom::{Column, DaxExpression, Model, ModelSession, Partition, Table};
use pbifix_types::{Assessment, Layer, Outcome};
use tracing::debug;

pub(crate) const CALENDAR_ROLE: &str = "calendar";

const CALENDAR_EXPRESSION: &[&str] = &[
    "ADDCOLUMNS (",
    "    CALENDARAUTO (),",
    "    \"Year\", YEAR ( [Date] ),",
    "    \"Quarter\", \"Q\" & QUARTER ( [Date] ),",
    "    \"Month Number\", MONTH ( [Date] ),",
    "    \"Month\", FORMAT ( [Date], \"MMM\" ),",
    "    \"Year Month\", FORMAT ( [Date], \"YYYY-MM\" )",
    ")",
];

/// A `CALENDARAUTO()` calculated table marked as the date table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarTable {
    name: String,
}

impl CalendarTable {
    pub const META: FixerMeta = FixerMeta {
        key: "calendar-table",
        title: "Add Calendar Table",
        layer: Layer::Model,
        description: "Adds a CALENDARAUTO() based calculated table with year, quarter and month \
                      columns and marks it as the date table. Skipped when the model already \
                      has a date table.",
    };

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn build(&self) -> Table {
        let mut table = Table::new(self.name.clone());

        let mut date = calculated_column("Date", "dateTime");
        date.is_key = Some(true);
        date.format_string = Some("yyyy-mm-dd".to_string());
        let mut year = calculated_column("Year", "int64");
        year.summarize_by = Some("none".to_string());
        let mut month_number = calculated_column("Month Number", "int64");
        month_number.summarize_by = Some("none".to_string());
        month_number.is_hidden = Some(true);
        let mut month = calculated_column("Month", "string");
        month.sort_by_column = Some("Month Number".to_string());

        table.columns = vec![
            date,
            year,
            calculated_column("Quarter", "string"),
            month_number,
            month,
            calculated_column("Year Month", "string"),
        ];
        let expression = DaxExpression::Lines(
            CALENDAR_EXPRESSION.iter().map(|l| l.to_string()).collect(),
        );
        table.partitions = vec![Partition::new(
            self.name.clone(),
            "calculated",
            Some(expression),
        )];
        table.mark_as_date_table();
        table.set_role(CALENDAR_ROLE);
        table
    }
}

fn calculated_column(name: &str, data_type: &str) -> Column {
    let mut column = Column::new(name, data_type);
    column.kind = Some("calculatedTableColumn".to_string());
    column.source_column = Some(format!("[{name}]"));
    column
}

impl ModelFixer for CalendarTable {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        if let Some(existing) = model.date_table() {
            return Ok(Assessment::clean(format!(
                "date table already present: '{}'",
                existing.name
            )));
        }
        if let Some(existing) = model.table_with_role(CALENDAR_ROLE) {
            return Ok(Assessment::clean(format!(
                "calendar table already present: '{}'",
                existing.name
            )));
        }
        if model.table(&self.name).is_some() {
            anyhow::bail!(
                "table '{}' already exists and is not marked as a date table",
                self.name
            );
        }
        Ok(Assessment::pending(
            format!(
                "calculated table '{}' would be added and marked as the date table",
                self.name
            ),
            vec![self.name.clone()],
        ))
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }
        session.model_mut()?.add_table(self.build())?;
        debug!(table = %self.name, "added calendar table");
        Ok(Outcome::changed(
            1,
            format!(
                "calculated table '{}' added and marked as the date table",
                self.name
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbifix_tom::InMemorySession;
    use pretty_assertions::assert_eq;

    #[test]
    fn built_table_is_a_date_table_with_key() {
        let table = CalendarTable::new("Calendar").build();
        assert!(table.is_date_table());
        assert_eq!(table.date_key_column().map(|c| c.name.as_str()), Some("Date"));
        assert_eq!(table.role(), Some(CALENDAR_ROLE));
        let source = table.partitions[0].source.expression.as_ref().unwrap().text();
        assert!(source.contains("CALENDARAUTO ()"));
    }

    #[test]
    fn skipped_when_any_date_table_exists() {
        let mut dates = Table::new("Dates");
        dates.mark_as_date_table();
        let mut model = Model::default();
        model.add_table(dates).unwrap();
        let mut session = InMemorySession::from_model("Sales", model);

        let outcome = CalendarTable::new("Calendar").apply(&mut session).unwrap();
        assert!(!outcome.made_change());
        assert_eq!(session.model().tables().len(), 1);
        assert!(!session.has_changes());
    }

    #[test]
    fn unmarked_table_with_same_name_is_a_collision() {
        let mut model = Model::default();
        model.add_table(Table::new("Calendar")).unwrap();
        let err = CalendarTable::new("Calendar").assess(&model).unwrap_err();
        assert!(err.to_string().contains("not marked as a date table"));
    }
}
