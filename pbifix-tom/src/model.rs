use crate::error::ModelError;
use crate::expr::DaxExpression;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Annotation naming the role a pbifix-created object plays (`calendar`, `units`, ...).
pub const ROLE_ANNOTATION: &str = "PBIFix_Role";

/// Annotation on generated measures pointing at their source column (`'Table'[Column]`).
pub const SOURCE_COLUMN_ANNOTATION: &str = "PBIFix_SourceColumn";

/// The data source version XMLA writes require on Fabric / Premium capacities.
pub const DATA_SOURCE_VERSION_V3: &str = "powerBI_V3";

const DATE_TABLE_CATEGORY: &str = "Time";

type Extra = Map<String, Value>;

/// Top level of a `model.bim` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<u32>,

    pub model: Model,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,

    #[serde(
        default,
        rename = "defaultPowerBIDataSourceVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_power_bi_data_source_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discourage_implicit_measures: Option<bool>,

    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_group: Option<CalculationGroup>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<Measure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// `calculated`, `calculatedTableColumn`, or absent for data columns.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<DaxExpression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_key: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarize_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub expression: DaxExpression,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    pub source: PartitionSource,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSource {
    /// `m`, `calculated`, `calculationGroup`, `entity`, ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<DaxExpression>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationGroup {
    #[serde(default)]
    pub precedence: i64,

    #[serde(default)]
    pub calculation_items: Vec<CalculationItem>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationItem {
    pub name: String,
    pub expression: DaxExpression,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string_definition: Option<FormatStringDefinition>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatStringDefinition {
    pub expression: DaxExpression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub value: String,
}

fn annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a str> {
    annotations
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

fn set_annotation(annotations: &mut Vec<Annotation>, name: &str, value: &str) {
    match annotations.iter_mut().find(|a| a.name == name) {
        Some(a) => a.value = value.to_string(),
        None => annotations.push(Annotation {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Model {
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// The table marked as the model's date table, if any.
    pub fn date_table(&self) -> Option<&Table> {
        self.tables.iter().find(|t| t.is_date_table())
    }

    pub fn calculation_groups(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.is_calculation_group())
    }

    /// Every measure with its home table, in model order.
    pub fn measures(&self) -> impl Iterator<Item = (&Table, &Measure)> {
        self.tables
            .iter()
            .flat_map(|t| t.measures.iter().map(move |m| (t, m)))
    }

    /// Measure names are unique across the whole model.
    pub fn find_measure(&self, name: &str) -> Option<(&Table, &Measure)> {
        self.measures()
            .find(|(_, m)| m.name.eq_ignore_ascii_case(name))
    }

    /// The first table carrying `PBIFix_Role = role`.
    pub fn table_with_role(&self, role: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.role() == Some(role))
    }

    pub fn discourages_implicit_measures(&self) -> bool {
        self.discourage_implicit_measures.unwrap_or(false)
    }

    pub fn set_discourage_implicit_measures(&mut self, value: bool) {
        self.discourage_implicit_measures = Some(value);
    }

    pub fn data_source_version(&self) -> Option<&str> {
        self.default_power_bi_data_source_version.as_deref()
    }

    pub fn set_data_source_version(&mut self, version: &str) {
        self.default_power_bi_data_source_version = Some(version.to_string());
    }

    pub fn next_calculation_group_precedence(&self) -> i64 {
        self.calculation_groups()
            .filter_map(|t| t.calculation_group.as_ref().map(|g| g.precedence))
            .max()
            .map_or(0, |p| p + 1)
    }

    pub fn add_table(&mut self, table: Table) -> Result<(), ModelError> {
        if self.table(&table.name).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "table",
                name: table.name,
                parent: "the model".to_string(),
            });
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn add_measure(&mut self, table: &str, measure: Measure) -> Result<(), ModelError> {
        if let Some((home, _)) = self.find_measure(&measure.name) {
            return Err(ModelError::DuplicateName {
                kind: "measure",
                name: measure.name,
                parent: format!("table '{}'", home.name),
            });
        }
        let t = self
            .table_mut(table)
            .ok_or_else(|| ModelError::MissingTable(table.to_string()))?;
        if t.column(&measure.name).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "column",
                name: measure.name,
                parent: format!("table '{}'", t.name),
            });
        }
        t.measures.push(measure);
        Ok(())
    }

    pub fn add_partition(&mut self, table: &str, partition: Partition) -> Result<(), ModelError> {
        let t = self
            .table_mut(table)
            .ok_or_else(|| ModelError::MissingTable(table.to_string()))?;
        if t.partitions.iter().any(|p| p.name == partition.name) {
            return Err(ModelError::DuplicateName {
                kind: "partition",
                name: partition.name,
                parent: format!("table '{}'", t.name),
            });
        }
        t.partitions.push(partition);
        Ok(())
    }

    pub fn add_calculation_item(
        &mut self,
        table: &str,
        mut item: CalculationItem,
    ) -> Result<(), ModelError> {
        let t = self
            .table_mut(table)
            .ok_or_else(|| ModelError::MissingTable(table.to_string()))?;
        let name = t.name.clone();
        let group = t
            .calculation_group
            .as_mut()
            .ok_or(ModelError::NotCalculationGroup(name.clone()))?;
        if group.calculation_items.iter().any(|i| i.name == item.name) {
            return Err(ModelError::DuplicateName {
                kind: "calculation item",
                name: item.name,
                parent: format!("calculation group '{name}'"),
            });
        }
        if item.ordinal.is_none() {
            item.ordinal = Some(group.calculation_items.len() as i64);
        }
        group.calculation_items.push(item);
        Ok(())
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_date_table(&self) -> bool {
        self.data_category.as_deref() == Some(DATE_TABLE_CATEGORY)
    }

    pub fn mark_as_date_table(&mut self) {
        self.data_category = Some(DATE_TABLE_CATEGORY.to_string());
    }

    /// The key column of a date table: the `isKey` column, else the first `dateTime` column.
    pub fn date_key_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.is_key == Some(true))
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.data_type.as_deref() == Some("dateTime"))
            })
    }

    pub fn is_calculation_group(&self) -> bool {
        self.calculation_group.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden.unwrap_or(false)
    }

    pub fn role(&self) -> Option<&str> {
        annotation(&self.annotations, ROLE_ANNOTATION)
    }

    pub fn set_role(&mut self, role: &str) {
        set_annotation(&mut self.annotations, ROLE_ANNOTATION, role);
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: &str) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.to_string()),
            ..Default::default()
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.data_type.as_deref(),
            Some("int64" | "double" | "decimal")
        )
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden.unwrap_or(false)
    }

    /// Absent `summarizeBy` means the engine default (sum for numeric columns).
    pub fn summarizes(&self) -> bool {
        !matches!(self.summarize_by.as_deref(), Some("none"))
    }

    /// `'Table'[Column]`.
    pub fn qualified(&self, table: &str) -> String {
        format!("{}[{}]", quote_table(table), self.name)
    }
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<DaxExpression>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            format_string: None,
            display_folder: None,
            is_hidden: None,
            annotations: Vec::new(),
            extra: Extra::new(),
        }
    }

    /// Ratios and percentages: scaling or time-shifting them is meaningless.
    pub fn is_ratio(&self) -> bool {
        if self
            .format_string
            .as_deref()
            .is_some_and(|f| f.contains('%'))
        {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        if name.contains('%') {
            return true;
        }
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .any(|w| {
                matches!(
                    w,
                    "ratio" | "pct" | "percent" | "percentage" | "margin" | "rate"
                )
            })
    }

    pub fn annotation(&self, name: &str) -> Option<&str> {
        annotation(&self.annotations, name)
    }

    pub fn set_annotation(&mut self, name: &str, value: &str) {
        set_annotation(&mut self.annotations, name, value);
    }

    /// `[Measure]`.
    pub fn reference(&self) -> String {
        format!("[{}]", self.name.replace(']', "]]"))
    }
}

impl CalculationItem {
    pub fn new(name: impl Into<String>, expression: impl Into<DaxExpression>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            ordinal: None,
            format_string_definition: None,
            extra: Extra::new(),
        }
    }

    pub fn with_format_string(mut self, expression: impl Into<DaxExpression>) -> Self {
        self.format_string_definition = Some(FormatStringDefinition {
            expression: expression.into(),
        });
        self
    }
}

impl Partition {
    pub fn new(name: impl Into<String>, kind: &str, expression: Option<DaxExpression>) -> Self {
        Self {
            name: name.into(),
            mode: Some("import".to_string()),
            source: PartitionSource {
                kind: kind.to_string(),
                expression,
                extra: Extra::new(),
            },
            extra: Extra::new(),
        }
    }
}

/// DAX table reference, always single-quoted.
pub fn quote_table(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
