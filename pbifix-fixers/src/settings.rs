use serde::{Deserialize, Serialize};

/// Targets the built-in fixers enforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixerSettings {
    /// Target page width for `page-size`.
    pub page_width: u32,
    /// Target page height for `page-size`.
    pub page_height: u32,
    /// Visual type pie and donut charts are converted to.
    pub pie_replacement: String,
    pub calendar_table: String,
    pub units_group: String,
    pub time_intelligence_group: String,
}

impl Default for FixerSettings {
    fn default() -> Self {
        Self {
            page_width: 1920,
            page_height: 1080,
            pie_replacement: "clusteredBarChart".to_string(),
            calendar_table: "Calendar".to_string(),
            units_group: "Units".to_string(),
            time_intelligence_group: "Time Intelligence".to_string(),
        }
    }
}
