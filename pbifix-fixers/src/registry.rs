use crate::document::DocumentFixer;
use crate::fixer::Fixer;
use crate::model::{
    CalendarTable, DefaultDataSourceVersion, DiscourageImplicitMeasures, ExplicitMeasures,
    TimeIntelligenceGroup, UnitsGroup,
};
use crate::report::{AxisDeclutter, HideVisualFilters, PageSize, PieToBar, UpgradeToPbir};
use crate::settings::FixerSettings;
use glob::Pattern;

/// A selection pattern that matched no fixer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fixer '{0}'")]
pub struct UnknownFixer(pub String);

/// The fixed, ordered set of fixers. Runs always follow registry order.
#[derive(Debug)]
pub struct Registry {
    fixers: Vec<Fixer>,
}

impl Registry {
    pub fn new(fixers: Vec<Fixer>) -> Self {
        Self { fixers }
    }

    /// Report fixers first, then model fixers.
    pub fn builtin(settings: &FixerSettings) -> Self {
        Self::new(vec![
            Fixer::report(UpgradeToPbir),
            Fixer::report(DocumentFixer::new(PieToBar::new(
                settings.pie_replacement.clone(),
            ))),
            Fixer::report(DocumentFixer::new(AxisDeclutter::bar_charts())),
            Fixer::report(DocumentFixer::new(AxisDeclutter::column_charts())),
            Fixer::report(DocumentFixer::new(PageSize::new(
                settings.page_width,
                settings.page_height,
            ))),
            Fixer::report(DocumentFixer::new(HideVisualFilters)),
            Fixer::model(DefaultDataSourceVersion),
            Fixer::model(DiscourageImplicitMeasures),
            Fixer::model(CalendarTable::new(settings.calendar_table.clone())),
            Fixer::model(ExplicitMeasures),
            Fixer::model(UnitsGroup::new(settings.units_group.clone())),
            Fixer::model(TimeIntelligenceGroup::new(
                settings.time_intelligence_group.clone(),
            )),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fixer> {
        self.fixers.iter()
    }

    pub fn len(&self) -> usize {
        self.fixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixers.is_empty()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.fixers.iter().map(Fixer::key).collect()
    }

    /// Looks a fixer up by key (`page-size`), snake_case key (`page_size`) or title
    /// (`Fix Page Size`), ignoring case.
    pub fn get(&self, query: &str) -> Option<&Fixer> {
        let query = query.trim().to_lowercase();
        let normalized = query.replace('_', "-");
        self.fixers.iter().find(|f| {
            let meta = f.meta();
            meta.key == normalized || meta.title.to_lowercase() == query
        })
    }

    /// Fixers matching any of `patterns` (exact lookups or globs such as `calc-group-*`), in
    /// registry order and without duplicates. Every pattern must match at least one fixer.
    pub fn select(&self, patterns: &[String]) -> Result<Vec<&Fixer>, UnknownFixer> {
        let mut selected = vec![false; self.fixers.len()];
        for raw in patterns {
            let mut hit = false;
            if let Some(fixer) = self.get(raw) {
                let idx = self.position(fixer.key());
                selected[idx] = true;
                hit = true;
            } else if let Ok(pattern) = Pattern::new(&raw.trim().to_lowercase().replace('_', "-"))
            {
                for (idx, fixer) in self.fixers.iter().enumerate() {
                    if pattern.matches(fixer.key()) {
                        selected[idx] = true;
                        hit = true;
                    }
                }
            }
            if !hit {
                return Err(UnknownFixer(raw.clone()));
            }
        }
        Ok(self
            .fixers
            .iter()
            .zip(selected)
            .filter_map(|(f, on)| on.then_some(f))
            .collect())
    }

    fn position(&self, key: &str) -> usize {
        self.fixers
            .iter()
            .position(|f| f.key() == key)
            .unwrap_or_default()
    }
}
