//! Semantic-model fixers.

mod calc_groups;
mod calendar;
mod flags;
mod measures;

pub use calc_groups::{TimeIntelligenceGroup, UnitsGroup};
pub use calendar::CalendarTable;
pub use flags::{DefaultDataSourceVersion, DiscourageImplicitMeasures};
pub use measures::ExplicitMeasures;
