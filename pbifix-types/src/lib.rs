//! Shared DTOs for the pbifix workspace.
//!
//! # Design constraints
//! - Change logs are surfaced to the user (text, markdown, JSON) and then discarded.
//! - Keep these types free of IO; the stores and sessions live in their own crates.

pub mod assess;
pub mod changelog;
pub mod mode;
pub mod plan;

/// Schema identifiers.
pub mod schema {
    pub const PBIFIX_CHANGE_LOG_V1: &str = "pbifix.change_log.v1";
}

pub use assess::{count_noun, Assessment, Outcome};
pub use changelog::{ChangeEntry, ChangeLog, ChangeSummary, EntryStatus, RunInfo, RunTarget};
pub use mode::{Layer, RunMode};
pub use plan::FixPlan;
