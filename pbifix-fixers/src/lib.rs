//! Fixers: what should change in a report or semantic model, and how to tell whether it
//! already has.
//!
//! Every fixer pairs a read-only `assess` (the scanner) with an idempotent `apply`. `apply`
//! always starts from the same assessment, so a scan and a fix can never disagree about what
//! is pending on an unchanged artifact.
//!
//! Applying is done through the store/session collaborators; this crate never opens
//! connections or discovers files.

mod document;
mod fixer;
mod model;
mod registry;
mod report;
mod settings;

pub use document::{DocumentFixer, DocumentRule};
pub use fixer::{Fixer, FixerMeta, ModelFixer, ReportFixer};
pub use registry::{Registry, UnknownFixer};
pub use settings::FixerSettings;
