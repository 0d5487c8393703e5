//! Report-layout access for PBIR folders.
//!
//! A report is a tree of JSON documents: one `page.json` per page and one `visual.json` per
//! visual. This crate only reads and writes those documents; deciding *what* to change is the
//! job of `pbifix-fixers`.
//!
//! Documents are kept as `serde_json::Value` with `preserve_order`, so keys a fixer does not
//! touch survive a rewrite unchanged.

mod doc;
mod error;
mod fs;
pub mod literal;
mod memory;
mod store;

pub use doc::{DocId, DocKind, PageRef, PageScope, ReportFormat};
pub use error::StoreError;
pub use fs::FsReportStore;
pub use memory::InMemoryReportStore;
pub use store::ReportStore;
