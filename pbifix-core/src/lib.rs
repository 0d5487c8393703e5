//! Embeddable core library for pbifix.
//!
//! Provides a clap-free entry point that runs a batch of fixers against one report and its
//! semantic model.
//!
//! # Port traits
//!
//! Everything outside the fixers is reached through the traits in [`ports`]:
//! - [`Catalog`](ports::Catalog): list workspaces and reports, open a report, find its model
//! - [`ModelConnector`](ports::ModelConnector): open a session on a semantic model
//! - [`Selector`](ports::Selector): fill in whatever the caller left unspecified
//! - [`Confirmation`](ports::Confirmation): the gate in front of model changes
//!
//! The [`adapters`] module provides filesystem-backed and scripted implementations.
//!
//! # Entry points
//!
//! - [`Orchestrator::run`](pipeline::Orchestrator::run) runs a complete [`FixPlan`](pbifix_types::FixPlan)
//! - [`Orchestrator::select_and_run`](pipeline::Orchestrator::select_and_run) resolves a partial
//!   request through a selector first

pub mod adapters;
mod error;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use error::RunError;
pub use pipeline::{Orchestrator, RunRequest, RunState};
