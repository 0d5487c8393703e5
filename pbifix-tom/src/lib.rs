//! Semantic model object graph (TMSL shape) and the session port fixers mutate it through.
//!
//! The graph mirrors what a TOM connection exposes: tables with columns, measures and
//! partitions, calculation groups with their items, and a handful of model-level flags.
//! Every object keeps the keys it does not model in a flattened map, so loading and saving a
//! `model.bim` leaves unknown content alone.

mod error;
mod expr;
mod model;
mod session;

pub use error::ModelError;
pub use expr::DaxExpression;
pub use model::{
    Annotation, CalculationGroup, CalculationItem, Column, Database, FormatStringDefinition,
    Measure, Model, Partition, PartitionSource, Table, quote_table, DATA_SOURCE_VERSION_V3,
    ROLE_ANNOTATION, SOURCE_COLUMN_ANNOTATION,
};
pub use session::{BimFileSession, InMemorySession, ModelSession};
