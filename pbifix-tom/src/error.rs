use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} '{name}' already exists in {parent}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        parent: String,
    },

    #[error("table '{0}' does not exist")]
    MissingTable(String),

    #[error("table '{0}' is not a calculation group")]
    NotCalculationGroup(String),

    #[error("semantic model '{0}' is opened read-only")]
    ReadOnly(String),
}
