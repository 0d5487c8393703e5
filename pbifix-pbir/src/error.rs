use thiserror::Error;

/// Errors raised by report stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report '{report}' is in {format} format; PBIR documents are not available")]
    NotPbir { report: String, format: String },

    #[error("document {id} does not exist in report '{report}'")]
    MissingDocument { report: String, id: String },

    #[error("report '{report}' is not a report folder: {reason}")]
    InvalidLayout { report: String, reason: String },

    #[error("report '{report}' cannot be upgraded here: {reason}")]
    UpgradeUnsupported { report: String, reason: String },
}
