//! Run-level errors.
//!
//! Everything except [`RunError::Apply`] aborts the run before any mutation. `Apply` errors are
//! caught per fixer and recorded in the change log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// The workspace, report or semantic model could not be reached.
    #[error("connection error: cannot reach {target}: {reason}")]
    Connection { target: String, reason: String },

    /// Missing confirmation or an empty selection (exit code 2).
    #[error("precondition violation: {message}")]
    PreconditionViolation { message: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("fixer '{fixer}' failed: {reason}")]
    Apply { fixer: String, reason: String },
}

impl RunError {
    pub fn connection(target: impl Into<String>, err: &anyhow::Error) -> Self {
        RunError::Connection {
            target: target.into(),
            reason: format!("{err:#}"),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        RunError::PreconditionViolation {
            message: message.into(),
        }
    }

    pub fn apply(fixer: impl Into<String>, err: &anyhow::Error) -> Self {
        RunError::Apply {
            fixer: fixer.into(),
            reason: format!("{err:#}"),
        }
    }

    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, RunError::PreconditionViolation { .. })
    }

    /// Policy blocks exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        if self.is_precondition_violation() { 2 } else { 1 }
    }
}
