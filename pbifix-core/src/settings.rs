//! Clap-free settings for the orchestrator.

use pbifix_fixers::{FixerSettings, Registry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// Targets the built-in fixers enforce.
    pub fixers: FixerSettings,
}

impl RunSettings {
    pub fn registry(&self) -> Registry {
        Registry::builtin(&self.fixers)
    }
}
