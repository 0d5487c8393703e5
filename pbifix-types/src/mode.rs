use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which artifact a fixer mutates.
///
/// Model-layer writes cannot be undone from the report side (the source file loses its
/// embedded-data capability), so they sit behind a confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Report,
    Model,
}

impl Layer {
    pub fn is_model(self) -> bool {
        matches!(self, Layer::Model)
    }

    pub fn label(self) -> &'static str {
        match self {
            Layer::Report => "report",
            Layer::Model => "model",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the selected fixers are run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Apply every selected fixer without a separate scan pass.
    Fix,
    /// Assess only; nothing is written.
    #[default]
    Scan,
    /// Assess everything, then apply the fixers that reported pending work.
    ScanFix,
}

impl RunMode {
    pub fn scans(self) -> bool {
        matches!(self, RunMode::Scan | RunMode::ScanFix)
    }

    pub fn fixes(self) -> bool {
        matches!(self, RunMode::Fix | RunMode::ScanFix)
    }

    pub fn key(self) -> &'static str {
        match self {
            RunMode::Fix => "fix",
            RunMode::Scan => "scan",
            RunMode::ScanFix => "scan-fix",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunMode::Fix => "Fix",
            RunMode::Scan => "Scan",
            RunMode::ScanFix => "Scan + Fix",
        }
    }

    pub const ALL: [RunMode; 3] = [RunMode::Fix, RunMode::Scan, RunMode::ScanFix];
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['_', ' '], "-")
            .replace("-+-", "-");
        match normalized.as_str() {
            "fix" => Ok(RunMode::Fix),
            "scan" => Ok(RunMode::Scan),
            "scan-fix" | "scanfix" | "scan+fix" => Ok(RunMode::ScanFix),
            _ => Err(format!("unknown mode '{s}' (expected fix, scan or scan-fix)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flags() {
        assert!(RunMode::Fix.fixes() && !RunMode::Fix.scans());
        assert!(RunMode::Scan.scans() && !RunMode::Scan.fixes());
        assert!(RunMode::ScanFix.scans() && RunMode::ScanFix.fixes());
    }

    #[test]
    fn mode_parses_labels_and_keys() {
        assert_eq!("scan-fix".parse::<RunMode>().unwrap(), RunMode::ScanFix);
        assert_eq!("Scan + Fix".parse::<RunMode>().unwrap(), RunMode::ScanFix);
        assert_eq!("scan_fix".parse::<RunMode>().unwrap(), RunMode::ScanFix);
        assert_eq!("FIX".parse::<RunMode>().unwrap(), RunMode::Fix);
        assert!("apply".parse::<RunMode>().is_err());
    }

    #[test]
    fn mode_serializes_kebab_case() {
        let json = serde_json::to_string(&RunMode::ScanFix).unwrap();
        assert_eq!(json, "\"scan-fix\"");
    }

    #[test]
    fn only_model_layer_is_gated() {
        assert!(Layer::Model.is_model());
        assert!(!Layer::Report.is_model());
        assert_eq!(serde_json::to_string(&Layer::Model).unwrap(), "\"model\"");
    }
}
