//! Configuration file loading for pbifix.
//!
//! Discovers and loads `pbifix.toml` from the root directory. The file is only read, never
//! written. CLI arguments take precedence over it.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pbifix_core::RunRequest;
use pbifix_fixers::FixerSettings;
use pbifix_types::RunMode;
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "pbifix.toml";

/// Top-level configuration from pbifix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PbifixConfig {
    /// Selection used when the command line leaves a part open.
    pub defaults: DefaultsConfig,

    /// Targets for the built-in fixers.
    pub fixers: FixerSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub workspace: Option<String>,
    pub report: Option<String>,
    pub page: Option<String>,
    pub mode: Option<RunMode>,
    /// Fixer keys or glob patterns.
    pub fixers: Vec<String>,
}

pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<PbifixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<PbifixConfig> {
    let config: PbifixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the root directory, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<PbifixConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(PbifixConfig::default()),
    }
}

/// The `run` arguments that can also come from the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub workspace: Option<String>,
    pub report: Option<String>,
    pub page: Option<String>,
    pub fixers: Vec<String>,
    pub mode: Option<RunMode>,
}

#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub request: RunRequest,
    pub fixers: FixerSettings,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PbifixConfig,
}

impl ConfigMerger {
    pub fn new(config: PbifixConfig) -> Self {
        Self { config }
    }

    /// Every value given on the command line replaces the config value; a non-empty
    /// `--fixer` list replaces the configured list.
    pub fn merge_run_args(self, cli: RunOverrides) -> MergedConfig {
        let defaults = self.config.defaults;
        let fixers = if cli.fixers.is_empty() {
            defaults.fixers
        } else {
            cli.fixers
        };
        MergedConfig {
            request: RunRequest {
                workspace: cli.workspace.or(defaults.workspace),
                report: cli.report.or(defaults.report),
                page: cli.page.or(defaults.page),
                fixers,
                mode: cli.mode.or(defaults.mode),
            },
            fixers: self.config.fixers,
        }
    }
}
