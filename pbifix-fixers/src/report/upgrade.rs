use crate::fixer::{FixerMeta, ReportFixer};
use pbifix_pbir::{PageScope, ReportFormat, ReportStore};
use pbifix_types::{Assessment, Layer, Outcome};
use tracing::info;

/// Moves a PBIRLegacy report to the PBIR folder format.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpgradeToPbir;

impl UpgradeToPbir {
    pub const META: FixerMeta = FixerMeta {
        key: "upgrade-to-pbir",
        title: "Upgrade to PBIR",
        layer: Layer::Report,
        description: "Converts a PBIRLegacy report to the PBIR format so that the other report \
                      fixers can edit its page and visual documents. Report folders on disk \
                      cannot be converted locally: the service performs the conversion when \
                      the report is saved with the enhanced report format (PBIR) enabled, so \
                      on a filesystem root this fixer reports the legacy format and fails in \
                      Fix mode.",
    };
}

impl ReportFixer for UpgradeToPbir {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, report: &dyn ReportStore, _scope: &PageScope) -> anyhow::Result<Assessment> {
        match report.format()? {
            ReportFormat::Pbir => Ok(Assessment::clean("report is already in PBIR format")),
            ReportFormat::PbirLegacy => Ok(Assessment::pending(
                "report is in PBIRLegacy format and can be upgraded to PBIR",
                vec![report.name().to_string()],
            )),
            ReportFormat::Other(format) => anyhow::bail!(
                "report is in '{format}' format; only PBIRLegacy reports can be upgraded to PBIR"
            ),
        }
    }

    fn apply(
        &self,
        report: &mut dyn ReportStore,
        scope: &PageScope,
    ) -> anyhow::Result<Outcome> {
        if !self.assess(&*report, scope)?.would_change {
            return Ok(Outcome::unchanged("report is already in PBIR format"));
        }

        let after = report.upgrade_format()?;
        if after != ReportFormat::Pbir || report.format()? != ReportFormat::Pbir {
            anyhow::bail!("report '{}' reads back as '{after}' after the upgrade", report.name());
        }
        info!(report = report.name(), "upgraded report to PBIR");
        Ok(Outcome::changed(1, "report upgraded from PBIRLegacy to PBIR"))
    }
}
