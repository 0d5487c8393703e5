use pbifix_pbir::{PageScope, ReportStore};
use pbifix_tom::{Model, ModelSession};
use pbifix_types::{Assessment, Layer, Outcome};

/// Static description of a fixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixerMeta {
    /// Stable selection key, e.g. `page-size`.
    pub key: &'static str,
    /// Display name shown next to the checkbox.
    pub title: &'static str,
    pub layer: Layer,
    pub description: &'static str,
}

/// A fixer over report-layout documents.
pub trait ReportFixer {
    fn meta(&self) -> FixerMeta;

    fn assess(&self, report: &dyn ReportStore, scope: &PageScope) -> anyhow::Result<Assessment>;

    /// Must be a no-op when `assess` reports nothing pending.
    fn apply(&self, report: &mut dyn ReportStore, scope: &PageScope)
    -> anyhow::Result<Outcome>;
}

/// A fixer over the semantic model graph.
pub trait ModelFixer {
    fn meta(&self) -> FixerMeta;

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment>;

    /// Must be a no-op when `assess` reports nothing pending.
    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome>;
}

/// A registry record: one fixer tagged with the layer it targets.
pub enum Fixer {
    Report(Box<dyn ReportFixer>),
    Model(Box<dyn ModelFixer>),
}

impl Fixer {
    pub fn report(f: impl ReportFixer + 'static) -> Self {
        Fixer::Report(Box::new(f))
    }

    pub fn model(f: impl ModelFixer + 'static) -> Self {
        Fixer::Model(Box::new(f))
    }

    pub fn meta(&self) -> FixerMeta {
        match self {
            Fixer::Report(f) => f.meta(),
            Fixer::Model(f) => f.meta(),
        }
    }

    pub fn key(&self) -> &'static str {
        self.meta().key
    }

    pub fn layer(&self) -> Layer {
        match self {
            Fixer::Report(_) => Layer::Report,
            Fixer::Model(_) => Layer::Model,
        }
    }
}

impl std::fmt::Debug for Fixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let meta = self.meta();
        f.debug_struct("Fixer")
            .field("key", &meta.key)
            .field("layer", &meta.layer)
            .finish()
    }
}
