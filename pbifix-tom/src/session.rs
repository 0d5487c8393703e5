use crate::error::ModelError;
use crate::model::{Database, Model};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::{debug, info};

/// An open connection to one semantic model.
///
/// Changes made through [`ModelSession::model_mut`] are visible on the session immediately;
/// [`ModelSession::save_changes`] pushes them to the backing store.
pub trait ModelSession {
    /// Name of the semantic model (dataset).
    fn dataset(&self) -> &str;

    fn is_readonly(&self) -> bool;

    fn model(&self) -> &Model;

    /// Mutable access to the object graph. Read-only sessions refuse.
    fn model_mut(&mut self) -> Result<&mut Model, ModelError>;

    fn has_changes(&self) -> bool;

    fn save_changes(&mut self) -> anyhow::Result<()>;
}

/// A session over an in-memory database.
#[derive(Debug, Clone)]
pub struct InMemorySession {
    dataset: String,
    database: Database,
    readonly: bool,
    dirty: bool,
    saves: usize,
}

impl InMemorySession {
    pub fn new(dataset: impl Into<String>, database: Database) -> Self {
        Self {
            dataset: dataset.into(),
            database,
            readonly: false,
            dirty: false,
            saves: 0,
        }
    }

    pub fn from_model(dataset: impl Into<String>, model: Model) -> Self {
        Self::new(
            dataset,
            Database {
                model,
                ..Default::default()
            },
        )
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn into_database(self) -> Database {
        self.database
    }

    /// Number of successful `save_changes` calls that had something to save.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ModelSession for InMemorySession {
    fn dataset(&self) -> &str {
        &self.dataset
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn model(&self) -> &Model {
        &self.database.model
    }

    fn model_mut(&mut self) -> Result<&mut Model, ModelError> {
        if self.readonly {
            return Err(ModelError::ReadOnly(self.dataset.clone()));
        }
        self.dirty = true;
        Ok(&mut self.database.model)
    }

    fn has_changes(&self) -> bool {
        self.dirty
    }

    fn save_changes(&mut self) -> anyhow::Result<()> {
        if self.readonly {
            return Err(ModelError::ReadOnly(self.dataset.clone()).into());
        }
        if self.dirty {
            self.saves += 1;
            self.dirty = false;
        }
        Ok(())
    }
}

/// A session over a `model.bim` file; saving rewrites the file.
#[derive(Debug, Clone)]
pub struct BimFileSession {
    path: Utf8PathBuf,
    inner: InMemorySession,
}

impl BimFileSession {
    pub fn open(
        path: impl Into<Utf8PathBuf>,
        dataset: impl Into<String>,
        readonly: bool,
    ) -> anyhow::Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path).with_context(|| format!("read {}", path))?;
        let database: Database =
            serde_json::from_str(&contents).with_context(|| format!("parse {}", path))?;
        let dataset = dataset.into();
        debug!(
            dataset = dataset.as_str(),
            tables = database.model.tables.len(),
            readonly,
            "opened model.bim"
        );
        Ok(Self {
            path,
            inner: InMemorySession::new(dataset, database).readonly(readonly),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ModelSession for BimFileSession {
    fn dataset(&self) -> &str {
        self.inner.dataset()
    }

    fn is_readonly(&self) -> bool {
        self.inner.is_readonly()
    }

    fn model(&self) -> &Model {
        self.inner.model()
    }

    fn model_mut(&mut self) -> Result<&mut Model, ModelError> {
        self.inner.model_mut()
    }

    fn has_changes(&self) -> bool {
        self.inner.has_changes()
    }

    fn save_changes(&mut self) -> anyhow::Result<()> {
        if !self.inner.has_changes() {
            return Ok(());
        }
        let mut contents =
            serde_json::to_string_pretty(self.inner.database()).context("serialize model.bim")?;
        contents.push('\n');
        fs::write(&self.path, contents).with_context(|| format!("write {}", self.path))?;
        self.inner.save_changes()?;
        info!(dataset = self.inner.dataset(), path = %self.path, "saved model changes");
        Ok(())
    }
}
