use crate::doc::{DocId, DocKind, PageRef, PageScope, ReportFormat};
use serde_json::Value;

/// Read/write access to one report's documents.
///
/// The store never decides what a document should look like; it only locates, reads and
/// persists documents. Writes are visible to subsequent reads immediately.
pub trait ReportStore {
    fn name(&self) -> &str;

    fn format(&self) -> anyhow::Result<ReportFormat>;

    /// Pages in report order.
    fn pages(&self) -> anyhow::Result<Vec<PageRef>>;

    /// Visual ids on a page, in a stable order.
    fn visuals(&self, page: &str) -> anyhow::Result<Vec<String>>;

    fn read(&self, id: &DocId) -> anyhow::Result<Value>;

    fn write(&mut self, id: &DocId, doc: &Value) -> anyhow::Result<()>;

    /// Converts a PBIRLegacy report to PBIR and returns the format afterwards.
    fn upgrade_format(&mut self) -> anyhow::Result<ReportFormat>;

    fn find_page(&self, query: &str) -> anyhow::Result<Option<PageRef>> {
        Ok(self.pages()?.into_iter().find(|p| p.matches(query)))
    }

    /// All documents of `kind` on the pages in `scope`.
    fn documents(&self, scope: &PageScope, kind: DocKind) -> anyhow::Result<Vec<DocId>> {
        let mut out = Vec::new();
        for page in self.pages()? {
            if !scope.contains(&page.id) {
                continue;
            }
            match kind {
                DocKind::Page => out.push(DocId::page(page.id)),
                DocKind::Visual => {
                    for visual in self.visuals(&page.id)? {
                        out.push(DocId::visual(page.id.clone(), visual));
                    }
                }
            }
        }
        Ok(out)
    }
}
