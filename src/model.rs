use serde::Serialize;

use crate::document::DocumentKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionCounts {
    pub pages: usize,
    pub generated: usize,
    pub stored: usize,
    pub not_persisted: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ExtractionCounts {
    pub fn summary_line(&self) -> String {
        format!(
            "Generated: {}, Stored: {}, Skipped (empty): {}, Errors: {}",
            self.generated, self.stored, self.skipped, self.errors
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    Blank,
    NoCandidates,
    NoPrimitives,
    ExtractionFailed { reason: String },
    Extracted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutcome {
    pub page: usize,
    #[serde(flatten)]
    pub status: PageStatus,
    pub primitives: Vec<String>,
    pub store_failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub path: String,
    pub kind: DocumentKind,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub source: SourceDocument,
    pub block_source: String,
    pub model: String,
    pub store: String,
    /// Failed page extractions and failed stores, one line each.
    pub warnings: Vec<String>,
    pub counts: ExtractionCounts,
    pub pages: Vec<PageOutcome>,
}
