//! Page-by-page extraction run: model call per page, store per primitive.
//! Failures stay local to the page or primitive that caused them.

use std::fmt;
use std::io::Write;

use tracing::{info, warn};

use crate::candidates::CandidateExtractor;
use crate::llm::RuleExtractor;
use crate::model::{ExtractionCounts, PageOutcome, PageStatus};
use crate::store::{PersistenceGateway, StoreOutcome};

/// What text is sent to the model for each page.
pub enum BlockMode {
    RawPage,
    Candidates(CandidateExtractor),
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub counts: ExtractionCounts,
    pub pages: Vec<PageOutcome>,
}

impl ExtractionReport {
    /// One line per failed page extraction or failed store, in page order.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for outcome in &self.pages {
            if let PageStatus::ExtractionFailed { reason } = &outcome.status {
                warnings.push(format!("page {}: extraction failed: {reason}", outcome.page));
            }
            for reason in &outcome.store_failures {
                warnings.push(format!("page {}: store failed: {reason}", outcome.page));
            }
        }
        warnings
    }
}

/// Progress lines for the operator. Output is best-effort: after the first
/// write or flush error it goes quiet and the run carries on.
struct Progress<'w, W> {
    out: &'w mut W,
    closed: bool,
}

impl<'w, W: Write> Progress<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self { out, closed: false }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.closed {
            return;
        }
        let result = self
            .out
            .write_fmt(args)
            .and_then(|()| self.out.write_all(b"\n"));
        self.close_on_error(result);
    }

    fn flush(&mut self) {
        if self.closed {
            return;
        }
        let result = self.out.flush();
        self.close_on_error(result);
    }

    fn close_on_error(&mut self, result: std::io::Result<()>) {
        if let Err(error) = result {
            warn!(error = %error, "progress output failed; continuing without it");
            self.closed = true;
        }
    }
}

pub struct ExtractionPipeline<'a, E> {
    extractor: &'a E,
    gateway: &'a PersistenceGateway,
    mode: BlockMode,
    context: Option<String>,
}

impl<'a, E: RuleExtractor> ExtractionPipeline<'a, E> {
    pub fn new(extractor: &'a E, gateway: &'a PersistenceGateway, mode: BlockMode) -> Self {
        Self {
            extractor,
            gateway,
            mode,
            context: None,
        }
    }

    pub fn with_extra_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Process every page. Progress goes to `out` and is flushed after each
    /// page; a failing writer never stops the run.
    pub fn run<W: Write>(&self, pages: &[String], out: &mut W) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        let mut progress = Progress::new(out);

        for (index, page_text) in pages.iter().enumerate() {
            let page = index + 1;
            report.counts.pages += 1;
            let outcome = self.process_page(page, page_text, &mut report.counts, &mut progress);
            progress.flush();
            report.pages.push(outcome);
        }

        info!(
            pages = report.counts.pages,
            generated = report.counts.generated,
            stored = report.counts.stored,
            skipped = report.counts.skipped,
            errors = report.counts.errors,
            "extraction run finished"
        );
        report
    }

    fn process_page<W: Write>(
        &self,
        page: usize,
        page_text: &str,
        counts: &mut ExtractionCounts,
        progress: &mut Progress<'_, W>,
    ) -> PageOutcome {
        let mut outcome = PageOutcome {
            page,
            status: PageStatus::Blank,
            primitives: Vec::new(),
            store_failures: Vec::new(),
        };

        if page_text.trim().is_empty() {
            counts.skipped += 1;
            return outcome;
        }

        let rule = "=".repeat(60);
        progress.line(format_args!("\n{rule}"));
        progress.line(format_args!("Scanning page {page}..."));
        progress.line(format_args!("{rule}"));

        let block = match &self.mode {
            BlockMode::RawPage => page_text.to_string(),
            BlockMode::Candidates(candidates) => {
                let lines = candidates.extract_sentences(page_text);
                if lines.is_empty() {
                    progress.line(format_args!("No candidate text on this page. Skipping."));
                    counts.skipped += 1;
                    outcome.status = PageStatus::NoCandidates;
                    return outcome;
                }
                lines.join("\n")
            }
        };

        progress.line(format_args!("Generating primitives from page..."));
        let primitives = match self.extractor.extract(&block, self.context.as_deref()) {
            Ok(primitives) => primitives,
            Err(error) => {
                warn!(page, error = %error, "rule extraction failed");
                progress.line(format_args!(
                    "Error processing page {page} (continuing): {error}"
                ));
                counts.errors += 1;
                outcome.status = PageStatus::ExtractionFailed {
                    reason: error.to_string(),
                };
                return outcome;
            }
        };

        if primitives.is_empty() {
            progress.line(format_args!(
                "No valid primitives generated from this page. Skipping."
            ));
            counts.skipped += 1;
            outcome.status = PageStatus::NoPrimitives;
            return outcome;
        }

        outcome.status = PageStatus::Extracted;
        for primitive in primitives {
            counts.generated += 1;
            progress.line(format_args!("\nPrimitive generated:\n{primitive}"));

            match self.gateway.store(&primitive) {
                StoreOutcome::Stored => counts.stored += 1,
                StoreOutcome::NotConfigured => counts.not_persisted += 1,
                StoreOutcome::Failed(reason) => {
                    progress.line(format_args!(
                        "Error storing primitive (continuing): {reason}"
                    ));
                    counts.errors += 1;
                    outcome.store_failures.push(reason);
                }
            }
            outcome.primitives.push(primitive);
        }

        outcome
    }
}
