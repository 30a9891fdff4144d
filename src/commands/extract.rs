use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::candidates::{CandidateExtractor, HeuristicConfig};
use crate::cli::{BlockSource, ExtractArgs};
use crate::config::AppConfig;
use crate::document::{DocumentSelector, FixedDocument, InteractivePicker, load_document};
use crate::llm::OpenAiExtractor;
use crate::model::{ExtractionRunManifest, SourceDocument};
use crate::pipeline::{BlockMode, ExtractionPipeline, ExtractionReport};
use crate::store::PersistenceGateway;
use crate::util::{compact_timestamp, rfc3339, sha256_file, write_json_pretty};

pub fn run(args: ExtractArgs, config: &AppConfig) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("run-{}", compact_timestamp(started_ts));

    // Bad patterns should fail before anything is read or sent.
    let mode = match args.block_source {
        BlockSource::Page => BlockMode::RawPage,
        BlockSource::Candidates => BlockMode::Candidates(CandidateExtractor::new(
            &HeuristicConfig::from_args(&args.heuristic),
        )?),
    };

    let Some(path) = select_document(&args)? else {
        return Ok(());
    };

    let document = load_document(&path, args.max_pages)?;
    let sha256 = sha256_file(&document.path)?;

    let mut out = io::BufWriter::new(io::stdout().lock());
    if let Err(error) = print_header(&mut out, &path, document.pages.len()) {
        warn!(error = %error, "failed to print document header");
    }

    info!(
        run_id = %run_id,
        path = %document.path.display(),
        kind = document.kind.as_str(),
        pages = document.pages.len(),
        "starting extraction"
    );

    let mut openai = config.openai.clone();
    if let Some(model) = &args.model {
        openai.model = model.clone();
    }
    if openai.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every page will fail extraction");
    }
    let extractor = OpenAiExtractor::new(config.http_agent(), openai);
    let gateway = PersistenceGateway::open(&args.store, config)?;

    let report = ExtractionPipeline::new(&extractor, &gateway, mode)
        .with_extra_context(args.context.clone())
        .run(&document.pages, &mut out);

    if let Err(error) = print_summary(&mut out, &report) {
        warn!(error = %error, "failed to print run summary");
    }

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        default_manifest_path(&args.store.cache_root, &compact_timestamp(started_ts))
    });
    let manifest = ExtractionRunManifest {
        manifest_version: 1,
        run_id,
        started_at: rfc3339(started_ts),
        completed_at: rfc3339(Utc::now()),
        source: SourceDocument {
            path: document.path.display().to_string(),
            kind: document.kind,
            sha256,
            page_count: document.pages.len(),
        },
        block_source: args.block_source.as_str().to_string(),
        model: extractor.model().to_string(),
        store: gateway.describe(),
        warnings: report.warnings(),
        counts: report.counts,
        pages: report.pages,
    };
    // The pages are already processed; a lost manifest is not a failed run.
    match write_json_pretty(&manifest_path, &manifest) {
        Ok(()) => info!(path = %manifest_path.display(), "wrote extraction run manifest"),
        Err(error) => {
            let reason = format!("{error:#}");
            warn!(path = %manifest_path.display(), error = %reason, "failed to write run manifest");
        }
    }

    Ok(())
}

fn print_header<W: Write>(out: &mut W, path: &Path, page_count: usize) -> io::Result<()> {
    writeln!(
        out,
        "Found file: {}",
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    )?;
    writeln!(out, "Extracted {page_count} pages from document")
}

fn print_summary<W: Write>(out: &mut W, report: &ExtractionReport) -> io::Result<()> {
    writeln!(out, "\nProcessing complete.")?;
    writeln!(out, "{}", report.counts.summary_line())?;
    if report.counts.not_persisted > 0 {
        writeln!(
            out,
            "Not stored (no store configured): {}",
            report.counts.not_persisted
        )?;
    }
    out.flush()
}

fn select_document(args: &ExtractArgs) -> Result<Option<PathBuf>> {
    let mut selector: Box<dyn DocumentSelector> = match &args.file {
        Some(path) => Box::new(FixedDocument(path.clone())),
        None => Box::new(InteractivePicker::new(
            &args.dir,
            io::stdin().lock(),
            io::stdout(),
        )),
    };
    selector.select()
}

fn default_manifest_path(cache_root: &Path, stamp: &str) -> PathBuf {
    cache_root
        .join("manifests")
        .join(format!("extract_run_{stamp}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_path_lives_under_cache_manifests() {
        let path = default_manifest_path(Path::new(".cache/primitives"), "20260101T000000Z");
        assert_eq!(
            path,
            PathBuf::from(".cache/primitives/manifests/extract_run_20260101T000000Z.json")
        );
    }

    #[test]
    fn summary_reports_unpersisted_primitives() {
        let mut report = ExtractionReport::default();
        report.counts.generated = 2;
        report.counts.not_persisted = 2;
        let mut out = Vec::new();

        print_summary(&mut out, &report).expect("summary prints");

        let printed = String::from_utf8(out).expect("utf-8 output");
        assert!(printed.contains("Generated: 2, Stored: 0, Skipped (empty): 0, Errors: 0"));
        assert!(printed.contains("Not stored (no store configured): 2"));
    }
}
