use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::candidates::{CandidateExtractor, HeuristicConfig};
use crate::cli::CandidatesArgs;
use crate::document::load_document;

#[derive(Debug, Serialize)]
struct PageCandidates {
    page: usize,
    candidates: Vec<String>,
}

pub fn run(args: CandidatesArgs) -> Result<()> {
    let extractor = CandidateExtractor::new(&HeuristicConfig::from_args(&args.heuristic))?;
    let document = load_document(&args.file, args.max_pages)?;

    let pages: Vec<PageCandidates> = document
        .pages
        .iter()
        .enumerate()
        .map(|(index, text)| PageCandidates {
            page: index + 1,
            candidates: extractor.extract(text),
        })
        .collect();

    let total: usize = pages.iter().map(|page| page.candidates.len()).sum();
    info!(path = %args.file.display(), pages = pages.len(), candidates = total, "candidate extraction complete");

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &pages)
            .context("failed to serialize candidate json output")?;
        writeln!(output)?;
    } else {
        for page in &pages {
            writeln!(output, "Page {} ({} candidates)", page.page, page.candidates.len())?;
            for candidate in &page.candidates {
                writeln!(output, "  - {candidate}")?;
            }
        }
        writeln!(output, "Extraction: {total} candidates (sentences + paragraphs)")?;
    }
    output.flush()?;

    Ok(())
}
