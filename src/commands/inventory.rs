use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::document::discover_documents;

pub fn run(args: InventoryArgs) -> Result<()> {
    let documents = discover_documents(&args.dir)?;
    info!(dir = %args.dir.display(), documents = documents.len(), "inventory complete");

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &documents)
            .context("failed to serialize inventory json output")?;
        writeln!(output)?;
    } else if documents.is_empty() {
        writeln!(output, "No PDF or DOCX files found in {}", args.dir.display())?;
    } else {
        for (index, document) in documents.iter().enumerate() {
            writeln!(
                output,
                "{}.\t{}\t{}\t{} bytes\t{}",
                index + 1,
                document.filename,
                document.kind.as_str(),
                document.size_bytes,
                &document.sha256[..12]
            )?;
        }
    }
    output.flush()?;

    Ok(())
}
