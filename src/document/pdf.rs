use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::DocumentError;

/// Page texts from the `pdftotext` text layer, split on form feeds.
pub(super) fn extract_pages(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<Vec<String>, DocumentError> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command.output().map_err(|error| {
        DocumentError::unreadable(pdf_path, format!("failed to execute pdftotext: {error}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DocumentError::unreadable(
            pdf_path,
            format!("pdftotext exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let pages = split_pages(&String::from_utf8_lossy(&output.stdout));
    debug!(path = %pdf_path.display(), pages = pages.len(), "pdftotext finished");
    Ok(pages)
}

fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }

    pages
}
