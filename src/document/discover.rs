use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::DocumentKind;
use crate::util::sha256_file;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub kind: DocumentKind,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Regular `.pdf` / `.docx` files directly under `dir`, sorted by filename.
pub fn discover_documents(dir: &Path) -> Result<Vec<DocumentEntry>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        let metadata = entry
            .metadata()
            .with_context(|| format!("failed to inspect file: {}", path.display()))?;
        if !metadata.is_file() {
            continue;
        }

        let Some(kind) = DocumentKind::from_path(&path) else {
            continue;
        };

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        documents.push(DocumentEntry {
            filename,
            kind,
            size_bytes: metadata.len(),
            sha256: sha256_file(&path)?,
        });
    }

    documents.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(documents)
}
