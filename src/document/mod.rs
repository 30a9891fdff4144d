//! Document discovery, selection and page text extraction.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

mod discover;
mod docx;
mod pdf;
mod picker;

pub use discover::discover_documents;
pub use picker::{DocumentSelector, FixedDocument, InteractivePicker};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if extension.eq_ignore_ascii_case("docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported file type: {} (use .pdf or .docx)", .0.display())]
    UnsupportedType(PathBuf),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

impl DocumentError {
    pub(crate) fn unreadable(path: &Path, reason: impl ToString) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub pages: Vec<String>,
}

/// Read a document into page texts. PDF pages map one to one; a DOCX file
/// becomes a single page of its non-empty paragraphs.
pub fn load_document(
    path: &Path,
    max_pages: Option<usize>,
) -> Result<LoadedDocument, DocumentError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| DocumentError::UnsupportedType(path.to_path_buf()))?;

    if !path.is_file() {
        return Err(DocumentError::NotFound(path.to_path_buf()));
    }

    let pages = match kind {
        DocumentKind::Pdf => pdf::extract_pages(path, max_pages)?,
        DocumentKind::Docx => docx::extract_pages(path)?,
    };

    Ok(LoadedDocument {
        path: path.to_path_buf(),
        kind,
        pages,
    })
}
