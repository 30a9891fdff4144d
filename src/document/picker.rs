use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::discover_documents;

/// Supplies the document path an extraction run should read.
pub trait DocumentSelector {
    /// `Ok(None)` means there is nothing to process.
    fn select(&mut self) -> Result<Option<PathBuf>>;
}

pub struct FixedDocument(pub PathBuf);

impl DocumentSelector for FixedDocument {
    fn select(&mut self) -> Result<Option<PathBuf>> {
        Ok(Some(self.0.clone()))
    }
}

/// Lists the documents in a directory and asks which one to use when there
/// is more than one.
pub struct InteractivePicker<R, W> {
    dir: PathBuf,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractivePicker<R, W> {
    pub fn new(dir: impl Into<PathBuf>, input: R, output: W) -> Self {
        Self {
            dir: dir.into(),
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> DocumentSelector for InteractivePicker<R, W> {
    fn select(&mut self) -> Result<Option<PathBuf>> {
        let documents = discover_documents(&self.dir)?;

        writeln!(
            self.output,
            "Available PDF/DOCX files in {}:",
            self.dir.display()
        )?;
        for (index, document) in documents.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, document.filename)?;
        }

        match documents.as_slice() {
            [] => {
                writeln!(self.output, "No PDF or DOCX files found.")?;
                Ok(None)
            }
            [only] => {
                writeln!(self.output, "Auto-selected file: {}", only.filename)?;
                Ok(Some(self.dir.join(&only.filename)))
            }
            _ => {
                write!(self.output, "\nEnter file number or full path: ")?;
                self.output.flush()?;

                let mut line = String::new();
                self.input
                    .read_line(&mut line)
                    .context("failed to read file selection")?;
                let names: Vec<&str> = documents.iter().map(|doc| doc.filename.as_str()).collect();
                Ok(Some(resolve_choice(&self.dir, &names, line.trim())))
            }
        }
    }
}

/// A 1-based index into `names`; anything else is taken as a path.
fn resolve_choice(dir: &Path, names: &[&str], choice: &str) -> PathBuf {
    match choice.parse::<usize>() {
        Ok(number) if (1..=names.len()).contains(&number) => dir.join(names[number - 1]),
        _ => PathBuf::from(choice),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use super::*;

    fn scratch_dir(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "primitives-picker-{name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("scratch dir should be created");
        for file in files {
            fs::write(dir.join(file), b"x").expect("scratch file should be written");
        }
        dir
    }

    #[test]
    fn resolve_choice_accepts_index_or_path() {
        let dir = Path::new("docs");
        let names = ["a.pdf", "b.docx"];

        assert_eq!(resolve_choice(dir, &names, "2"), dir.join("b.docx"));
        assert_eq!(resolve_choice(dir, &names, "3"), PathBuf::from("3"));
        assert_eq!(resolve_choice(dir, &names, "0"), PathBuf::from("0"));
        assert_eq!(
            resolve_choice(dir, &names, "/tmp/other.pdf"),
            PathBuf::from("/tmp/other.pdf")
        );
    }

    #[test]
    fn picker_returns_none_for_empty_directory() {
        let dir = scratch_dir("empty", &[]);
        let mut output = Vec::new();

        let selected = InteractivePicker::new(&dir, Cursor::new(""), &mut output)
            .select()
            .expect("selection should succeed");

        assert!(selected.is_none());
        assert!(String::from_utf8_lossy(&output).contains("No PDF or DOCX files found."));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn picker_auto_selects_single_document() {
        let dir = scratch_dir("single", &["only.pdf", "readme.md"]);
        let mut output = Vec::new();

        let selected = InteractivePicker::new(&dir, Cursor::new(""), &mut output)
            .select()
            .expect("selection should succeed");

        assert_eq!(selected, Some(dir.join("only.pdf")));
        assert!(String::from_utf8_lossy(&output).contains("Auto-selected file: only.pdf"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn picker_prompts_when_several_documents_exist() {
        let dir = scratch_dir("several", &["a.pdf", "b.docx"]);
        let mut output = Vec::new();

        let selected = InteractivePicker::new(&dir, Cursor::new("2\n"), &mut output)
            .select()
            .expect("selection should succeed");

        assert_eq!(selected, Some(dir.join("b.docx")));
        let printed = String::from_utf8_lossy(&output);
        assert!(printed.contains("  1. a.pdf"));
        assert!(printed.contains("Enter file number or full path:"));
        fs::remove_dir_all(&dir).ok();
    }
}
