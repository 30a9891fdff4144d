use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::DocumentError;

const DOCUMENT_PART: &str = "word/document.xml";

/// The whole document as one page: non-empty paragraphs joined by newlines.
pub(super) fn extract_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    let file = File::open(path).map_err(|error| DocumentError::unreadable(path, error))?;
    let xml = read_document_part(BufReader::new(file))
        .map_err(|reason| DocumentError::unreadable(path, reason))?;
    let paragraphs =
        parse_paragraphs(&xml).map_err(|reason| DocumentError::unreadable(path, reason))?;

    if paragraphs.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![paragraphs.join("\n")])
}

fn read_document_part<R: Read + Seek>(reader: R) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|error| format!("not a docx archive: {error}"))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|error| format!("missing {DOCUMENT_PART}: {error}"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|error| format!("failed to read {DOCUMENT_PART}: {error}"))?;
    Ok(xml)
}

/// Paragraph texts in closing order. Text boxes nest whole paragraphs inside
/// a run, so open paragraphs are kept on a stack and an inner paragraph is
/// emitted before the one that contains it.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"w:tab" => push_text(&mut open, "\t"),
                b"w:br" | b"w:cr" => push_text(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        let paragraph = paragraph.trim();
                        if !paragraph.is_empty() {
                            paragraphs.push(paragraph.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let text = text
                    .unescape()
                    .map_err(|error| format!("invalid text in {DOCUMENT_PART}: {error}"))?;
                push_text(&mut open, &text);
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(format!(
                    "xml error at position {}: {error}",
                    reader.buffer_position()
                ));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Evacuation </w:t></w:r><w:r><w:t>orders &amp; alerts</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>
    <w:p><w:r><w:t>Step</w:t><w:tab/><w:t>one</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn docx_bytes(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .expect("zip entry should start");
        writer
            .write_all(xml.as_bytes())
            .expect("zip entry should be written");
        writer.finish().expect("zip should finish").into_inner()
    }

    #[test]
    fn parse_paragraphs_skips_empty_paragraphs() {
        let paragraphs = parse_paragraphs(SAMPLE_XML).expect("sample should parse");
        assert_eq!(paragraphs, vec!["Evacuation orders & alerts", "Step\tone"]);
    }

    #[test]
    fn parse_paragraphs_keeps_text_around_nested_text_box() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:r><w:t xml:space="preserve">Drivers must stop </w:t></w:r>
      <w:r><w:pict><w:txbxContent>
        <w:p><w:r><w:t>Checkpoint map</w:t></w:r></w:p>
      </w:txbxContent></w:pict></w:r>
      <w:r><w:t>at every checkpoint.</w:t></w:r>
    </w:p>
  </w:body>
</w:document>"#;

        let paragraphs = parse_paragraphs(xml).expect("nested paragraphs should parse");
        assert_eq!(
            paragraphs,
            vec!["Checkpoint map", "Drivers must stop at every checkpoint."]
        );
    }

    #[test]
    fn read_document_part_reads_from_archive() {
        let xml = read_document_part(Cursor::new(docx_bytes(SAMPLE_XML)))
            .expect("document part should be read");
        assert!(xml.contains("Evacuation"));
    }

    #[test]
    fn read_document_part_rejects_non_zip_input() {
        let error = read_document_part(Cursor::new(b"plain text".to_vec()))
            .expect_err("plain bytes are not a docx");
        assert!(error.contains("not a docx archive"));
    }

    #[test]
    fn extract_pages_returns_single_page() {
        let dir = std::env::temp_dir().join(format!("primitives-docx-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("scratch dir should be created");
        let path = dir.join("plan.docx");
        std::fs::write(&path, docx_bytes(SAMPLE_XML)).expect("docx should be written");

        let pages = extract_pages(&path).expect("docx should load");
        assert_eq!(pages, vec!["Evacuation orders & alerts\nStep\tone"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
