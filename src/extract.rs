//! Multi-format text extraction for resume attachments.
//!
//! Dispatch is on the filename suffix (case-insensitive): `.pdf`,
//! `.doc`/`.docx`, `.txt`. Anything else, and any internal parse fault,
//! yields `None`: extraction failures are a sentinel, not an error that
//! aborts the batch. Faults are reported as warnings on the caller's
//! diagnostic channel and never propagate past this module.

use std::io::Read;

use crate::report::PipelineReporter;

/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Internal extraction fault, classified for the diagnostic message.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Ooxml(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "Word extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from attachment bytes.
///
/// Returns `None` for unsupported suffixes and for parse failures. A parse
/// failure additionally emits a warning through `reporter`; an unsupported
/// suffix does not.
pub fn extract_text(
    filename: &str,
    bytes: &[u8],
    reporter: &dyn PipelineReporter,
) -> Option<String> {
    let name = filename.to_ascii_lowercase();

    let result = if name.ends_with(".pdf") {
        extract_pdf(bytes)
    } else if name.ends_with(".doc") || name.ends_with(".docx") {
        extract_docx(bytes)
    } else if name.ends_with(".txt") {
        // Lossy by design: dropping an undecodable byte beats dropping the
        // whole resume.
        Ok(String::from_utf8_lossy(bytes).into_owned())
    } else {
        return None;
    };

    match result {
        Ok(text) => Some(text),
        Err(e) => {
            reporter.warn(&format!("could not extract text from {}: {}", filename, e));
            None
        }
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Pulls `word/document.xml` out of the OOXML container and concatenates
/// paragraph texts in document order, one paragraph per line. Legacy binary
/// `.doc` bytes fail the ZIP parse and land in the `Err` arm.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Ooxml(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    extract_paragraphs(&doc_xml)
}

/// Walks `<w:p>` paragraph elements, collecting their `<w:t>` run texts.
/// Paragraphs are joined by a single newline; an empty paragraph
/// contributes an empty string, preserving a visible blank line.
fn extract_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"p" {
                    in_paragraph = true;
                    current.clear();
                } else if in_paragraph && name.as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(String::new());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(std::mem::take(&mut current));
                    in_paragraph = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs.join("\n"))
}
