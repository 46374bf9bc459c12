use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads paragraph text from the main document part of a DOCX archive.
pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for DocxProcessor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open DOCX: {}", e)))?;

        let xml = read_document_part(&mut archive)?;
        parse_document_xml(&xml)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

fn read_document_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ProcessError> {
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
        ProcessError::DocxProcessing(format!("Failed to find {}: {}", DOCUMENT_PART, e))
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| {
        ProcessError::DocxProcessing(format!("Failed to read {}: {}", DOCUMENT_PART, e))
    })?;
    Ok(xml)
}

/// Concatenates `w:t` runs, one line per `w:p` paragraph. Tabs and breaks
/// inside a paragraph become whitespace.
fn parse_document_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let decoded = e.decode().unwrap_or_default();
                text.push_str(&decoded);
            }
            Ok(Event::GeneralRef(e)) if in_run_text => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else if let Ok(name) = e.decode() {
                    if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(&name) {
                        text.push_str(resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}
