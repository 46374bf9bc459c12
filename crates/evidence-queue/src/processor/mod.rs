//! Text extraction for uploaded files.
//!
//! Every processor works on in-memory bytes. The ingestion pipeline decides
//! what to do with the text (records, rows or a single free-text task).

pub mod docx;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::error::ProcessError;

/// How an uploaded file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// JSON or JSON Lines records.
    Structured,
    /// Comma-delimited rows with a header line.
    Delimited,
    /// Free text (plain, markdown, logs, unknown text types).
    Text,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "json" | "jsonl" | "ndjson" => Some(Self::Structured),
            "csv" => Some(Self::Delimited),
            "txt" | "text" | "md" | "log" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Resolves the format from an explicit extension, then the file name,
    /// then the MIME registry and finally the bytes themselves.
    ///
    /// Returns `None` for binary formats no processor understands.
    pub fn detect(name: &str, extension: Option<&str>, bytes: &[u8]) -> Option<Self> {
        let ext = declared_extension(name, extension);

        if let Some(format) = ext.as_deref().and_then(Self::from_extension) {
            return Some(format);
        }

        if let Some(ext) = ext.as_deref() {
            if let Some(mime) = mime_guess::from_ext(ext).first() {
                if mime.type_().as_str() == "text" {
                    return Some(Self::Text);
                }
                if mime.subtype().as_str() == "json" {
                    return Some(Self::Structured);
                }
                return None;
            }
        }

        // Unknown or missing extension: accept anything that decodes as UTF-8
        std::str::from_utf8(bytes).ok().map(|_| Self::Text)
    }

    /// Whether the text path (normalizer, delimited parser) applies.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Structured | Self::Delimited | Self::Text)
    }
}

/// Lowercased extension without the dot, preferring the explicit one.
pub fn declared_extension(name: &str, extension: Option<&str>) -> Option<String> {
    extension
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .or_else(|| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string)
        })
        .map(|e| e.to_lowercase())
}

const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type recorded for a file, `application/octet-stream` when unknown.
pub fn mime_type(name: &str, extension: Option<&str>) -> String {
    match declared_extension(name, extension) {
        Some(ext) => mime_guess::from_ext(&ext)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
        None => OCTET_STREAM.to_string(),
    }
}

pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new(max_pdf_pages: usize) -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(text::TextProcessor::new()),
            Box::new(pdf::PdfProcessor::new(max_pdf_pages)),
            Box::new(docx::DocxProcessor::new()),
        ];
        Self { processors }
    }

    pub fn extract(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String, ProcessError> {
        self.processors
            .iter()
            .find(|p| p.supports(format))
            .ok_or_else(|| ProcessError::UnsupportedFormat(format!("{:?}", format)))?
            .extract(bytes)
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new(10)
    }
}
