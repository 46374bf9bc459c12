use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

const BOM: char = '\u{feff}';

/// Decodes text-like uploads. Invalid UTF-8 sequences become U+FFFD.
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        Ok(decode(bytes))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        format.is_textual()
    }
}

pub fn decode(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_bom() {
        assert_eq!(decode("\u{feff}hello".as_bytes()), "hello");
        assert_eq!(decode(b"plain"), "plain");
    }

    #[test]
    fn test_decode_is_lossy() {
        let text = decode(&[b'o', b'k', 0xff, b'!']);
        assert_eq!(text, "ok\u{fffd}!");
    }

    #[test]
    fn test_supports_textual_formats() {
        let processor = TextProcessor::new();
        assert!(processor.supports(DocumentFormat::Text));
        assert!(processor.supports(DocumentFormat::Structured));
        assert!(processor.supports(DocumentFormat::Delimited));
        assert!(!processor.supports(DocumentFormat::Pdf));
        assert!(!processor.supports(DocumentFormat::Docx));
    }
}
