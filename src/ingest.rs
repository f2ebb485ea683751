//! Plain-text extraction from uploaded files.
//!
//! Only PDF and plain text are understood. Anything else comes back as an
//! explicit unsupported marker rather than an error, and no size limit is
//! applied.

use crate::error::{AssistantError, Result};
use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Text returned by [`extract_text`] for files of an unsupported type.
pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type";

/// Outcome of reading an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Unsupported { mime: String },
}

impl Extraction {
    /// The extracted text, or [`UNSUPPORTED_FILE_TYPE`].
    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(text) => text,
            Extraction::Unsupported { .. } => UNSUPPORTED_FILE_TYPE.to_string(),
        }
    }

    /// Convert an unsupported extraction into an error.
    pub fn require_text(self) -> Result<String> {
        match self {
            Extraction::Text(text) => Ok(text),
            Extraction::Unsupported { mime } => Err(AssistantError::UnsupportedFileType(mime)),
        }
    }
}

/// Extract text from file contents with the declared MIME type.
pub fn extract(bytes: &[u8], mime: &str) -> Result<Extraction> {
    match mime {
        MIME_PDF => pdf_extract::extract_text_from_mem(bytes)
            .map(Extraction::Text)
            .map_err(|e| AssistantError::Parse(format!("PDF extraction failed: {}", e))),
        MIME_TEXT => String::from_utf8(bytes.to_vec())
            .map(Extraction::Text)
            .map_err(|e| AssistantError::Parse(format!("Text file is not valid UTF-8: {}", e))),
        other => Ok(Extraction::Unsupported {
            mime: other.to_string(),
        }),
    }
}

/// Extract text, returning [`UNSUPPORTED_FILE_TYPE`] for unknown types.
pub fn extract_text(bytes: &[u8], mime: &str) -> Result<String> {
    extract(bytes, mime).map(Extraction::into_text)
}

/// MIME type implied by a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => MIME_PDF,
        Some("txt") | Some("text") | Some("md") => MIME_TEXT,
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = extract_text("Hello, cell.".as_bytes(), MIME_TEXT).unwrap();
        assert_eq!(text, "Hello, cell.");
    }

    #[test]
    fn test_unsupported_type_returns_sentinel() {
        let text = extract_text(&[0x89, 0x50, 0x4e, 0x47], "image/png").unwrap();
        assert_eq!(text, UNSUPPORTED_FILE_TYPE);

        let extraction = extract(&[], "image/png").unwrap();
        assert_eq!(
            extraction,
            Extraction::Unsupported {
                mime: "image/png".to_string()
            }
        );
        assert!(matches!(
            extraction.require_text(),
            Err(AssistantError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = extract_text(&[0xff, 0xfe, 0xfd], MIME_TEXT).unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)));
    }

    #[test]
    fn test_garbage_pdf_is_parse_error() {
        let err = extract_text(b"definitely not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("paper.PDF")), MIME_PDF);
        assert_eq!(mime_for_path(Path::new("notes.txt")), MIME_TEXT);
        assert_eq!(
            mime_for_path(Path::new("diagram.png")),
            "application/octet-stream"
        );
    }
}
