//! Document text extraction.
//!
//! Dispatch is a flat lookup on the file extension (with a MIME hint for
//! plain text and markdown). Each format delegates to a parsing library that
//! is compiled in behind a cargo feature:
//!
//! | kind        | feature        | backend            |
//! |-------------|----------------|--------------------|
//! | txt / md    | always         | lossy UTF-8        |
//! | pdf         | `format-pdf`   | `pdf-extract`      |
//! | docx        | `format-ooxml` | `docx-rs`          |
//! | pptx        | `format-ooxml` | `zip` + `quick-xml`|
//! | xlsx / xls  | `format-sheet` | `calamine`         |
//!
//! Extraction is pure: bytes in, text out. Session bookkeeping lives in
//! [`crate::chat`].

#[cfg(feature = "format-ooxml")]
mod docx;
#[cfg(feature = "format-ooxml")]
mod ooxml;
#[cfg(feature = "format-pdf")]
mod pdf;
#[cfg(feature = "format-ooxml")]
mod pptx;
#[cfg(feature = "format-sheet")]
mod sheet;

use std::fmt;

use thiserror::Error;
use tracing::debug;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("file type '{0}' is not supported or its reader is not built in")]
    Unsupported(String),
    #[error(".doc files are not fully supported; convert the file to .docx and try again")]
    LegacyDoc,
    #[error("failed to read PDF file: {0}")]
    Pdf(String),
    #[error("failed to read DOCX file: {0}")]
    Docx(String),
    #[error("failed to read PPTX file: {0}")]
    Pptx(String),
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("extraction did not finish: {0}")]
    Aborted(String),
}

// ── Upload ────────────────────────────────────────────────────────────────────

/// A file handed to the assistant: its display name, raw bytes, and an
/// optional MIME type reported by whoever supplied it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes, mime: None }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Lowercased extension of [`Upload::name`]; see [`file_extension`].
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }
}

/// Text after the last `.` in `name`, lowercased.
///
/// A name without a dot yields the whole name, so `"README"` → `"readme"`.
pub fn file_extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

// ── Kind ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Markdown,
    Pdf,
    Docx,
    Doc,
    Pptx,
    Xlsx,
    Xls,
}

impl DocumentKind {
    /// Resolve the extractor for an upload. `None` means unsupported.
    pub fn from_upload(upload: &Upload) -> Option<Self> {
        let ext = upload.extension();
        let mime = upload.mime.as_deref().unwrap_or_default();
        if ext == "txt" || mime == "text/plain" {
            return Some(Self::Text);
        }
        if ext == "md" || mime == "text/markdown" {
            return Some(Self::Markdown);
        }
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        };
        f.write_str(s)
    }
}

/// Extensions offered to the user, in display order.
///
/// Plain text, markdown and PDF are always listed; the office formats only
/// when their reader is compiled in.
pub fn supported_extensions() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut types = vec!["txt", "md", "pdf"];
    #[cfg(feature = "format-ooxml")]
    types.extend(["docx", "doc", "pptx"]);
    #[cfg(feature = "format-sheet")]
    types.extend(["xlsx", "xls"]);
    types
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Extract the text of `upload`.
///
/// The returned text may be blank; deciding what a blank document means is
/// the caller's business.
pub fn extract(upload: &Upload) -> Result<String, ExtractError> {
    let Some(kind) = DocumentKind::from_upload(upload) else {
        return Err(ExtractError::Unsupported(upload.extension()));
    };
    debug!(name = %upload.name, %kind, bytes = upload.bytes.len(), "extracting document text");

    match kind {
        DocumentKind::Text | DocumentKind::Markdown => {
            Ok(String::from_utf8_lossy(&upload.bytes).into_owned())
        }
        DocumentKind::Pdf => extract_pdf(&upload.bytes),
        DocumentKind::Docx => extract_docx(&upload.bytes),
        DocumentKind::Doc => extract_doc(),
        DocumentKind::Pptx => extract_pptx(&upload.bytes),
        DocumentKind::Xlsx | DocumentKind::Xls => extract_sheet(kind, &upload.bytes),
    }
}

#[cfg(feature = "format-pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf::extract(bytes)
}

#[cfg(not(feature = "format-pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("pdf".into()))
}

#[cfg(feature = "format-ooxml")]
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    docx::extract(bytes)
}

#[cfg(not(feature = "format-ooxml"))]
fn extract_docx(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("docx".into()))
}

#[cfg(feature = "format-ooxml")]
fn extract_doc() -> Result<String, ExtractError> {
    Err(ExtractError::LegacyDoc)
}

#[cfg(not(feature = "format-ooxml"))]
fn extract_doc() -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("doc".into()))
}

#[cfg(feature = "format-ooxml")]
fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    pptx::extract(bytes)
}

#[cfg(not(feature = "format-ooxml"))]
fn extract_pptx(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("pptx".into()))
}

#[cfg(feature = "format-sheet")]
fn extract_sheet(_kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    sheet::extract(bytes)
}

#[cfg(not(feature = "format-sheet"))]
fn extract_sheet(kind: DocumentKind, _bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported(kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_last_segment() {
        assert_eq!(file_extension("Report.Final.PDF"), "pdf");
        assert_eq!(file_extension("notes.md"), "md");
        assert_eq!(file_extension("README"), "readme");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("TXT"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_extension("docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_extension("xls"), Some(DocumentKind::Xls));
        assert_eq!(DocumentKind::from_extension("exe"), None);
    }

    #[test]
    fn mime_hint_selects_text() {
        let up = Upload::new("clipboard", b"hi".to_vec()).with_mime("text/plain");
        assert_eq!(DocumentKind::from_upload(&up), Some(DocumentKind::Text));
        let up = Upload::new("notes", b"# hi".to_vec()).with_mime("text/markdown");
        assert_eq!(DocumentKind::from_upload(&up), Some(DocumentKind::Markdown));
    }

    #[test]
    fn text_decodes_lossily() {
        let up = Upload::new("a.txt", vec![b'o', b'k', 0xff, b'!']);
        assert_eq!(extract(&up).unwrap(), "ok\u{fffd}!");
    }

    #[test]
    fn markdown_passes_through() {
        let up = Upload::new("README.MD", b"# Title\nbody".to_vec());
        assert_eq!(extract(&up).unwrap(), "# Title\nbody");
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let up = Upload::new("archive.tar.gz", vec![1, 2, 3]);
        assert_eq!(extract(&up), Err(ExtractError::Unsupported("gz".into())));
    }

    #[test]
    fn supported_always_has_core_types() {
        let types = supported_extensions();
        assert_eq!(&types[..3], &["txt", "md", "pdf"]);
    }

    #[cfg(feature = "format-ooxml")]
    #[test]
    fn legacy_doc_is_rejected_with_hint() {
        let up = Upload::new("old.doc", vec![0xd0, 0xcf, 0x11, 0xe0]);
        let err = extract(&up).unwrap_err();
        assert_eq!(err, ExtractError::LegacyDoc);
        assert!(err.to_string().contains(".docx"));
    }

    #[cfg(feature = "format-pdf")]
    #[test]
    fn garbage_pdf_is_an_error() {
        let up = Upload::new("broken.pdf", b"not a pdf at all".to_vec());
        assert!(matches!(extract(&up), Err(ExtractError::Pdf(_))));
    }

    #[cfg(feature = "format-sheet")]
    #[test]
    fn garbage_spreadsheet_is_an_error() {
        let up = Upload::new("broken.xlsx", b"PK nope".to_vec());
        assert!(matches!(extract(&up), Err(ExtractError::Spreadsheet(_))));
    }
}
