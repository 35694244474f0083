//! Seams for the collaborators this crate hands a finished document to but
//! does not itself implement: format conversion (PDF/ePub/DOCX) and
//! delivery (email, or whatever sits behind an HTTP façade). The core's
//! job ends at [`crate::assemble_document`]; these traits exist so a
//! caller can plug in the real collaborator without the core needing to
//! know what one looks like, and so tests can exercise the seam with a
//! stand-in.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Error;
use crate::model::AssembledDocument;

/// One of the formats a [`crate::model::DocumentRequest`] may ask to be
/// rendered into alongside the HTML artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Epub,
    Docx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Epub => "epub",
            OutputFormat::Docx => "docx",
        }
    }
}

/// Converts an assembled HTML document into another output format. A real
/// implementation shells out to (or links against) the format-specific
/// converter; this crate only defines the seam.
pub trait FormatConverter {
    fn convert(&self, html: &str, document_key: &str, format: OutputFormat, output_dir: &Path) -> Result<PathBuf, Error>;
}

/// A [`FormatConverter`] that performs no real conversion: it writes the
/// HTML bytes through unchanged under the requested format's extension.
/// Exists so the seam is exercisable in tests without a PDF/ePub/DOCX
/// toolchain on hand.
pub struct EchoFormatConverter;

impl FormatConverter for EchoFormatConverter {
    fn convert(&self, html: &str, document_key: &str, format: OutputFormat, output_dir: &Path) -> Result<PathBuf, Error> {
        debug!(%document_key, format = format.extension(), "echoing HTML in place of a real conversion");
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{document_key}.{}", format.extension()));
        std::fs::write(&path, html)?;
        Ok(path)
    }
}

/// Hands a finished document to whatever delivers it onward (email, an
/// HTTP response body, a task-queue result slot). A real implementation
/// talks to an SMTP relay or the façade's response channel; this crate
/// only defines the seam.
pub trait DocumentSink {
    fn deliver(&self, document: &AssembledDocument, email_address: Option<&str>) -> Result<(), Error>;
}

/// A [`DocumentSink`] that only logs. Exists for the same reason
/// [`EchoFormatConverter`] does: to exercise the seam without a real mail
/// relay or façade on hand.
pub struct NullSink;

impl DocumentSink for NullSink {
    fn deliver(&self, document: &AssembledDocument, email_address: Option<&str>) -> Result<(), Error> {
        debug!(
            document_key = %document.document_key,
            email_address,
            "no-op delivery: document produced, not actually sent anywhere"
        );
        Ok(())
    }
}

/// Run every requested format conversion for an already-assembled
/// document, returning the paths written. Intended to be called by a
/// caller-owned collaborator, not by the core pipeline itself.
pub fn convert_requested_formats(
    converter: &dyn FormatConverter,
    document: &AssembledDocument,
    output_dir: &Path,
    generate_pdf: bool,
    generate_epub: bool,
    generate_docx: bool,
) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();
    let requested = [
        (generate_pdf, OutputFormat::Pdf),
        (generate_epub, OutputFormat::Epub),
        (generate_docx, OutputFormat::Docx),
    ];
    for (requested, format) in requested {
        if requested {
            paths.push(converter.convert(&document.html, &document.document_key, format, output_dir)?);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssembledDocument;
    use tempfile::TempDir;

    fn sample_document() -> AssembledDocument {
        AssembledDocument {
            document_key: "abc123".to_string(),
            html: "<html></html>".to_string(),
            statuses: Vec::new(),
            output_path: PathBuf::from("abc123.html"),
        }
    }

    #[test]
    fn echo_converter_writes_html_under_requested_extension() {
        let dir = TempDir::new().unwrap();
        let path = EchoFormatConverter
            .convert("<html></html>", "abc123", OutputFormat::Epub, dir.path())
            .unwrap();
        assert_eq!(path.extension().unwrap(), "epub");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn convert_requested_formats_only_runs_requested_ones() {
        let dir = TempDir::new().unwrap();
        let document = sample_document();
        let paths = convert_requested_formats(&EchoFormatConverter, &document, dir.path(), true, false, true).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().any(|p| p.extension().unwrap() == "pdf"));
        assert!(paths.iter().any(|p| p.extension().unwrap() == "docx"));
        assert!(!paths.iter().any(|p| p.extension().unwrap() == "epub"));
    }

    #[test]
    fn null_sink_accepts_any_document_without_erroring() {
        let document = sample_document();
        NullSink.deliver(&document, Some("reader@example.org")).unwrap();
    }
}
