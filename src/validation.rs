//! validation rules, applied to a caller-supplied `DocumentRequest`
//! draft before it becomes the immutable request the pipeline consumes.

use std::collections::{BTreeSet, HashMap};

use crate::errors::Error;
use crate::model::{AssemblyLayoutKind, AssemblyStrategyKind, DocumentRequest, ResourceKind};

/// Validate `request` against four rules, then fill in a default
/// layout if the caller left it unset. Returns the (possibly layout-filled)
/// request, or a `Validation` error describing the first rule violated.
pub fn validate(mut request: DocumentRequest) -> Result<DocumentRequest, Error> {
    if request.layout_for_print && (request.generate_epub || request.generate_docx) {
        return Err(Error::Validation(
            "print layout cannot be combined with epub or docx generation".to_string(),
        ));
    }

    // The two-column invariants below are only checked against a layout the
    // caller explicitly set. `default_layout` below may itself pick the
    // two-column layout (book-then-language, non-print) without re-running
    // these checks — matching the original's `select_assembly_layout_kind`,
    // which assumes validation has already happened on caller-supplied
    // values and doesn't re-validate its own auto-selected layout.
    if let Some(layout) = request.assembly_layout_kind {
        if layout.is_two_column() {
            if request.assembly_strategy_kind != AssemblyStrategyKind::BookLanguageOrder {
                return Err(Error::Validation(
                    "two-column scripture-left-scripture-right layout requires book-then-language ordering"
                        .to_string(),
                ));
            }

            let scripture_langs = distinct_scripture_languages(&request);
            if scripture_langs.is_empty() || scripture_langs.len() % 2 != 0 {
                return Err(Error::Validation(
                    "two-column layout requires a non-zero, even number of scripture languages"
                        .to_string(),
                ));
            }

            if !book_sets_match_across_languages(&request) {
                return Err(Error::Validation(
                    "two-column layout requires identical book sets across scripture languages"
                        .to_string(),
                ));
            }
        }
    }

    request.assembly_layout_kind = Some(
        request
            .assembly_layout_kind
            .unwrap_or_else(|| default_layout(&request)),
    );

    Ok(request)
}

fn default_layout(request: &DocumentRequest) -> AssemblyLayoutKind {
    use AssemblyLayoutKind::*;
    use AssemblyStrategyKind::*;

    match (request.layout_for_print, request.assembly_strategy_kind) {
        (true, LanguageBookOrder) => OneColumnCompact,
        (false, LanguageBookOrder) => OneColumn,
        (false, BookLanguageOrder) => TwoColumnScriptureLeftScriptureRight,
        (true, BookLanguageOrder) => OneColumn,
    }
}

fn is_scripture_resource_type(resource_type: &str) -> bool {
    ResourceKind::classify(resource_type) == Some(ResourceKind::Scripture)
}

fn distinct_scripture_languages(request: &DocumentRequest) -> BTreeSet<&str> {
    request
        .resource_requests
        .iter()
        .filter(|r| is_scripture_resource_type(&r.resource_type))
        .map(|r| r.lang_code.as_str())
        .collect()
}

fn book_sets_match_across_languages(request: &DocumentRequest) -> bool {
    let mut books_by_lang: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for r in &request.resource_requests {
        if is_scripture_resource_type(&r.resource_type) {
            books_by_lang
                .entry(r.lang_code.as_str())
                .or_default()
                .insert(r.book_code.as_str());
        }
    }
    let mut sets = books_by_lang.values();
    match sets.next() {
        Some(first) => sets.all(|s| s == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChunkSize, ResourceRequest};

    fn base_request() -> DocumentRequest {
        DocumentRequest {
            email_address: None,
            assembly_strategy_kind: AssemblyStrategyKind::LanguageBookOrder,
            assembly_layout_kind: None,
            layout_for_print: false,
            chunk_size: ChunkSize::Chapter,
            generate_pdf: false,
            generate_epub: false,
            generate_docx: false,
            resource_requests: vec![ResourceRequest::new("en", "ulb", "tit")],
        }
    }

    #[test]
    fn print_and_epub_is_rejected() {
        let mut request = base_request();
        request.layout_for_print = true;
        request.generate_epub = true;
        assert!(validate(request).is_err());
    }

    #[test]
    fn fills_in_default_layout() {
        let request = base_request();
        let validated = validate(request).unwrap();
        assert_eq!(
            validated.assembly_layout_kind,
            Some(AssemblyLayoutKind::OneColumn)
        );
    }

    #[test]
    fn two_column_requires_book_language_order() {
        let mut request = base_request();
        request.assembly_layout_kind =
            Some(AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight);
        request.resource_requests = vec![
            ResourceRequest::new("en", "ulb", "tit"),
            ResourceRequest::new("es-419", "ulb", "tit"),
        ];
        assert!(validate(request).is_err());
    }

    #[test]
    fn two_column_requires_even_nonzero_languages() {
        let mut request = base_request();
        request.assembly_strategy_kind = AssemblyStrategyKind::BookLanguageOrder;
        request.assembly_layout_kind =
            Some(AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight);
        request.resource_requests = vec![ResourceRequest::new("en", "ulb", "tit")];
        assert!(validate(request).is_err());
    }

    #[test]
    fn two_column_requires_matching_book_sets() {
        let mut request = base_request();
        request.assembly_strategy_kind = AssemblyStrategyKind::BookLanguageOrder;
        request.assembly_layout_kind =
            Some(AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight);
        request.resource_requests = vec![
            ResourceRequest::new("en", "ulb", "tit"),
            ResourceRequest::new("es-419", "ulb", "col"),
        ];
        assert!(validate(request).is_err());
    }

    #[test]
    fn two_column_passes_with_matching_book_sets() {
        let mut request = base_request();
        request.assembly_strategy_kind = AssemblyStrategyKind::BookLanguageOrder;
        request.assembly_layout_kind =
            Some(AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight);
        request.resource_requests = vec![
            ResourceRequest::new("en", "ulb", "tit"),
            ResourceRequest::new("es-419", "ulb", "tit"),
        ];
        assert!(validate(request).is_ok());
    }
}
