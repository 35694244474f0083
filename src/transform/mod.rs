//! The Markup Transformers: a section-removal filter and a
//! link-rewriting filter, applied in that fixed order to every lightweight
//! markup file before its conversion to HTML.

mod link_rewriter;
mod section_remover;

pub use link_rewriter::{AlwaysAbsent, LinkRewriter, NotesAssetLookup, VerseLocation};
pub use section_remover::SectionRemover;

use pulldown_cmark::{Parser, html};

/// Run `markdown` through the section remover then the link rewriter,
/// returning the resulting HTML. `rewriter` accumulates any `WordUse`
/// records produced while processing; drain them with `take_uses()`
/// after this call if `location` was set.
pub fn transform_to_html(
    markdown: &str,
    removed_titles: &std::collections::HashSet<String>,
    rewriter: &mut LinkRewriter<'_>,
) -> String {
    let mut remover = SectionRemover::new(removed_titles.clone());
    let events: Vec<_> = Parser::new(markdown)
        .flat_map(|event| remover.apply(event))
        .filter_map(|event| rewriter.apply(event))
        .collect();
    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());
    html_out
}
