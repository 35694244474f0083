//! The Word-Definitions Appender: one glossary section per
//! language that has a Words resource, entries already sorted by the
//! Words parser, each annotated with a stable anchor id
//! and, when any scripture resource was requested, a "Uses:" list built
//! from the word-uses accumulated during assembly (redesign note —
//! `WordsBook` itself is never mutated; the map is joined in here).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::assembly::ordering::Resources;
use crate::canon;
use crate::model::WordUse;

static FIRST_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<h[1-6]").unwrap());

/// Keyed by `(lang_code, localized_word)`, the side map the Assembly
/// Engine accumulates while draining each per-verse NOTE rewriter's
/// `take_uses()`.
pub type UsesByLangWord = HashMap<(String, String), Vec<WordUse>>;

/// Render every language's Word-Definitions section, in lang_code order.
/// Returns an empty string if no language requested Words.
pub fn render(resources: &Resources, uses: &UsesByLangWord, any_scripture_requested: bool) -> String {
    let mut lang_codes: Vec<&String> = resources.words.keys().collect();
    lang_codes.sort();

    let mut out = String::new();
    for lang_code in lang_codes {
        let words_book = &resources.words[lang_code];
        out.push_str(&format!(r#"<section class="word-definitions" lang="{lang_code}">"#));
        for (word, html) in &words_book.entries {
            let anchored = inject_anchor(html, lang_code, word);
            out.push_str(&anchored);
            if any_scripture_requested {
                if let Some(word_uses) = uses.get(&(lang_code.clone(), word.clone())) {
                    if !word_uses.is_empty() {
                        out.push_str(&render_uses(word_uses));
                    }
                }
            }
        }
        out.push_str("</section>");
    }
    out
}

/// Splice an `id="tw-{lang}-{word}"` attribute into the word's first
/// heading's opening tag. Same slice-and-splice approach the link
/// rewriter uses for `href=`/`src=` rewrites — edit the literal tag text,
/// no re-serialization.
fn inject_anchor(html: &str, lang_code: &str, word: &str) -> String {
    let Some(m) = FIRST_HEADING.find(html) else {
        return html.to_string();
    };
    let anchor = format!(r#" id="tw-{lang_code}-{word}""#);
    format!("{}{}{}", &html[..m.end()], anchor, &html[m.end()..])
}

fn render_uses(word_uses: &[WordUse]) -> String {
    let mut out = String::from(r#"<div class="uses"><h4>Uses:</h4><ul>"#);
    for use_ in word_uses {
        let book_num = canon::book_number(&use_.book_code).unwrap_or(0);
        let anchor = verse_anchor_id(&use_.lang_code, book_num, use_.chapter_num, &use_.verse_ref);
        out.push_str(&format!(
            r#"<li><a href="#{anchor}">{} {}:{}</a></li>"#,
            use_.book_name, use_.chapter_num, use_.verse_ref
        ));
    }
    out.push_str("</ul></div>");
    out
}

/// Same `{lang}-{book_num:03}-ch-{ch:03}-v-{vs:03}` scheme the Scripture
/// parser stamps onto verse spans.
fn verse_anchor_id(lang_code: &str, book_num: u32, chapter_num: u32, verse_ref: &str) -> String {
    if let Some((lo, hi)) = verse_ref.split_once('-') {
        format!("{lang_code}-{book_num:03}-ch-{chapter_num:03}-v-{lo:0>3}-{hi:0>3}")
    } else {
        format!("{lang_code}-{book_num:03}-ch-{chapter_num:03}-v-{verse_ref:0>3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookContent, LangDirection, WordsBook};

    fn words_book(lang: &str, entries: Vec<(&str, &str)>) -> BookContent {
        BookContent::Words(WordsBook {
            lang_code: lang.to_string(),
            entries: entries
                .into_iter()
                .map(|(w, h)| (w.to_string(), h.to_string()))
                .collect(),
        })
    }

    #[test]
    fn first_heading_gets_anchor_id() {
        let resources = Resources::from_contents(vec![words_book(
            "en",
            vec![("god", "<h3>God</h3><p>Description</p>")],
        )]);
        let rendered = render(&resources, &HashMap::new(), false);
        assert!(rendered.contains(r#"<h3 id="tw-en-god">God</h3>"#));
    }

    #[test]
    fn uses_omitted_without_scripture_request() {
        let resources = Resources::from_contents(vec![words_book("en", vec![("god", "<h3>God</h3>")])]);
        let mut uses = HashMap::new();
        uses.insert(
            ("en".to_string(), "god".to_string()),
            vec![WordUse {
                lang_code: "en".to_string(),
                book_code: "tit".to_string(),
                book_name: "Titus".to_string(),
                chapter_num: 1,
                verse_ref: "1".to_string(),
                localized_word: "god".to_string(),
            }],
        );
        let rendered = render(&resources, &uses, false);
        assert!(!rendered.contains("Uses:"));
    }

    #[test]
    fn uses_included_with_scripture_request() {
        let resources = Resources::from_contents(vec![words_book("en", vec![("god", "<h3>God</h3>")])]);
        let mut uses = HashMap::new();
        uses.insert(
            ("en".to_string(), "god".to_string()),
            vec![WordUse {
                lang_code: "en".to_string(),
                book_code: "tit".to_string(),
                book_name: "Titus".to_string(),
                chapter_num: 1,
                verse_ref: "1".to_string(),
                localized_word: "god".to_string(),
            }],
        );
        let rendered = render(&resources, &uses, true);
        assert!(rendered.contains("Uses:"));
        assert!(rendered.contains(r#"href="#en-056-ch-001-v-001""#));
    }
}
