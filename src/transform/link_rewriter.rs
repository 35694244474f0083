//! Rewrites each recognized link shape in the markdown event stream:
//! match the shape, splice in a replacement, pass everything else
//! through unchanged.
//!
//! Word-use accumulation lives here too, as a side effect of link
//! rewriting on per-verse content only: the caller sets the current
//! verse location before processing a verse's markdown, and drains
//! accumulated [`WordUse`] records with [`LinkRewriter::take_uses`] once
//! that verse is done, keeping `WordsBook` otherwise immutable.

use std::collections::HashSet;
use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;

use crate::model::{BookCode, ChapterNum, VerseRef, WordUse};

static WIKILINK_TW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[rc://([^/\]]+)/tw/dict/bible/([^/\]]+)/([^/\]]+)\]\]").unwrap()
});
static WIKILINK_TA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[rc://[^/\]]+/ta/man/[^\]]+\]\]").unwrap());

/// Where the verse content currently being rewritten lives, used to stamp
/// any [`WordUse`] records produced while rewriting it.
#[derive(Debug, Clone)]
pub struct VerseLocation {
    pub book_code: BookCode,
    pub book_name: String,
    pub chapter_num: ChapterNum,
    pub verse_ref: VerseRef,
}

/// Looks up whether a notes asset file exists on disk for
/// `(lang, book_num, chapter, verse)`, used by the scripture-ref link
/// shape. A trait rather than a bare closure so tests can
/// substitute a fixed answer without touching the filesystem.
pub trait NotesAssetLookup {
    fn exists(&self, lang_code: &str, book_num: u32, chapter: u32, verse: &str) -> bool;
}

pub struct AlwaysAbsent;
impl NotesAssetLookup for AlwaysAbsent {
    fn exists(&self, _lang_code: &str, _book_num: u32, _chapter: u32, _verse: &str) -> bool {
        false
    }
}

pub struct LinkRewriter<'a> {
    lang_code: String,
    known_words: &'a HashSet<String>,
    words_requested: bool,
    notes_lookup: &'a dyn NotesAssetLookup,
    location: Option<VerseLocation>,
    /// Whether matches recorded while this rewriter is active should be
    /// kept as [`WordUse`] entries.  accumulates word uses only from
    /// per-verse NOTE content; Questions and Commentary run through the
    /// same link-rewriting machinery but must not contribute uses.
    contributes_uses: bool,
    uses: Vec<WordUse>,
    in_link: Option<LinkState>,
}

struct LinkState {
    dest_url: String,
    label: String,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(
        lang_code: impl Into<String>,
        known_words: &'a HashSet<String>,
        words_requested: bool,
        notes_lookup: &'a dyn NotesAssetLookup,
    ) -> Self {
        LinkRewriter {
            lang_code: lang_code.into(),
            known_words,
            words_requested,
            notes_lookup,
            location: None,
            contributes_uses: false,
            uses: Vec::new(),
            in_link: None,
        }
    }

    pub fn set_location(&mut self, location: Option<VerseLocation>) {
        self.location = location;
    }

    /// Mark this rewriter's matches as contributing to the word-uses
    /// accumulator. Notes parsing turns this on; Questions and
    /// Commentary leave it off.
    pub fn set_contributes_uses(&mut self, contributes: bool) {
        self.contributes_uses = contributes;
    }

    /// Drain all `WordUse` records accumulated since the last call.
    pub fn take_uses(&mut self) -> Vec<WordUse> {
        std::mem::take(&mut self.uses)
    }

    pub fn apply<'e>(&mut self, event: Event<'e>) -> Option<Event<'e>> {
        match event {
            Event::Text(ref text) if self.in_link.is_none() => {
                let rewritten = self.rewrite_text(text);
                match rewritten {
                    Some(replacement) => Some(Event::Html(CowStr::from(replacement))),
                    None => Some(event),
                }
            }
            Event::Start(Tag::Link { ref dest_url, .. }) => {
                self.in_link = Some(LinkState {
                    dest_url: dest_url.to_string(),
                    label: String::new(),
                });
                None
            }
            Event::Text(ref text) => {
                if let Some(state) = self.in_link.as_mut() {
                    state.label.push_str(text);
                }
                None
            }
            Event::End(TagEnd::Link) => {
                let state = self.in_link.take()?;
                Some(Event::Html(CowStr::from(self.resolve_link(&state.dest_url, &state.label))))
            }
            _ => Some(event),
        }
    }

    fn rewrite_text(&mut self, text: &str) -> Option<String> {
        if !WIKILINK_TW.is_match(text) && !WIKILINK_TA.is_match(text) {
            return None;
        }
        let mut out = text.to_string();
        out = WIKILINK_TA.replace_all(&out, "").to_string();
        let matches: Vec<_> = WIKILINK_TW.captures_iter(&out.clone()).map(|c| {
            (
                c.get(0).unwrap().as_str().to_string(),
                c.get(1).unwrap().as_str().to_string(),
                c.get(3).unwrap().as_str().to_string(),
            )
        }).collect();
        for (whole, link_lang, word) in matches {
            let replacement = self.word_anchor_or_empty(&link_lang, &word);
            out = out.replacen(&whole, &replacement, 1);
        }
        Some(out)
    }

    fn word_anchor_or_empty(&mut self, link_lang: &str, word: &str) -> String {
        if link_lang == self.lang_code && self.words_requested && self.known_words.contains(word) {
            self.record_use(word);
            format!(r#"<a href="#tw-{}-{}">{}</a>"#, self.lang_code, word, word)
        } else {
            String::new()
        }
    }

    fn record_use(&mut self, word: &str) {
        if !self.contributes_uses {
            return;
        }
        if let Some(location) = &self.location {
            self.uses.push(WordUse {
                lang_code: self.lang_code.clone(),
                book_code: location.book_code.clone(),
                book_name: location.book_name.clone(),
                chapter_num: location.chapter_num,
                verse_ref: location.verse_ref.clone(),
                localized_word: word.to_string(),
            });
        }
    }

    fn resolve_link(&mut self, dest_url: &str, label: &str) -> String {
        if dest_url.contains("/ta/man/") || dest_url.starts_with("rc://") && dest_url.contains("/ta/") {
            return String::new();
        }
        if dest_url.contains("/obs/") {
            return label.to_string();
        }
        if let Some(word) = extract_tw_word(dest_url) {
            let replacement = self.word_anchor_or_empty(&self.lang_code.clone(), &word);
            if replacement.is_empty() {
                return String::new();
            }
            return format!(r#"<a href="#tw-{}-{}">{}</a>"#, self.lang_code, word, label);
        }
        if let Some((book_num, chapter, verse)) = extract_scripture_ref(dest_url) {
            if self.notes_lookup.exists(&self.lang_code, book_num, chapter, &verse) {
                return format!(
                    r#"<a href="#tn-{}-{:03}-{:03}-{:0>3}">{}</a>"#,
                    self.lang_code, book_num, chapter, verse, label
                );
            }
            return label.to_string();
        }
        format!(r#"<a href="{dest_url}">{label}</a>"#)
    }
}

fn extract_tw_word(dest_url: &str) -> Option<String> {
    if dest_url.starts_with("rc://") && dest_url.contains("/tw/dict/bible/") {
        return dest_url.rsplit('/').next().map(str::to_string);
    }
    if dest_url.ends_with(".md") && (dest_url.contains("/kt/") || dest_url.contains("/names/") || dest_url.contains("/other/")) {
        let stem = dest_url.rsplit('/').next()?;
        return Some(stem.trim_end_matches(".md").to_string());
    }
    None
}

fn extract_scripture_ref(dest_url: &str) -> Option<(u32, u32, String)> {
    static RC_REF: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"rc://[^/]+/tn/help/([a-z0-9]{3})/(\d+)/(\d+|\d+-\d+)").unwrap());
    static RELATIVE_REF: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\.\./(\d+)/(\d+|\d+-\d+)\.md$").unwrap());

    if let Some(caps) = RC_REF.captures(dest_url) {
        let book = caps.get(1)?.as_str();
        let book_num = crate::canon::book_number(book)?;
        let chapter: u32 = caps.get(2)?.as_str().parse().ok()?;
        let verse = caps.get(3)?.as_str().to_string();
        return Some((book_num, chapter, verse));
    }
    if let Some(caps) = RELATIVE_REF.captures(dest_url) {
        let chapter: u32 = caps.get(1)?.as_str().parse().ok()?;
        let verse = caps.get(2)?.as_str().to_string();
        // The book isn't present in a relative link; caller resolves it by
        // context. Signalled with book_num = 0, patched by the parser.
        return Some((0, chapter, verse));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Parser, html};

    fn render(markdown: &str, rewriter: &mut LinkRewriter<'_>) -> String {
        let events: Vec<_> = Parser::new(markdown)
            .filter_map(|e| rewriter.apply(e))
            .collect();
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    #[test]
    fn wikilink_to_known_word_becomes_anchor_and_records_use() {
        let known: HashSet<String> = ["god".to_string()].into_iter().collect();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, true, &lookup);
        rewriter.set_contributes_uses(true);
        rewriter.set_location(Some(VerseLocation {
            book_code: "tit".to_string(),
            book_name: "Titus".to_string(),
            chapter_num: 1,
            verse_ref: "1".to_string(),
        }));
        let html = render("See [[rc://en/tw/dict/bible/kt/god]] for more.", &mut rewriter);
        assert!(html.contains(r#"href="#tw-en-god""#));
        let uses = rewriter.take_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].localized_word, "god");
    }

    #[test]
    fn wikilink_to_unknown_word_is_removed() {
        let known: HashSet<String> = HashSet::new();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, true, &lookup);
        let html = render("See [[rc://en/tw/dict/bible/kt/nope]] here.", &mut rewriter);
        assert!(!html.contains("tw-en-nope"));
    }

    #[test]
    fn ta_wikilink_is_removed() {
        let known: HashSet<String> = HashSet::new();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, true, &lookup);
        let html = render("See [[rc://en/ta/man/translate/figs-metaphor]] here.", &mut rewriter);
        assert!(!html.contains("ta/man"));
    }

    #[test]
    fn obs_link_reduces_to_label() {
        let known: HashSet<String> = HashSet::new();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, true, &lookup);
        let html = render("[OBS Story 1](rc://en/obs/notes/frames/01-01)", &mut rewriter);
        assert!(html.contains("OBS Story 1"));
        assert!(!html.contains("href"));
    }
}
