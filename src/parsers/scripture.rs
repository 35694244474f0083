//! The Scripture parser (SCR): turns one-or-many USFM files into a
//! [`ScriptureBook`] keyed by chapter and verse.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use glob::glob;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::canon;
use crate::errors::Error;
use crate::model::{ScriptureBook, ScriptureChapter};
use crate::parsers::manifest;
use crate::parsers::shared::strip_leading_zeros;
use crate::parsers::usfm::{self, UsfmToHtml};

static CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<h2 class="c-num">(\d+)</h2>"#).unwrap());
static VERSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="v-num" id="v-([0-9]+(?:-[0-9]+)?)">"#).unwrap());
static FOOTNOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="footnotes">.*?</div>"#).unwrap());
static FOOTNOTE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<a class="footnote-ref"[^>]*>(.*?)</a>"#).unwrap());

#[instrument(skip(converter), fields(book_code, lang_code))]
pub fn parse_scripture(
    resource_root: &Path,
    lang_code: &str,
    lang_name: &str,
    book_code: &str,
    resource_type_name: &str,
    print_mode: bool,
    converter: &dyn UsfmToHtml,
) -> Result<ScriptureBook, Error> {
    let lang_direction = manifest::read_lang_direction(resource_root);

    let usfm_text = locate_and_synthesize_usfm(resource_root, book_code, lang_name)?;
    let mut html = converter.convert(&usfm_text);

    if print_mode {
        html = FOOTNOTE_REF_RE.replace_all(&html, r#"<span class="footnote-ref">$1</span>"#).to_string();
    }

    let chapters = extract_chapters(&html, lang_code, book_code)?;

    Ok(ScriptureBook {
        lang_code: lang_code.to_string(),
        lang_name: lang_name.to_string(),
        lang_direction,
        book_code: book_code.to_string(),
        resource_type_name: resource_type_name.to_string(),
        chapters,
    })
}

/// Two-path glob lookup: a single book file
/// first, then a multi-file chapter-directory layout, rescued into one
/// synthesized document.
fn locate_and_synthesize_usfm(root: &Path, book_code: &str, book_name: &str) -> Result<String, Error> {
    let single_pattern = format!("{}/**/*{}*.usfm", root.display(), book_code.to_uppercase());
    let single_matches: Vec<_> = glob(&single_pattern)
        .map(|paths| paths.flatten().collect())
        .unwrap_or_default();

    if let Some(path) = single_matches.first() {
        debug!(path = %path.display(), "found single-file USFM");
        let text = std::fs::read_to_string(path)?;
        return Ok(usfm::repair_chapter_marker_not_on_own_line(&text));
    }

    let multi_pattern = format!("{}/**/{}/**/*.usfm", root.display(), book_code);
    let multi_matches: Vec<_> = glob(&multi_pattern)
        .map(|paths| paths.flatten().collect())
        .unwrap_or_default();

    if multi_matches.is_empty() {
        return Err(Error::MalformedAsset {
            lang_code: String::new(),
            resource_type: "scr".to_string(),
            book_code: book_code.to_string(),
            reason: "no USFM files found under resource root".to_string(),
        });
    }

    let mut by_chapter: BTreeMap<u32, String> = BTreeMap::new();
    for path in multi_matches {
        let chapter_num = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        let text = std::fs::read_to_string(&path)?;
        by_chapter.entry(chapter_num).or_default().push_str(&text);
        by_chapter.entry(chapter_num).or_default().push('\n');
    }

    let chapters: Vec<(u32, String)> = by_chapter.into_iter().collect();
    Ok(usfm::rescue_multi_file_usfm(book_code, book_name, chapters))
}

fn extract_chapters(
    html: &str,
    lang_code: &str,
    book_code: &str,
) -> Result<BTreeMap<u32, ScriptureChapter>, Error> {
    let book_num = canon::book_number(book_code).unwrap_or(0);
    let chapter_matches: Vec<_> = CHAPTER_RE.captures_iter(html).collect();
    let mut chapters = BTreeMap::new();

    for (i, caps) in chapter_matches.iter().enumerate() {
        let whole = caps.get(0).unwrap();
        let chapter_num: u32 = caps[1].parse().unwrap_or(0);
        let body_start = whole.end();
        let body_end = chapter_matches
            .get(i + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(html.len());
        let chapter_slice = &html[body_start..body_end];

        let footnotes_html = FOOTNOTES_RE
            .find(chapter_slice)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let content_without_footnotes = FOOTNOTES_RE.replace(chapter_slice, "").to_string();

        let verses = extract_verses(chapter_slice, lang_code, book_num, chapter_num);

        chapters.insert(
            chapter_num,
            ScriptureChapter {
                fragments: vec![content_without_footnotes],
                verses,
                footnotes_html,
            },
        );
    }

    if chapters.is_empty() {
        warn!("converted USFM produced no chapter headings");
    }

    Ok(chapters)
}

fn extract_verses(
    chapter_html: &str,
    lang_code: &str,
    book_num: u32,
    chapter_num: u32,
) -> BTreeMap<String, String> {
    let footnotes_start = FOOTNOTES_RE.find(chapter_html).map(|m| m.start()).unwrap_or(chapter_html.len());
    let verse_matches: Vec<_> = VERSE_RE.captures_iter(chapter_html).collect();
    let mut verses = BTreeMap::new();

    for (i, caps) in verse_matches.iter().enumerate() {
        let whole = caps.get(0).unwrap();
        let raw_ref = strip_leading_zeros(&caps[1]);
        let body_start = whole.start();
        let body_end = verse_matches
            .get(i + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(footnotes_start);
        let slice = &chapter_html[body_start..body_end];
        let rewritten = rewrite_verse_id(slice, lang_code, book_num, chapter_num, &raw_ref);
        verses.insert(raw_ref, rewritten);
    }

    verses
}

fn rewrite_verse_id(slice: &str, lang_code: &str, book_num: u32, chapter_num: u32, verse_ref: &str) -> String {
    let new_id = if let Some((lo, hi)) = verse_ref.split_once('-') {
        format!(
            "{lang_code}-{book_num:03}-ch-{chapter_num:03}-v-{lo:0>3}-{hi:0>3}"
        )
    } else {
        format!("{lang_code}-{book_num:03}-ch-{chapter_num:03}-v-{verse_ref:0>3}")
    };
    VERSE_RE.replacen(slice, 1, format!(r#"<span class="v-num" id="{new_id}">"#)).to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::usfm::InlineUsfmConverter;
    use tempfile::TempDir;

    fn write_usfm(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn parses_single_file_book() {
        let dir = TempDir::new().unwrap();
        write_usfm(
            dir.path(),
            "57-TIT.usfm",
            "\\id TIT\n\\ide UTF-8\n\\h Titus\n\\c 1\n\\p\n\\v 1 Paul, a servant of God.\n\\v 2 In hope of eternal life.\n\\c 2\n\\p\n\\v 1 Speak the things.\n",
        );
        let book = parse_scripture(dir.path(), "en", "English", "tit", "ulb", false, &InlineUsfmConverter).unwrap();
        assert_eq!(book.chapters.len(), 2);
        let ch1 = &book.chapters[&1];
        assert_eq!(ch1.verses.len(), 2);
        assert!(ch1.verses["1"].contains("en-056-ch-001-v-001"));
    }

    #[test]
    fn multi_file_layout_is_rescued_and_sorted() {
        let dir = TempDir::new().unwrap();
        let ch2 = dir.path().join("tit").join("02");
        let ch1 = dir.path().join("tit").join("01");
        std::fs::create_dir_all(&ch1).unwrap();
        std::fs::create_dir_all(&ch2).unwrap();
        write_usfm(&ch1, "01.usfm", "\\v 1 First chapter, first verse.\n");
        write_usfm(&ch2, "01.usfm", "\\v 1 Second chapter, first verse.\n");

        let book = parse_scripture(dir.path(), "en", "English", "tit", "ulb", false, &InlineUsfmConverter).unwrap();
        assert_eq!(book.chapters.len(), 2);
        assert!(book.chapters[&1].verses.contains_key("1"));
        assert!(book.chapters[&2].verses.contains_key("1"));
    }

    #[test]
    fn print_mode_neuters_footnote_links() {
        let dir = TempDir::new().unwrap();
        write_usfm(
            dir.path(),
            "57-TIT.usfm",
            "\\id TIT\n\\h Titus\n\\c 1\n\\v 1 Text\\f + \\fr 1:1 \\ft A note.\\f*.\n",
        );
        let book = parse_scripture(dir.path(), "en", "English", "tit", "ulb", true, &InlineUsfmConverter).unwrap();
        let verse = &book.chapters[&1].verses["1"];
        assert!(!verse.contains("<a class=\"footnote-ref\""));
    }
}
