//! USFM rescue and conversion, grounded in
//! `original_source/backend/document/domain/parsing.py`'s
//! `attempt_asset_content_rescue` and `ensure_paragraph_before_verses`.
//!
//! `rescue_multi_file_usfm` synthesizes one book-level USFM document out of
//! a directory of per-chapter/per-verse files; `repair_chapter_marker_not_on_own_line`
//! fixes chapter markers that carry trailing content on the same line.
//! `UsfmToHtml` is the "inline converter" choice: a narrow, explicit
//! state machine over the marker subset the downstream extraction
//! needs, rather than a full USFM grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CHAPTER_MARKER_TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\c[ \t]+(\d+)[ \t]+(\S[^\n]*)").unwrap());

// The marker group stops at an optional trailing `*` (the character-style
// close marker, e.g. `\f*`) rather than swallowing whatever non-whitespace
// text immediately follows it; the rest of the line is `\S+`'s old hunting
// ground but now correctly falls into the content group instead.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\\([A-Za-z0-9]+\*?)([^\\]*)").unwrap());

/// Fix every chapter marker that has trailing content on the same line by
/// splitting it onto its own line and inserting a paragraph marker
/// immediately after.
pub fn repair_chapter_marker_not_on_own_line(usfm: &str) -> String {
    CHAPTER_MARKER_TRAILING
        .replace_all(usfm, |caps: &Captures<'_>| {
            format!("\\c {}\n\\p {}", &caps[1], &caps[2])
        })
        .into_owned()
}

/// Synthesize a single book-level USFM document from per-chapter verse
/// content, in chapter order, with the three required header markers
/// prepended (`id`, `ide`, `h`).
pub fn rescue_multi_file_usfm(
    book_code: &str,
    book_name: &str,
    mut chapters: Vec<(u32, String)>,
) -> String {
    chapters.sort_by_key(|(num, _)| *num);

    let mut usfm = String::new();
    usfm.push_str(&format!("\\id {} unknown\n", book_code.to_uppercase()));
    usfm.push_str("\\ide UTF-8\n");
    usfm.push_str(&format!("\\h {book_name}\n"));

    for (num, content) in &chapters {
        usfm.push_str(&format!("\\c {num}\n"));
        usfm.push_str(content);
        usfm.push('\n');
    }

    repair_chapter_marker_not_on_own_line(&usfm)
}

/// Converts synthesized USFM to HTML. The default implementation is the
/// inline converter below; the trait exists so tests (and, potentially, a
/// future external-binary implementation) can substitute another converter.
pub trait UsfmToHtml {
    fn convert(&self, usfm: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineUsfmConverter;

impl UsfmToHtml for InlineUsfmConverter {
    fn convert(&self, usfm: &str) -> String {
        convert_inline(usfm)
    }
}

fn convert_inline(usfm: &str) -> String {
    let mut html = String::new();
    let mut footnotes: Vec<String> = Vec::new();
    let mut verse_open = false;
    let mut para_open = false;
    let mut in_footnote = false;
    let mut footnote_buf = String::new();

    for caps in TOKEN_RE.captures_iter(usfm) {
        let marker = &caps[1];
        let content = caps[2].trim();

        match marker {
            "id" | "ide" | "h" | "toc1" | "toc2" | "toc3" | "mt" | "mt1" | "mt2" => {}
            "c" => {
                if verse_open {
                    html.push_str("</span>");
                    verse_open = false;
                }
                if para_open {
                    html.push_str("</p>");
                    para_open = false;
                }
                if !footnotes.is_empty() {
                    flush_footnotes(&mut html, &mut footnotes);
                }
                let (num, rest) = split_first_token(content);
                html.push_str(&format!(r#"<h2 class="c-num">{num}</h2>"#));
                if !rest.is_empty() {
                    html.push_str("<p>");
                    html.push_str(&escape(rest));
                    para_open = true;
                }
            }
            "p" | "m" => {
                if para_open {
                    html.push_str("</p>");
                }
                html.push_str("<p>");
                para_open = true;
                html.push_str(&escape(content));
            }
            "q1" | "q2" | "q3" => {
                if para_open {
                    html.push_str("</p>");
                }
                html.push_str(&format!(r#"<p class="{marker}">"#));
                para_open = true;
                html.push_str(&escape(content));
            }
            "s1" | "s2" => {
                html.push_str(&format!("<h3>{}</h3>", escape(content)));
            }
            "v" => {
                if verse_open {
                    html.push_str("</span>");
                }
                let (num, rest) = split_first_token(content);
                html.push_str(&format!(r#"<span class="v-num" id="v-{num}">"#));
                verse_open = true;
                html.push_str(&escape(rest));
            }
            "f" => {
                in_footnote = true;
                footnote_buf.clear();
                let n = footnotes.len() + 1;
                html.push_str(&format!(r##"<a class="footnote-ref" href="#fn-{n}">[{n}]</a>"##));
            }
            "f*" => {
                in_footnote = false;
                footnotes.push(std::mem::take(&mut footnote_buf));
                if !content.is_empty() {
                    html.push_str(&escape(content));
                }
            }
            "fr" | "ft" => {
                if in_footnote {
                    footnote_buf.push_str(content);
                    footnote_buf.push(' ');
                }
            }
            _ => {
                if in_footnote {
                    footnote_buf.push_str(content);
                } else {
                    html.push_str(&escape(content));
                }
            }
        }
    }

    if verse_open {
        html.push_str("</span>");
    }
    if para_open {
        html.push_str("</p>");
    }
    flush_footnotes(&mut html, &mut footnotes);
    html
}

fn flush_footnotes(html: &mut String, footnotes: &mut Vec<String>) {
    if footnotes.is_empty() {
        return;
    }
    html.push_str(r#"<div class="footnotes">"#);
    for (i, note) in footnotes.iter().enumerate() {
        html.push_str(&format!("<p id=\"fn-{}\">{}</p>", i + 1, escape(note.trim())));
    }
    html.push_str("</div>");
    footnotes.clear();
}

fn split_first_token(content: &str) -> (&str, &str) {
    match content.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (content, ""),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_chapter_marker_with_trailing_content() {
        let input = "\\c 3 \\p Some text that followed on the same line";
        let repaired = repair_chapter_marker_not_on_own_line(input);
        assert!(repaired.contains("\\c 3\n\\p"));
    }

    #[test]
    fn rescue_prepends_header_and_sorts_chapters() {
        let chapters = vec![
            (2, "\\v 1 Second chapter verse one.".to_string()),
            (1, "\\v 1 First chapter verse one.".to_string()),
        ];
        let usfm = rescue_multi_file_usfm("tit", "Titus", chapters);
        assert!(usfm.starts_with("\\id TIT unknown\n\\ide UTF-8\n\\h Titus\n"));
        let c1 = usfm.find("\\c 1").unwrap();
        let c2 = usfm.find("\\c 2").unwrap();
        assert!(c1 < c2);
    }

    #[test]
    fn inline_converter_emits_chapter_and_verse_markup() {
        let usfm = "\\id TIT unknown\n\\ide UTF-8\n\\h Titus\n\\c 1\n\\p\n\\v 1 Paul, a servant.\n\\v 2 In hope of eternal life.\n";
        let html = InlineUsfmConverter.convert(usfm);
        assert!(html.contains(r#"<h2 class="c-num">1</h2>"#));
        assert!(html.contains(r#"id="v-1""#));
        assert!(html.contains(r#"id="v-2""#));
    }

    #[test]
    fn footnotes_are_collected_into_a_trailing_block() {
        let usfm = "\\c 1\n\\v 1 Text\\f + \\fr 1:1 \\ft A note.\\f*more.\n";
        let html = InlineUsfmConverter.convert(usfm);
        assert!(html.contains(r#"class="footnotes""#));
        assert!(html.contains("A note."));
    }
}
