//! The Commentary parser (COM): one whole-chapter HTML blob per chapter
//! (no per-verse granularity), plus an optional book intro.
//!
//! Two things are peculiar to this resource kind and handled only here:
//! chapter 1's heading gets an " Commentary" suffix, and intra-document
//! links to other commentary articles are rewritten to absolute external
//! URLs rather than in-document anchors.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::instrument;

use crate::heading::{self, remap_headings};
use crate::model::{CommentaryBook, CommentaryChapter};
use crate::parsers::manifest;
use crate::parsers::shared::find_book_intro;
use crate::transform::{transform_to_html, AlwaysAbsent, LinkRewriter};

#[instrument(skip(removed_titles), fields(book_code, lang_code))]
pub fn parse_commentary(
    resource_root: &Path,
    lang_code: &str,
    lang_name: &str,
    book_code: &str,
    include_book_intros: bool,
    removed_titles: &HashSet<String>,
    commentary_external_url_fmt: &str,
) -> CommentaryBook {
    let lang_direction = manifest::read_lang_direction(resource_root);

    let known_words = HashSet::new();
    let lookup = AlwaysAbsent;
    let mut rewriter = LinkRewriter::new(lang_code, &known_words, false, &lookup);

    let book_intro_html = if include_book_intros {
        find_book_intro(resource_root, book_code)
            .map(|md| {
                let html = transform_to_html(&md, removed_titles, &mut rewriter);
                remap_headings(&html, heading::NOTES_BOOK_INTRO)
            })
            .unwrap_or_default()
    } else {
        String::new()
    };

    let mut chapters = BTreeMap::new();
    for (chapter_num, path) in find_chapter_files(resource_root, book_code) {
        let Ok(mut markdown) = std::fs::read_to_string(&path) else {
            continue;
        };
        if chapter_num == 1 {
            markdown = append_commentary_suffix_to_first_heading(&markdown);
        }
        let html = transform_to_html(&markdown, removed_titles, &mut rewriter);
        let html = remap_headings(&html, heading::COMMENTARY);
        let html = rewrite_article_links(&html, commentary_external_url_fmt);
        chapters.insert(chapter_num, CommentaryChapter { html });
    }

    CommentaryBook {
        lang_code: lang_code.to_string(),
        lang_name: lang_name.to_string(),
        lang_direction,
        book_code: book_code.to_string(),
        book_intro_html,
        chapters,
    }
}

/// One commentary article file per chapter, tried git-layout (`NN.md`)
/// then zip-layout (`N.txt`), matching the two-path lookup pattern the
/// other lightweight-markup parsers share.
fn find_chapter_files(root: &Path, book_code: &str) -> BTreeMap<u32, PathBuf> {
    let mut chapters = BTreeMap::new();
    for ext in ["md", "txt"] {
        let pattern = format!("{}/**/{book_code}/[0-9]*.{ext}", root.display());
        let Ok(matches) = glob(&pattern) else { continue };
        for path in matches.flatten() {
            let Some(num) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            chapters.entry(num).or_insert(path);
        }
        if !chapters.is_empty() {
            break;
        }
    }
    chapters
}

fn append_commentary_suffix_to_first_heading(markdown: &str) -> String {
    let mut appended = false;
    markdown
        .lines()
        .map(|line| {
            if !appended && line.trim_start().starts_with('#') {
                appended = true;
                format!("{line} Commentary")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite every `href` pointing at another commentary article (a relative
/// `.md`/`.html` path within the resource tree) to an absolute external URL
/// built from `url_fmt`, which must contain one `{}` placeholder.
fn rewrite_article_links(html: &str, url_fmt: &str) -> String {
    static ARTICLE_HREF: std::sync::LazyLock<regex::Regex> =
        std::sync::LazyLock::new(|| regex::Regex::new(r#"href="([^"]+\.(?:md|html))""#).unwrap());

    ARTICLE_HREF
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let relative = &caps[1];
            let absolute = url_fmt.replacen("{}", relative, 1);
            format!(r#"href="{absolute}""#)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn chapter_one_gets_commentary_suffix() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("tit");
        std::fs::create_dir_all(&book).unwrap();
        std::fs::write(book.join("1.md"), "# Titus 1\n\nPaul's greeting.\n").unwrap();
        std::fs::write(book.join("2.md"), "# Titus 2\n\nSound doctrine.\n").unwrap();

        let removed = HashSet::new();
        let bc = parse_commentary(
            dir.path(),
            "en",
            "English",
            "tit",
            false,
            &removed,
            "https://git.door43.org/{}",
        );

        assert_eq!(bc.chapters.len(), 2);
        assert!(bc.chapters[&1].html.contains("Titus 1 Commentary"));
        assert!(!bc.chapters[&2].html.contains("Commentary"));
    }

    #[test]
    fn article_links_rewritten_to_external_url() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("tit");
        std::fs::create_dir_all(&book).unwrap();
        std::fs::write(
            book.join("1.md"),
            "# Titus 1\n\nSee [chapter two](../tit/2.md) for more.\n",
        )
        .unwrap();

        let removed = HashSet::new();
        let bc = parse_commentary(
            dir.path(),
            "en",
            "English",
            "tit",
            false,
            &removed,
            "https://git.door43.org/{}",
        );
        assert!(bc.chapters[&1]
            .html
            .contains(r#"href="https://git.door43.org/../tit/2.md""#));
    }
}
