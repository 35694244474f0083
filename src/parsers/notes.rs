//! The Notes parser (NOTE).

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::instrument;

use crate::canon;
use crate::heading::{self, remap_headings};
use crate::model::{ChunkSize, NotesBook, NotesChapter};
use crate::parsers::manifest;
use crate::parsers::shared::{
    find_book_intro, find_chapter_dirs, find_chapter_intro, find_verse_files, tn_anchor,
    with_chapter_heading,
};
use crate::transform::{transform_to_html, LinkRewriter, VerseLocation};

#[instrument(skip(rewriter, removed_titles), fields(book_code, lang_code))]
pub fn parse_notes(
    resource_root: &Path,
    lang_code: &str,
    lang_name: &str,
    book_code: &str,
    chunk_size: ChunkSize,
    include_book_intros: bool,
    removed_titles: &HashSet<String>,
    rewriter: &mut LinkRewriter<'_>,
) -> NotesBook {
    let lang_direction = manifest::read_lang_direction(resource_root);
    let book_name = canon::book_name(book_code).unwrap_or(book_code);
    let book_num = canon::book_number(book_code).unwrap_or(0);

    let book_intro_html = if include_book_intros {
        find_book_intro(resource_root, book_code)
            .map(|md| {
                let html = transform_to_html(&md, removed_titles, rewriter);
                remap_headings(&html, heading::NOTES_BOOK_INTRO)
            })
            .unwrap_or_default()
    } else {
        String::new()
    };

    let mut chapters = BTreeMap::new();
    for (chapter_num, chapter_dir) in find_chapter_dirs(resource_root, book_code) {
        let chapter_intro_html = find_chapter_intro(&chapter_dir)
            .map(|md| {
                let html = transform_to_html(&md, removed_titles, rewriter);
                let html = remap_headings(&html, heading::NOTES_CHAPTER_INTRO);
                format!("{}{html}", tn_anchor(lang_code, book_num, chapter_num, "intro"))
            })
            .unwrap_or_default();

        let mut verses = BTreeMap::new();
        for (verse_ref, path) in find_verse_files(&chapter_dir) {
            let Ok(md) = std::fs::read_to_string(&path) else { continue };
            rewriter.set_location(Some(VerseLocation {
                book_code: book_code.to_string(),
                book_name: book_name.to_string(),
                chapter_num,
                verse_ref: verse_ref.clone(),
            }));
            let html = transform_to_html(&md, removed_titles, rewriter);
            let mut html = remap_headings(&html, heading::PER_VERSE);
            if chunk_size == ChunkSize::Chapter {
                html = with_chapter_heading(book_name, chapter_num, &verse_ref, &html);
            }
            html = format!("{}{html}", tn_anchor(lang_code, book_num, chapter_num, &verse_ref));
            verses.insert(verse_ref, html);
        }
        rewriter.set_location(None);

        chapters.insert(
            chapter_num,
            NotesChapter {
                chapter_intro_html,
                verses,
            },
        );
    }

    NotesBook {
        lang_code: lang_code.to_string(),
        lang_name: lang_name.to_string(),
        lang_direction,
        book_code: book_code.to_string(),
        book_intro_html,
        chapters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::AlwaysAbsent;
    use tempfile::TempDir;

    #[test]
    fn parses_chapter_intro_and_verse_notes() {
        let dir = TempDir::new().unwrap();
        let ch1 = dir.path().join("tit").join("01");
        std::fs::create_dir_all(&ch1).unwrap();
        std::fs::write(ch1.join("intro.md"), "# Chapter Intro\n\nSome context.\n").unwrap();
        std::fs::write(ch1.join("01.md"), "# Note on verse 1\n\nPaul greets Titus.\n").unwrap();

        let known = HashSet::new();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, false, &lookup);
        let removed = HashSet::new();

        let book = parse_notes(
            dir.path(),
            "en",
            "English",
            "tit",
            ChunkSize::Chapter,
            true,
            &removed,
            &mut rewriter,
        );

        assert_eq!(book.chapters.len(), 1);
        let chapter = &book.chapters[&1];
        assert!(chapter.chapter_intro_html.contains("<h3>Chapter Intro</h3>"));
        assert!(chapter.verses["1"].contains("Titus 1:1"));
        assert!(chapter.verses["1"].contains("<h5>Note on verse 1</h5>"));
    }
}
