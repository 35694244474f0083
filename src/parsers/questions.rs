//! The Questions parser (Q): same shape as Notes but without book
//! or chapter intros.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::instrument;

use crate::canon;
use crate::heading::{self, remap_headings};
use crate::model::{ChunkSize, QuestionsBook, QuestionsChapter};
use crate::parsers::manifest;
use crate::parsers::shared::{find_chapter_dirs, find_verse_files, with_chapter_heading};
use crate::transform::{transform_to_html, LinkRewriter, VerseLocation};

#[instrument(skip(rewriter, removed_titles), fields(book_code, lang_code))]
pub fn parse_questions(
    resource_root: &Path,
    lang_code: &str,
    lang_name: &str,
    book_code: &str,
    chunk_size: ChunkSize,
    removed_titles: &HashSet<String>,
    rewriter: &mut LinkRewriter<'_>,
) -> QuestionsBook {
    let lang_direction = manifest::read_lang_direction(resource_root);
    let book_name = canon::book_name(book_code).unwrap_or(book_code);

    let mut chapters = BTreeMap::new();
    for (chapter_num, chapter_dir) in find_chapter_dirs(resource_root, book_code) {
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
            verses.insert(verse_ref, html);
        }
        rewriter.set_location(None);
        chapters.insert(chapter_num, QuestionsChapter { verses });
    }

    QuestionsBook {
        lang_code: lang_code.to_string(),
        lang_name: lang_name.to_string(),
        lang_direction,
        book_code: book_code.to_string(),
        chapters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::AlwaysAbsent;
    use tempfile::TempDir;

    #[test]
    fn parses_per_verse_questions() {
        let dir = TempDir::new().unwrap();
        let ch1 = dir.path().join("tit").join("01");
        std::fs::create_dir_all(&ch1).unwrap();
        std::fs::write(ch1.join("01.md"), "# What did Paul call himself?\n\nA servant.\n").unwrap();

        let known = HashSet::new();
        let lookup = AlwaysAbsent;
        let mut rewriter = LinkRewriter::new("en", &known, false, &lookup);
        let removed = HashSet::new();

        let book = parse_questions(dir.path(), "en", "English", "tit", ChunkSize::Verse, &removed, &mut rewriter);
        assert_eq!(book.chapters.len(), 1);
        assert!(book.chapters[&1].verses["1"].contains("<h5>What did Paul call himself?</h5>"));
    }
}
