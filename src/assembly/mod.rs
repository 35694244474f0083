//! The Assembly Engine: turns the set of successfully parsed book
//! resources into one ordered document body, dispatching each per-(book,
//! language) cell (or two-column pair of cells) through the presence-bit
//! table in [`dispatch`], and flags notes/questions verses that have no
//! matching scripture verse as [`ResourceStatus::OrphanVerses`]
//! rather than silently dropping them.

pub mod cell;
pub mod dispatch;
pub mod ordering;

use crate::model::{
    AssemblyLayoutKind, AssemblyStrategyKind, ChunkSize, ResourceRequest, ResourceStatus,
};

use cell::Cell;
use dispatch::PresenceBits;
use ordering::{CellGroup, Resources};

/// Assemble the full document body (every cell group, in strategy order)
/// as one HTML string. Panics via `expect` only on a dispatch miss, which
/// `dispatch::dispatch_table_is_exhaustive` proves can't happen for any
/// combination `validation::validate` allows through.
pub fn assemble_body(
    resources: &Resources,
    strategy: AssemblyStrategyKind,
    layout: AssemblyLayoutKind,
    chunk_size: ChunkSize,
) -> String {
    let mut out = String::new();
    for group in resources.ordered_cells(strategy, layout) {
        match group {
            CellGroup::Single(cell) => {
                out.push_str(&assemble_one(resources, &cell, strategy, layout, chunk_size));
            }
            CellGroup::Pair(left, right) => {
                out.push_str(r#"<div class="two-column-row">"#);
                out.push_str(r#"<div class="two-column-cell">"#);
                out.push_str(&assemble_one(resources, &left, strategy, layout, chunk_size));
                out.push_str("</div>");
                out.push_str(r#"<div class="two-column-cell">"#);
                out.push_str(&assemble_one(resources, &right, strategy, layout, chunk_size));
                out.push_str("</div>");
                out.push_str("</div>");
            }
        }
    }
    out
}

fn assemble_one(
    resources: &Resources,
    cell: &Cell<'_>,
    strategy: AssemblyStrategyKind,
    layout: AssemblyLayoutKind,
    chunk_size: ChunkSize,
) -> String {
    let has_words = resources.has_words(cell.lang_code);
    let presence = PresenceBits::of(cell, has_words);
    let sub_assembly = dispatch::lookup(presence, strategy, layout, chunk_size)
        .expect("dispatch table is exhaustive over every presence/strategy/layout/chunk combination");
    sub_assembly(cell, chunk_size).join("")
}

/// : a notes or questions verse with no matching scripture verse
/// in the same cell is an orphan (the source of truth — alignment
/// by opaque verse-ref string equality — never invented a verse that
/// wasn't really there). Returns one `OrphanVerses` status per resource
/// that has any, so the caller's status list surfaces it instead of the
/// content being silently skipped.
pub fn detect_orphan_notes(resources: &Resources) -> Vec<ResourceStatus> {
    let mut statuses = Vec::new();

    for ((lang_code, book_code), cell) in resources.cells_for_orphan_scan() {
        let Some(scr) = cell.primary_scripture else {
            continue;
        };

        if let Some(notes) = cell.notes {
            let orphans = orphan_verse_refs(scr, notes.chapters.iter().map(|(n, c)| (*n, &c.verses)));
            if !orphans.is_empty() {
                statuses.push(ResourceStatus::OrphanVerses {
                    request: ResourceRequest::new(lang_code.clone(), "tn", book_code.clone()),
                    verse_refs: orphans,
                });
            }
        }
        if let Some(questions) = cell.questions {
            let orphans =
                orphan_verse_refs(scr, questions.chapters.iter().map(|(n, c)| (*n, &c.verses)));
            if !orphans.is_empty() {
                statuses.push(ResourceStatus::OrphanVerses {
                    request: ResourceRequest::new(lang_code.clone(), "tq", book_code.clone()),
                    verse_refs: orphans,
                });
            }
        }
    }

    statuses
}

fn orphan_verse_refs<'a>(
    scr: &crate::model::ScriptureBook,
    chapters: impl Iterator<Item = (crate::model::ChapterNum, &'a std::collections::BTreeMap<crate::model::VerseRef, crate::model::HtmlContent>)>,
) -> Vec<crate::model::VerseRef> {
    let mut orphans = Vec::new();
    for (chapter_num, verses) in chapters {
        let Some(scr_chapter) = scr.chapters.get(&chapter_num) else {
            orphans.extend(verses.keys().cloned());
            continue;
        };
        for verse_ref in verses.keys() {
            if !scr_chapter.verses.contains_key(verse_ref) {
                orphans.push(verse_ref.clone());
            }
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookContent, LangDirection, NotesBook, NotesChapter, ScriptureBook, ScriptureChapter};
    use std::collections::BTreeMap;

    fn scripture_with_verse_one() -> BookContent {
        let mut verses = BTreeMap::new();
        verses.insert("1".to_string(), "<span>v1</span>".to_string());
        let mut chapters = BTreeMap::new();
        chapters.insert(
            1,
            ScriptureChapter {
                fragments: vec!["<p>chapter 1</p>".to_string()],
                verses,
                footnotes_html: String::new(),
            },
        );
        BookContent::Scripture(ScriptureBook {
            lang_code: "en".to_string(),
            lang_name: "English".to_string(),
            lang_direction: LangDirection::Ltr,
            book_code: "tit".to_string(),
            resource_type_name: "ulb".to_string(),
            chapters,
        })
    }

    fn notes_with_verse_two() -> BookContent {
        let mut verses = BTreeMap::new();
        verses.insert("2".to_string(), "<div>note on v2</div>".to_string());
        let mut chapters = BTreeMap::new();
        chapters.insert(
            1,
            NotesChapter {
                chapter_intro_html: String::new(),
                verses,
            },
        );
        BookContent::Notes(NotesBook {
            lang_code: "en".to_string(),
            lang_name: "English".to_string(),
            lang_direction: LangDirection::Ltr,
            book_code: "tit".to_string(),
            book_intro_html: String::new(),
            chapters,
        })
    }

    #[test]
    fn note_on_missing_verse_is_flagged_orphan() {
        let resources = Resources::from_contents(vec![scripture_with_verse_one(), notes_with_verse_two()]);
        let statuses = detect_orphan_notes(&resources);
        assert_eq!(statuses.len(), 1);
        match &statuses[0] {
            ResourceStatus::OrphanVerses { verse_refs, .. } => {
                assert_eq!(verse_refs, &vec!["2".to_string()]);
            }
            other => panic!("expected OrphanVerses, got {other:?}"),
        }
    }

    #[test]
    fn assembles_single_cell_body() {
        let resources = Resources::from_contents(vec![scripture_with_verse_one()]);
        let body = assemble_body(
            &resources,
            AssemblyStrategyKind::LanguageBookOrder,
            AssemblyLayoutKind::OneColumn,
            ChunkSize::Chapter,
        );
        assert!(body.contains("chapter 1"));
        assert!(body.contains(r#"class="book-title""#));
    }
}
