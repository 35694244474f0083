//! Per-(book, language) cell interleaving,
//! shared by both ordering strategies and both chunk sizes. Grounded
//! module-for-module on the per-cell interleave order documented in
//! `original_source/backend/document/domain/assembly_strategies/
//! assembly_strategies_book_then_lang.py` and its lang-then-book sibling:
//! book intro(s) -> title -> per chapter: content/footnotes, chapter intro,
//! commentary, per-verse notes, per-verse questions, secondary scripture,
//! end marker.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::canon;
use crate::model::{
    ChapterNum, ChunkSize, CommentaryBook, HtmlContent, LangDirection, NotesBook, QuestionsBook,
    ScriptureBook, VerseRef,
};

/// Everything assembled for one (book_code, lang_code) grouping. Built by
/// the ordering pass from the collection of successfully parsed `*Book`
/// values; never owns its data.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub lang_code: &'a str,
    pub lang_name: &'a str,
    pub lang_direction: LangDirection,
    pub book_code: &'a str,
    pub primary_scripture: Option<&'a ScriptureBook>,
    pub secondary_scripture: Option<&'a ScriptureBook>,
    pub notes: Option<&'a NotesBook>,
    pub questions: Option<&'a QuestionsBook>,
    pub commentary: Option<&'a CommentaryBook>,
}

/// Assemble one cell's HTML fragments in document order.
pub fn assemble_cell(cell: &Cell<'_>, chunk_size: ChunkSize) -> Vec<HtmlContent> {
    let book_name = canon::book_name(cell.book_code).unwrap_or(cell.book_code);
    let mut out = Vec::new();

    out.push(format!(
        r#"<div class="lang-block" dir="{}" lang="{}">"#,
        cell.lang_direction.as_attr(),
        cell.lang_code
    ));

    if let Some(notes) = cell.notes {
        if !notes.book_intro_html.is_empty() {
            out.push(notes.book_intro_html.clone());
        }
    }
    if let Some(com) = cell.commentary {
        if !com.book_intro_html.is_empty() {
            out.push(com.book_intro_html.clone());
        }
    }

    out.push(format!(r#"<h2 class="book-title">{book_name}</h2>"#));

    for chapter_num in chapter_numbers(cell) {
        match chunk_size {
            ChunkSize::Chapter => emit_chapter_chunked(cell, chapter_num, &mut out),
            ChunkSize::Verse => emit_verse_chunked(cell, chapter_num, &mut out),
        }
    }

    out.push("</div>".to_string());
    out
}

/// The union of chapter numbers any present resource has content for, in
/// numeric order, driving the outer per-chapter loop.
fn chapter_numbers(cell: &Cell<'_>) -> BTreeSet<ChapterNum> {
    let mut nums = BTreeSet::new();
    if let Some(scr) = cell.primary_scripture {
        nums.extend(scr.chapters.keys().copied());
    }
    if let Some(notes) = cell.notes {
        nums.extend(notes.chapters.keys().copied());
    }
    if let Some(q) = cell.questions {
        nums.extend(q.chapters.keys().copied());
    }
    if let Some(com) = cell.commentary {
        nums.extend(com.chapters.keys().copied());
    }
    if let Some(scr2) = cell.secondary_scripture {
        nums.extend(scr2.chapters.keys().copied());
    }
    nums
}

fn emit_chapter_chunked(cell: &Cell<'_>, chapter_num: ChapterNum, out: &mut Vec<HtmlContent>) {
    if let Some(scr) = cell.primary_scripture {
        if let Some(chapter) = scr.chapters.get(&chapter_num) {
            out.extend(chapter.fragments.iter().cloned());
            out.push("<hr/>".to_string());
            if !chapter.footnotes_html.is_empty() {
                out.push(chapter.footnotes_html.clone());
            }
        }
    }

    emit_chapter_intro_and_commentary(cell, chapter_num, out);

    if let Some(notes) = cell.notes {
        if let Some(chapter) = notes.chapters.get(&chapter_num) {
            for verse_ref in sorted_verse_refs(chapter.verses.keys()) {
                out.push(chapter.verses[&verse_ref].clone());
            }
        }
    }
    if let Some(q) = cell.questions {
        if let Some(chapter) = q.chapters.get(&chapter_num) {
            for verse_ref in sorted_verse_refs(chapter.verses.keys()) {
                out.push(chapter.verses[&verse_ref].clone());
            }
        }
    }

    emit_secondary_scripture(cell, chapter_num, out);
    emit_end_marker(chapter_num, out);
}

fn emit_verse_chunked(cell: &Cell<'_>, chapter_num: ChapterNum, out: &mut Vec<HtmlContent>) {
    emit_chapter_intro_and_commentary(cell, chapter_num, out);

    let scr_chapter = cell
        .primary_scripture
        .and_then(|scr| scr.chapters.get(&chapter_num));
    let notes_chapter = cell.notes.and_then(|n| n.chapters.get(&chapter_num));
    let q_chapter = cell.questions.and_then(|q| q.chapters.get(&chapter_num));

    if let Some(chapter) = scr_chapter {
        for verse_ref in sorted_verse_refs(chapter.verses.keys()) {
            out.push(chapter.verses[&verse_ref].clone());
            if let Some(notes) = notes_chapter {
                if let Some(html) = notes.verses.get(&verse_ref) {
                    out.push(html.clone());
                }
            }
            if let Some(q) = q_chapter {
                if let Some(html) = q.verses.get(&verse_ref) {
                    out.push(html.clone());
                }
            }
        }
        out.push("<hr/>".to_string());
        if !chapter.footnotes_html.is_empty() {
            out.push(chapter.footnotes_html.clone());
        }
    }

    emit_secondary_scripture(cell, chapter_num, out);
    emit_end_marker(chapter_num, out);
}

fn emit_chapter_intro_and_commentary(cell: &Cell<'_>, chapter_num: ChapterNum, out: &mut Vec<HtmlContent>) {
    if let Some(notes) = cell.notes {
        if let Some(chapter) = notes.chapters.get(&chapter_num) {
            if !chapter.chapter_intro_html.is_empty() {
                out.push(chapter.chapter_intro_html.clone());
            }
        }
    }
    if let Some(com) = cell.commentary {
        if let Some(chapter) = com.chapters.get(&chapter_num) {
            if !chapter.html.is_empty() {
                out.push(chapter.html.clone());
            }
        }
    }
}

fn emit_secondary_scripture(cell: &Cell<'_>, chapter_num: ChapterNum, out: &mut Vec<HtmlContent>) {
    if let Some(scr2) = cell.secondary_scripture {
        if let Some(chapter) = scr2.chapters.get(&chapter_num) {
            out.extend(chapter.fragments.iter().cloned());
        }
    }
}

fn emit_end_marker(chapter_num: ChapterNum, out: &mut Vec<HtmlContent>) {
    out.push(format!(r#"<div class="chapter-end" data-chapter="{chapter_num}"></div>"#));
}

/// Verse refs in ascending numeric order (by leading integer; a range
/// orders by its lower bound), not the lexical order a `BTreeMap<String,_>`
/// would give ("10" before "2"). Purely a display concern — alignment
/// between resources still matches on the raw string.
fn sorted_verse_refs<'a>(refs: impl Iterator<Item = &'a VerseRef>) -> Vec<VerseRef> {
    let mut refs: Vec<VerseRef> = refs.cloned().collect();
    refs.sort_by(|a, b| compare_verse_refs(a, b));
    refs
}

fn compare_verse_refs(a: &str, b: &str) -> Ordering {
    leading_number(a).cmp(&leading_number(b))
}

fn leading_number(verse_ref: &str) -> u32 {
    verse_ref
        .split('-')
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scripture_book(chapters: Vec<(u32, Vec<(&str, &str)>)>) -> ScriptureBook {
        let mut map = BTreeMap::new();
        for (num, verses) in chapters {
            let mut vmap = BTreeMap::new();
            for (vref, html) in verses {
                vmap.insert(vref.to_string(), html.to_string());
            }
            map.insert(
                num,
                crate::model::ScriptureChapter {
                    fragments: vec![format!("<p>chapter {num} body</p>")],
                    verses: vmap,
                    footnotes_html: String::new(),
                },
            );
        }
        ScriptureBook {
            lang_code: "en".to_string(),
            lang_name: "English".to_string(),
            lang_direction: LangDirection::Ltr,
            book_code: "tit".to_string(),
            resource_type_name: "ulb".to_string(),
            chapters: map,
        }
    }

    #[test]
    fn chapter_chunk_orders_content_then_notes_then_questions() {
        let scr = scripture_book(vec![(1, vec![("1", "<span>v1</span>")])]);
        let cell = Cell {
            lang_code: "en",
            lang_name: "English",
            lang_direction: LangDirection::Ltr,
            book_code: "tit",
            primary_scripture: Some(&scr),
            secondary_scripture: None,
            notes: None,
            questions: None,
            commentary: None,
        };
        let fragments = assemble_cell(&cell, ChunkSize::Chapter);
        let joined = fragments.join("");
        let content_pos = joined.find("chapter 1 body").unwrap();
        let hr_pos = joined.find("<hr/>").unwrap();
        assert!(content_pos < hr_pos);
    }

    #[test]
    fn verse_refs_sort_numerically_not_lexically() {
        let refs = vec!["10".to_string(), "2".to_string(), "1".to_string()];
        let sorted = sorted_verse_refs(refs.iter());
        assert_eq!(sorted, vec!["1", "2", "10"]);
    }
}
