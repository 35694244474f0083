//! Groups parsed resources into per-(book, language) cells and orders those
//! cells into the final document sequence for each of two assembly
//! strategies: language-then-book ("mix" — `en/tit`, `en/col`, `es-419/tit`,
//! ...) and book-then-language ("separate" — `tit/en`, `tit/es-419`,
//! `col/en`, ...). Book-then-language additionally supports pairing
//! adjacent scripture languages side by side for the two-column layout.

use std::collections::BTreeMap;

use crate::canon;
use crate::model::{
    AssemblyLayoutKind, AssemblyStrategyKind, BookCode, BookContent, CommentaryBook,
    LangDirection, NotesBook, QuestionsBook, ScriptureBook, WordsBook,
};

use super::cell::Cell;

#[derive(Default)]
struct Slot {
    primary_scripture: Option<ScriptureBook>,
    secondary_scripture: Option<ScriptureBook>,
    notes: Option<NotesBook>,
    questions: Option<QuestionsBook>,
    commentary: Option<CommentaryBook>,
}

/// One position in the ordered output: a single cell, or (for the
/// two-column layout) a side-by-side pair of scripture-only cells.
pub enum CellGroup<'a> {
    Single(Cell<'a>),
    Pair(Cell<'a>, Cell<'a>),
}

/// Owns every successfully parsed book resource, grouped by `(lang, book)`,
/// and knows how to replay them in either ordering strategy's sequence.
pub struct Resources {
    slots: BTreeMap<(String, BookCode), Slot>,
    pub words: BTreeMap<String, WordsBook>,
}

impl Resources {
    pub fn from_contents(contents: Vec<BookContent>) -> Resources {
        let mut slots: BTreeMap<(String, BookCode), Slot> = BTreeMap::new();
        let mut words = BTreeMap::new();

        for content in contents {
            match content {
                BookContent::Words(w) => {
                    words.insert(w.lang_code.clone(), w);
                }
                BookContent::Scripture(scr) => {
                    let key = (scr.lang_code.clone(), scr.book_code.clone());
                    let slot = slots.entry(key).or_default();
                    if slot.primary_scripture.is_none() {
                        slot.primary_scripture = Some(scr);
                    } else {
                        slot.secondary_scripture = Some(scr);
                    }
                }
                BookContent::Notes(n) => {
                    let key = (n.lang_code.clone(), n.book_code.clone());
                    slots.entry(key).or_default().notes = Some(n);
                }
                BookContent::Questions(q) => {
                    let key = (q.lang_code.clone(), q.book_code.clone());
                    slots.entry(key).or_default().questions = Some(q);
                }
                BookContent::Commentary(c) => {
                    let key = (c.lang_code.clone(), c.book_code.clone());
                    slots.entry(key).or_default().commentary = Some(c);
                }
            }
        }

        Resources { slots, words }
    }

    pub fn has_words(&self, lang_code: &str) -> bool {
        self.words.contains_key(lang_code)
    }

    /// Every populated `(lang, book)` cell, unordered — used by
    /// `detect_orphan_notes`, which only cares about presence, not
    /// document order.
    pub fn cells_for_orphan_scan(&self) -> Vec<((String, BookCode), Cell<'_>)> {
        self.slots
            .keys()
            .filter_map(|(lang, book)| {
                self.cell_at(lang, book)
                    .map(|cell| ((lang.clone(), book.clone()), cell))
            })
            .collect()
    }

    fn cell_at(&self, lang_code: &str, book_code: &str) -> Option<Cell<'_>> {
        let slot = self
            .slots
            .get(&(lang_code.to_string(), book_code.to_string()))?;
        let lang_name = slot
            .primary_scripture
            .as_ref()
            .map(|b| b.lang_name.as_str())
            .or_else(|| slot.notes.as_ref().map(|b| b.lang_name.as_str()))
            .or_else(|| slot.questions.as_ref().map(|b| b.lang_name.as_str()))
            .or_else(|| slot.commentary.as_ref().map(|b| b.lang_name.as_str()))
            .unwrap_or(lang_code);
        let lang_direction = slot
            .primary_scripture
            .as_ref()
            .map(|b| b.lang_direction)
            .or_else(|| slot.notes.as_ref().map(|b| b.lang_direction))
            .or_else(|| slot.questions.as_ref().map(|b| b.lang_direction))
            .or_else(|| slot.commentary.as_ref().map(|b| b.lang_direction))
            .unwrap_or(LangDirection::Ltr);

        Some(Cell {
            lang_code,
            lang_name,
            lang_direction,
            book_code,
            primary_scripture: slot.primary_scripture.as_ref(),
            secondary_scripture: slot.secondary_scripture.as_ref(),
            notes: slot.notes.as_ref(),
            questions: slot.questions.as_ref(),
            commentary: slot.commentary.as_ref(),
        })
    }

    /// The display name recorded against any resource in `(lang_code, *)`,
    /// falling back to the bare code if somehow none is present.
    fn lang_name_for(&self, lang_code: &str) -> String {
        self.slots
            .iter()
            .find(|((l, _), _)| l == lang_code)
            .and_then(|(_, slot)| {
                slot.primary_scripture
                    .as_ref()
                    .map(|b| b.lang_name.clone())
                    .or_else(|| slot.notes.as_ref().map(|b| b.lang_name.clone()))
                    .or_else(|| slot.questions.as_ref().map(|b| b.lang_name.clone()))
                    .or_else(|| slot.commentary.as_ref().map(|b| b.lang_name.clone()))
            })
            .unwrap_or_else(|| lang_code.to_string())
    }

    /// Distinct languages present, in alphabetic order of `lang_name`
    /// (ordering rule for both strategies' outer/inner language
    /// grouping — the catalog's `lang_code` is not itself the sort key).
    fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.slots.keys().map(|(l, _)| l.clone()).collect();
        langs.sort();
        langs.dedup();
        langs.sort_by(|a, b| self.lang_name_for(a).cmp(&self.lang_name_for(b)));
        langs
    }

    fn books_for_language(&self, lang_code: &str) -> Vec<BookCode> {
        let mut books: Vec<BookCode> = self
            .slots
            .keys()
            .filter(|(l, _)| l == lang_code)
            .map(|(_, b)| b.clone())
            .collect();
        books.sort_by_key(|b| canon::book_number(b).unwrap_or(u32::MAX));
        books
    }

    fn all_books(&self) -> Vec<BookCode> {
        let mut books: Vec<BookCode> = self.slots.keys().map(|(_, b)| b.clone()).collect();
        books.sort_by_key(|b| canon::book_number(b).unwrap_or(u32::MAX));
        books.dedup();
        books
    }

    fn languages_for_book(&self, book_code: &str) -> Vec<String> {
        let mut langs: Vec<String> = self
            .slots
            .keys()
            .filter(|(_, b)| b == book_code)
            .map(|(l, _)| l.clone())
            .collect();
        langs.sort();
        langs.sort_by(|a, b| self.lang_name_for(a).cmp(&self.lang_name_for(b)));
        langs
    }

    /// Whether `(lang, book)` has a scripture resource and nothing else
    /// that would make it unsuitable for two-column pairing (notes,
    /// questions, or commentary force a full-width single cell instead).
    fn is_scripture_only(&self, lang_code: &str, book_code: &str) -> bool {
        match self.slots.get(&(lang_code.to_string(), book_code.to_string())) {
            Some(slot) => {
                slot.primary_scripture.is_some()
                    && slot.notes.is_none()
                    && slot.questions.is_none()
                    && slot.commentary.is_none()
            }
            None => false,
        }
    }

    /// The ordered sequence of cell groups to assemble. Book-then-
    /// language ordering pairs adjacent scripture-only languages into a
    /// two-column [`CellGroup::Pair`] when `layout.is_two_column()`;
    /// `validation::validate` already guarantees an even, non-zero count
    /// of scripture languages with identical book sets whenever a
    /// two-column layout was accepted, so pairing here never leaves an
    /// odd cell out.
    pub fn ordered_cells(
        &self,
        strategy: AssemblyStrategyKind,
        layout: AssemblyLayoutKind,
    ) -> Vec<CellGroup<'_>> {
        match strategy {
            AssemblyStrategyKind::LanguageBookOrder => self
                .languages()
                .into_iter()
                .flat_map(|lang| {
                    self.books_for_language(&lang)
                        .into_iter()
                        .filter_map(move |book| self.cell_at(&lang, &book))
                        .collect::<Vec<_>>()
                })
                .map(CellGroup::Single)
                .collect(),
            AssemblyStrategyKind::BookLanguageOrder => {
                let mut groups = Vec::new();
                for book in self.all_books() {
                    let langs = self.languages_for_book(&book);
                    if layout.is_two_column() {
                        let mut iter = langs.into_iter();
                        while let Some(first) = iter.next() {
                            match iter.next() {
                                Some(second)
                                    if self.is_scripture_only(&first, &book)
                                        && self.is_scripture_only(&second, &book) =>
                                {
                                    if let (Some(left), Some(right)) =
                                        (self.cell_at(&first, &book), self.cell_at(&second, &book))
                                    {
                                        groups.push(CellGroup::Pair(left, right));
                                    }
                                }
                                Some(second) => {
                                    if let Some(cell) = self.cell_at(&first, &book) {
                                        groups.push(CellGroup::Single(cell));
                                    }
                                    if let Some(cell) = self.cell_at(&second, &book) {
                                        groups.push(CellGroup::Single(cell));
                                    }
                                }
                                None => {
                                    if let Some(cell) = self.cell_at(&first, &book) {
                                        groups.push(CellGroup::Single(cell));
                                    }
                                }
                            }
                        }
                    } else {
                        for lang in langs {
                            if let Some(cell) = self.cell_at(&lang, &book) {
                                groups.push(CellGroup::Single(cell));
                            }
                        }
                    }
                }
                groups
            }
        }
    }
}
