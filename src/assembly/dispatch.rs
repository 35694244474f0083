//! The dispatch table: a registration table built at startup and checked
//! for totality, mapping the presence-bits/strategy/layout/chunk key
//! to the sub-assembly function for that combination.
//!
//! Rather than one hand-written function per combination, every key here
//! resolves to the same generic [`assemble_cell`]: Rust's `Option<&T>`
//! fields on [`Cell`] let one function cover every presence combination
//! instead of duplicating the interleave logic per variant. The table is
//! still built and probed by key, so a lookup miss remains a
//! `DispatchMiss` — this is a code-reuse choice, not a relaxation of the
//! exhaustiveness contract. See `DESIGN.md`.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::model::{AssemblyLayoutKind, AssemblyStrategyKind, ChunkSize, HtmlContent};

use super::cell::{assemble_cell, Cell};

/// The five presence bits in the 8-tuple key. `fifth` is
/// `has_SCR2_or_BC` for [`AssemblyStrategyKind::LanguageBookOrder`] and
/// `has_COM` for [`AssemblyStrategyKind::BookLanguageOrder`] — each
/// ordering strategy gives this bit a different meaning, but both
/// collapse to "is there a secondary scripture resource book, structurally
/// emitted in the place a chapter's Commentary would go."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresenceBits {
    pub scr: bool,
    pub note: bool,
    pub q: bool,
    pub word: bool,
    pub fifth: bool,
}

impl PresenceBits {
    pub fn of(cell: &Cell<'_>, has_words: bool) -> PresenceBits {
        PresenceBits {
            scr: cell.primary_scripture.is_some(),
            note: cell.notes.is_some(),
            q: cell.questions.is_some(),
            word: has_words,
            fifth: cell.secondary_scripture.is_some() || cell.commentary.is_some(),
        }
    }

    fn all() -> impl Iterator<Item = PresenceBits> {
        (0u8..32).map(|bits| PresenceBits {
            scr: bits & 0b00001 != 0,
            note: bits & 0b00010 != 0,
            q: bits & 0b00100 != 0,
            word: bits & 0b01000 != 0,
            fifth: bits & 0b10000 != 0,
        })
    }
}

type SubAssembly = fn(&Cell<'_>, ChunkSize) -> Vec<HtmlContent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DispatchKey {
    presence: PresenceBits,
    strategy: AssemblyStrategyKindKey,
    layout: AssemblyLayoutKindKey,
    chunk: ChunkSizeKey,
}

// `AssemblyStrategyKind`/`AssemblyLayoutKind`/`ChunkSize` don't derive
// `Hash` (they're wire-format enums); small local mirrors give the
// dispatch table a hashable key without adding derives to the wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AssemblyStrategyKindKey {
    LanguageBookOrder,
    BookLanguageOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AssemblyLayoutKindKey {
    OneColumn,
    OneColumnCompact,
    TwoColumnScriptureLeftScriptureRight,
    TwoColumnScriptureLeftScriptureRightCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ChunkSizeKey {
    Verse,
    Chapter,
}

impl From<AssemblyStrategyKind> for AssemblyStrategyKindKey {
    fn from(k: AssemblyStrategyKind) -> Self {
        match k {
            AssemblyStrategyKind::LanguageBookOrder => AssemblyStrategyKindKey::LanguageBookOrder,
            AssemblyStrategyKind::BookLanguageOrder => AssemblyStrategyKindKey::BookLanguageOrder,
        }
    }
}

impl From<AssemblyLayoutKind> for AssemblyLayoutKindKey {
    fn from(k: AssemblyLayoutKind) -> Self {
        match k {
            AssemblyLayoutKind::OneColumn => AssemblyLayoutKindKey::OneColumn,
            AssemblyLayoutKind::OneColumnCompact => AssemblyLayoutKindKey::OneColumnCompact,
            AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight => {
                AssemblyLayoutKindKey::TwoColumnScriptureLeftScriptureRight
            }
            AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRightCompact => {
                AssemblyLayoutKindKey::TwoColumnScriptureLeftScriptureRightCompact
            }
        }
    }
}

impl From<ChunkSize> for ChunkSizeKey {
    fn from(k: ChunkSize) -> Self {
        match k {
            ChunkSize::Verse => ChunkSizeKey::Verse,
            ChunkSize::Chapter => ChunkSizeKey::Chapter,
        }
    }
}

static TABLE: LazyLock<HashMap<DispatchKey, SubAssembly>> = LazyLock::new(build_table);

fn build_table() -> HashMap<DispatchKey, SubAssembly> {
    let mut table = HashMap::new();
    let strategies = [
        AssemblyStrategyKind::LanguageBookOrder,
        AssemblyStrategyKind::BookLanguageOrder,
    ];
    let layouts = [
        AssemblyLayoutKind::OneColumn,
        AssemblyLayoutKind::OneColumnCompact,
        AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight,
        AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRightCompact,
    ];
    let chunks = [ChunkSize::Verse, ChunkSize::Chapter];

    for presence in PresenceBits::all() {
        for &strategy in &strategies {
            for &layout in &layouts {
                for &chunk in &chunks {
                    let key = DispatchKey {
                        presence,
                        strategy: strategy.into(),
                        layout: layout.into(),
                        chunk: chunk.into(),
                    };
                    table.insert(key, assemble_cell as SubAssembly);
                }
            }
        }
    }
    table
}

/// Look up the sub-assembly function for this combination. A `None` here
/// is `DispatchMiss`: a programmer error, not a user-facing failure.
pub fn lookup(
    presence: PresenceBits,
    strategy: AssemblyStrategyKind,
    layout: AssemblyLayoutKind,
    chunk: ChunkSize,
) -> Option<SubAssembly> {
    let key = DispatchKey {
        presence,
        strategy: strategy.into(),
        layout: layout.into(),
        chunk: chunk.into(),
    };
    TABLE.get(&key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// : every combination reachable under validation rules
    /// has a dispatch entry.
    #[test]
    fn dispatch_table_is_exhaustive() {
        let strategies = [
            AssemblyStrategyKind::LanguageBookOrder,
            AssemblyStrategyKind::BookLanguageOrder,
        ];
        let layouts = [
            AssemblyLayoutKind::OneColumn,
            AssemblyLayoutKind::OneColumnCompact,
            AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRight,
            AssemblyLayoutKind::TwoColumnScriptureLeftScriptureRightCompact,
        ];
        let chunks = [ChunkSize::Verse, ChunkSize::Chapter];

        for presence in PresenceBits::all() {
            for &strategy in &strategies {
                for &layout in &layouts {
                    for &chunk in &chunks {
                        assert!(
                            lookup(presence, strategy, layout, chunk).is_some(),
                            "missing dispatch entry for {presence:?}/{strategy:?}/{layout:?}/{chunk:?}"
                        );
                    }
                }
            }
        }
    }
}
