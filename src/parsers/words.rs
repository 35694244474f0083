//! The Words parser (WORD): one markdown file per translation
//! word, sorted by its localized word. `uses` is always
//! left empty here; it's populated by the assembly pass.

use std::collections::HashSet;
use std::path::Path;

use glob::glob;
use tracing::instrument;

use crate::heading::{self, remap_headings};
use crate::model::WordsBook;
use crate::parsers::manifest;
use crate::transform::{transform_to_html, AlwaysAbsent, LinkRewriter};

#[instrument(skip(removed_titles), fields(lang_code))]
pub fn parse_words(resource_root: &Path, lang_code: &str, removed_titles: &HashSet<String>) -> WordsBook {
    let _lang_direction = manifest::read_lang_direction(resource_root);

    let mut entries = Vec::new();
    let known_words = HashSet::new();
    let lookup = AlwaysAbsent;
    let mut rewriter = LinkRewriter::new(lang_code, &known_words, false, &lookup);

    for pattern in [
        format!("{}/**/bible/*/*.md", resource_root.display()),
        format!("{}/**/*.txt", resource_root.display()),
    ] {
        let Ok(matches) = glob(&pattern) else { continue };
        for path in matches.flatten() {
            let Ok(md) = std::fs::read_to_string(&path) else { continue };
            let Some(word) = first_heading_text(&md) else { continue };
            let html = transform_to_html(&md, removed_titles, &mut rewriter);
            let html = remap_headings(&html, heading::WORDS);
            entries.push((word, html));
        }
        if !entries.is_empty() {
            break;
        }
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    WordsBook {
        lang_code: lang_code.to_string(),
        entries,
    }
}

fn first_heading_text(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find(|line| line.trim_start().starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entries_sorted_by_localized_word() {
        let dir = TempDir::new().unwrap();
        let kt = dir.path().join("bible").join("kt");
        std::fs::create_dir_all(&kt).unwrap();
        std::fs::write(kt.join("god.md"), "# God\n\nThe one true God.\n").unwrap();
        std::fs::write(kt.join("apostle.md"), "# Apostle\n\nOne sent with a message.\n").unwrap();

        let removed = HashSet::new();
        let book = parse_words(dir.path(), "en", &removed);
        assert_eq!(book.entries.len(), 2);
        assert_eq!(book.entries[0].0, "Apostle");
        assert_eq!(book.entries[1].0, "God");
    }
}
