//! Small helpers shared by the Notes, Questions, Words, and Commentary
//! parsers: book-intro lookup and chapter-directory discovery
//! via the two-path glob pattern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::debug;

/// Look for `{lang}_{resource_type}/**/{book_code}/front/intro.*`, trying
/// `.md` (git layout) before `.txt` (zip-layout fallback).
pub fn find_book_intro(root: &Path, book_code: &str) -> Option<String> {
    for ext in ["md", "txt"] {
        let pattern = format!("{}/**/{book_code}/front/intro.{ext}", root.display());
        if let Some(path) = glob(&pattern).ok()?.flatten().next() {
            debug!(path = %path.display(), "found book intro");
            return std::fs::read_to_string(path).ok();
        }
    }
    None
}

/// Discover chapter directories under `{root}/**/{book_code}/`, trying the
/// git layout (`NN/` zero-padded) before the zip-layout alternate
/// (bare numeric directory names), returning `{chapter_num: dir_path}`.
pub fn find_chapter_dirs(root: &Path, book_code: &str) -> BTreeMap<u32, PathBuf> {
    let mut dirs = BTreeMap::new();
    for pattern in [
        format!("{}/**/{book_code}/[0-9][0-9]", root.display()),
        format!("{}/**/{book_code}/[0-9]*", root.display()),
    ] {
        let Ok(matches) = glob(&pattern) else { continue };
        for path in matches.flatten() {
            if !path.is_dir() {
                continue;
            }
            let Some(num) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            dirs.entry(num).or_insert(path);
        }
        if !dirs.is_empty() {
            break;
        }
    }
    dirs
}

/// List verse content files in a chapter directory, trying `.md` then
/// `.txt`, excluding the chapter-intro file.
pub fn find_verse_files(chapter_dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut verses = BTreeMap::new();
    for ext in ["md", "txt"] {
        let Ok(entries) = std::fs::read_dir(chapter_dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if stem == "intro" {
                continue;
            }
            let verse_ref = strip_leading_zeros(stem);
            verses.entry(verse_ref).or_insert_with(|| path.clone());
        }
        if !verses.is_empty() {
            break;
        }
    }
    verses
}

/// Read the chapter-intro file (`intro.md`/`intro.txt`) in a chapter
/// directory, if present.
pub fn find_chapter_intro(chapter_dir: &Path) -> Option<String> {
    for ext in ["md", "txt"] {
        let path = chapter_dir.join(format!("intro.{ext}"));
        if let Ok(text) = std::fs::read_to_string(&path) {
            return Some(text);
        }
    }
    None
}

pub fn strip_leading_zeros(raw: &str) -> String {
    if let Some((lo, hi)) = raw.split_once('-') {
        format!("{}-{}", strip_one(lo), strip_one(hi))
    } else {
        strip_one(raw)
    }
}

fn strip_one(n: &str) -> String {
    let trimmed = n.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<h4>{book_name} {chapter}:{verse_ref}</h4>` prefix used when chunk_size
/// is CHAPTER.
pub fn with_chapter_heading(book_name: &str, chapter_num: u32, verse_ref: &str, html: &str) -> String {
    format!("<h4>{book_name} {chapter_num}:{verse_ref}</h4>{html}")
}

/// The Notes anchor id, the target half of the scripture-ref wikilink
/// contract in `transform::link_rewriter`'s `resolve_link`:
/// `id="tn-{lang}-{book_num:03}-{ch:03}-{vs:03}"`. `verse_component` is
/// `"intro"` for a chapter-intro block, otherwise the verse_ref string,
/// zero-padded to width 3 the same way the scripture verse anchor pads its
/// own components.
pub fn tn_anchor(lang_code: &str, book_num: u32, chapter_num: u32, verse_component: &str) -> String {
    format!(
        r#"<a id="tn-{lang_code}-{book_num:03}-{chapter_num:03}-{verse_component:0>3}"></a>"#
    )
}
