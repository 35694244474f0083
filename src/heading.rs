//! Heading-level remapping shared by every lightweight-markup parser.
//! Implemented as a provably-injective two-pass sentinel substitution
//! rather than a single-pass rewrite: a one-step remap can never observe
//! its own output, so a later rule can't re-fire on a level a previous
//! rule just produced.

use std::collections::HashMap;

/// One `hN` → `hM` rule. `from` and `to` are levels 1-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRemap {
    pub from: u8,
    pub to: u8,
}

impl HeadingRemap {
    pub const fn new(from: u8, to: u8) -> Self {
        HeadingRemap { from, to }
    }
}

/// Apply `rules` to every `<h{n}` / `</h{n}>` tag in `html`, two passes:
/// first every matched origin level is rewritten to a private sentinel
/// (`data-h-sentinel="{n}"` wrapped around a neutral tag name), then every
/// sentinel is rewritten to its final level. A level with no matching rule
/// passes through untouched.
pub fn remap_headings(html: &str, rules: &[HeadingRemap]) -> String {
    let by_from: HashMap<u8, u8> = rules.iter().map(|r| (r.from, r.to)).collect();

    let mut sentineled = html.to_string();
    for level in 1..=6u8 {
        let Some(_) = by_from.get(&level) else {
            continue;
        };
        sentineled = replace_tag(&sentineled, level, &sentinel_name(level));
    }

    let mut result = sentineled;
    for (from, to) in &by_from {
        result = replace_tag(&result, *from, &to.to_string());
    }
    // second pass's "level" argument for sentinel tags is the sentinel
    // name, not a bare digit; rewrite those explicitly.
    for (from, to) in &by_from {
        let sentinel = sentinel_name(*from);
        result = result
            .replace(&format!("<h{sentinel}"), &format!("<h{to}"))
            .replace(&format!("</h{sentinel}>"), &format!("</h{to}>"));
    }
    result
}

fn sentinel_name(level: u8) -> String {
    format!("tmp{level}")
}

fn replace_tag(html: &str, level: u8, new_name: &str) -> String {
    html.replace(&format!("<h{level}"), &format!("<h{new_name}"))
        .replace(&format!("</h{level}>"), &format!("</h{new_name}>"))
}

/// Four remap tables, one per resource/position.
pub const NOTES_BOOK_INTRO: &[HeadingRemap] = &[
    HeadingRemap::new(1, 2),
    HeadingRemap::new(2, 3),
    HeadingRemap::new(3, 4),
];

pub const NOTES_CHAPTER_INTRO: &[HeadingRemap] = &[
    HeadingRemap::new(1, 3),
    HeadingRemap::new(2, 4),
    HeadingRemap::new(3, 4),
    HeadingRemap::new(4, 5),
];

pub const COMMENTARY: &[HeadingRemap] = NOTES_CHAPTER_INTRO;

pub const PER_VERSE: &[HeadingRemap] = &[HeadingRemap::new(1, 5)];

pub const WORDS: &[HeadingRemap] = &[HeadingRemap::new(1, 3), HeadingRemap::new(2, 4)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_intro_remap_does_not_chain() {
        let input = "<h1>Intro</h1><h2>Sub</h2><h3>SubSub</h3><h4>Deep</h4>";
        let output = remap_headings(input, NOTES_CHAPTER_INTRO);
        assert_eq!(
            output,
            "<h3>Intro</h3><h4>Sub</h4><h4>SubSub</h4><h5>Deep</h5>"
        );
    }

    #[test]
    fn book_intro_remap_is_injective() {
        let input = "<h1>A</h1><h2>B</h2><h3>C</h3>";
        let output = remap_headings(input, NOTES_BOOK_INTRO);
        assert_eq!(output, "<h2>A</h2><h3>B</h3><h4>C</h4>");
        assert!(!output.contains("tmp"));
    }

    #[test]
    fn untouched_levels_pass_through() {
        let input = "<h5>Already deep</h5><h6>Scratch-adjacent</h6>";
        let output = remap_headings(input, NOTES_BOOK_INTRO);
        assert_eq!(output, input);
    }

    proptest::proptest! {
        #[test]
        fn remap_never_produces_two_origin_levels_into_one_output_incorrectly(
            levels in proptest::collection::vec(1..=6u8, 0..20)
        ) {
            let html: String = levels
                .iter()
                .map(|l| format!("<h{l}>x</h{l}>"))
                .collect();
            let output = remap_headings(&html, NOTES_CHAPTER_INTRO);
            let by_from: std::collections::HashMap<u8, u8> =
                NOTES_CHAPTER_INTRO.iter().map(|r| (r.from, r.to)).collect();
            for (input_level, output_level) in levels.iter().zip(
                output
                    .match_indices("<h")
                    .map(|(i, _)| output[i + 2..].chars().next().unwrap().to_digit(10).unwrap() as u8),
            ) {
                let expected = *by_from.get(input_level).unwrap_or(input_level);
                prop_assert_eq!(output_level, expected);
            }
        }
    }
}
