//! Language-direction lookup shared by every parser. Tries a YAML
//! manifest then a JSON one, at one of two canonical relative roots;
//! absence of either falls back to LTR rather than failing the parse,
//! matching the rest of this crate's "fall back to a sane default, log
//! and continue" style.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::model::LangDirection;

#[derive(Debug, Deserialize)]
struct ManifestDublinCore {
    language: Option<ManifestLanguage>,
}

#[derive(Debug, Deserialize)]
struct ManifestLanguage {
    direction: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    dublin_core: Option<ManifestDublinCore>,
}

const CANDIDATE_PATHS: &[&str] = &["manifest.yaml", "manifest.json"];

/// Read the resource's language direction from its manifest, defaulting to
/// LTR when no manifest is found or it doesn't name a direction.
pub fn read_lang_direction(resource_root: &Path) -> LangDirection {
    for candidate in CANDIDATE_PATHS {
        let path = resource_root.join(candidate);
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let parsed: Option<Manifest> = if candidate.ends_with(".yaml") {
            serde_yaml::from_str(&text).ok()
        } else {
            serde_json::from_str(&text).ok()
        };
        if let Some(direction) = parsed
            .and_then(|m| m.dublin_core)
            .and_then(|dc| dc.language)
            .and_then(|l| l.direction)
        {
            return match direction.to_lowercase().as_str() {
                "rtl" => LangDirection::Rtl,
                _ => LangDirection::Ltr,
            };
        }
    }
    debug!(root = %resource_root.display(), "no manifest direction found, defaulting to LTR");
    LangDirection::Ltr
}

/// Read the resource's display language name from its manifest
/// (`dublin_core.language.title`), defaulting to `lang_code` itself when
/// no manifest names one.
pub fn read_lang_name(resource_root: &Path, lang_code: &str) -> String {
    for candidate in CANDIDATE_PATHS {
        let path = resource_root.join(candidate);
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let parsed: Option<Manifest> = if candidate.ends_with(".yaml") {
            serde_yaml::from_str(&text).ok()
        } else {
            serde_json::from_str(&text).ok()
        };
        if let Some(title) = parsed
            .and_then(|m| m.dublin_core)
            .and_then(|dc| dc.language)
            .and_then(|l| l.title)
        {
            return title;
        }
    }
    lang_code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_rtl_from_yaml_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("manifest.yaml"),
            "dublin_core:\n  language:\n    direction: rtl\n",
        )
        .unwrap();
        assert_eq!(read_lang_direction(dir.path()), LangDirection::Rtl);
    }

    #[test]
    fn defaults_to_ltr_when_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_lang_direction(dir.path()), LangDirection::Ltr);
    }

    #[test]
    fn reads_title_from_yaml_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("manifest.yaml"),
            "dublin_core:\n  language:\n    title: Kiswahili\n",
        )
        .unwrap();
        assert_eq!(read_lang_name(dir.path(), "sw"), "Kiswahili");
    }

    #[test]
    fn defaults_lang_name_to_code_when_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_lang_name(dir.path(), "sw"), "sw");
    }
}
