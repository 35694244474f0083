//! The Catalog Resolver: turns a `(lang_code, resource_type,
//! book_code)` triple into a [`ResourceLocation`] by walking a small,
//! fixed set of query paths against an in-memory catalog, in priority
//! order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use crate::errors::Error;
use crate::model::{ResourceLocation, TransportKind};

/// A loaded catalog plus the bookkeeping needed to decide when to reload it.
pub struct Catalog {
    path: PathBuf,
    ttl: std::time::Duration,
    root: Value,
    loaded_at: Instant,
    source_mtime: Option<SystemTime>,
}

impl Catalog {
    /// Load the catalog from disk. A missing or unparseable catalog is
    /// fatal at startup.
    pub fn load(path: &Path, ttl: std::time::Duration) -> Result<Catalog, Error> {
        let (root, mtime) = Self::read(path)?;
        Ok(Catalog {
            path: path.to_path_buf(),
            ttl,
            root,
            loaded_at: Instant::now(),
            source_mtime: mtime,
        })
    }

    fn read(path: &Path) -> Result<(Value, Option<SystemTime>), Error> {
        let text = fs::read_to_string(path)
            .map_err(|_| Error::CatalogUnavailable(path.to_path_buf()))?;
        let root: Value =
            serde_json::from_str(&text).map_err(|_| Error::CatalogUnavailable(path.to_path_buf()))?;
        let mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok((root, mtime))
    }

    /// Re-read the catalog from disk if the TTL has elapsed AND the file's
    /// mtime has changed since it was last loaded (both conditions, to
    /// bound `stat()` calls under load).
    pub fn refresh_if_stale(&mut self) -> Result<(), Error> {
        if self.loaded_at.elapsed() < self.ttl {
            return Ok(());
        }
        let current_mtime = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        if current_mtime == self.source_mtime {
            self.loaded_at = Instant::now();
            return Ok(());
        }
        debug!(path = %self.path.display(), "catalog changed on disk, reloading");
        let (root, mtime) = Self::read(&self.path)?;
        self.root = root;
        self.source_mtime = mtime;
        self.loaded_at = Instant::now();
        Ok(())
    }

    /// Resolve a single request triple to a [`ResourceLocation`]. A miss is
    /// not an error: the returned location simply has `url: None`.
    #[instrument(skip(self), fields(lang_code, resource_type, book_code))]
    pub fn resolve(
        &self,
        lang_code: &str,
        resource_type: &str,
        book_code: &str,
    ) -> ResourceLocation {
        if let Some(location) = self.query_language_resource_type_book(lang_code, resource_type, book_code) {
            trace!("resolved via language→resource-type→book entry");
            return location;
        }
        if let Some(location) = self.query_resource_type_group_zip(lang_code, resource_type, book_code) {
            trace!("resolved via resource-type-group zip fallback");
            return location;
        }
        if let Some(location) = self.query_generic_repo(lang_code, resource_type) {
            trace!("resolved via generic repo fallback");
            return location;
        }
        warn!("no catalog entry found");
        ResourceLocation::not_found(resource_type.to_string())
    }

    /// (a) language entry → resource-type group → book-code subentry →
    /// "Download"-labelled link.
    fn query_language_resource_type_book(
        &self,
        lang_code: &str,
        resource_type: &str,
        book_code: &str,
    ) -> Option<ResourceLocation> {
        let lang = self.root.get("languages")?.get(lang_code)?;
        let group = lang.get("resource_types")?.get(resource_type)?;
        let book = group.get("books")?.get(book_code)?;
        let link = book.get("links")?.as_array()?.iter().find(|l| {
            l.get("label").and_then(Value::as_str) == Some("Download")
        })?;
        let url = link.get("url")?.as_str()?.to_string();
        let name = group
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(resource_type)
            .to_string();
        Some(location_from_url(url, name, book.get("path").and_then(Value::as_str)))
    }

    /// (b) resource-type group with matching book-code, where the group
    /// itself has a zip link.
    fn query_resource_type_group_zip(
        &self,
        lang_code: &str,
        resource_type: &str,
        book_code: &str,
    ) -> Option<ResourceLocation> {
        let lang = self.root.get("languages")?.get(lang_code)?;
        let group = lang.get("resource_types")?.get(resource_type)?;
        let books = group.get("books")?.as_array()?;
        if !books.iter().any(|b| b.get("code").and_then(Value::as_str) == Some(book_code)) {
            return None;
        }
        let url = group.get("zip_url")?.as_str()?.to_string();
        let name = group
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(resource_type)
            .to_string();
        Some(location_from_url(url, name, None))
    }

    /// (c) fallback to a generic repo-style entry keyed only by language
    /// and resource type.
    fn query_generic_repo(&self, lang_code: &str, resource_type: &str) -> Option<ResourceLocation> {
        let repos = self.root.get("generic_repos")?.as_array()?;
        let entry = repos.iter().find(|r| {
            r.get("lang_code").and_then(Value::as_str) == Some(lang_code)
                && r.get("resource_type").and_then(Value::as_str) == Some(resource_type)
        })?;
        let url = entry.get("url")?.as_str()?.to_string();
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(resource_type)
            .to_string();
        Some(location_from_url(url, name, None))
    }
}

fn location_from_url(url: String, resource_type_name: String, path_selector: Option<&str>) -> ResourceLocation {
    let transport = if url.ends_with(".git") {
        TransportKind::Git
    } else if url.ends_with(".zip") {
        TransportKind::Zip
    } else {
        TransportKind::SingleFile
    };
    ResourceLocation {
        url: Some(url),
        transport,
        resource_type_name,
        path_selector: path_selector.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_catalog(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn resolves_language_resource_type_book_entry() {
        let json = r#"{
            "languages": {
                "en": {
                    "resource_types": {
                        "ulb": {
                            "name": "Unlocked Literal Bible",
                            "books": {
                                "tit": {
                                    "links": [{"label": "Download", "url": "https://example.org/en_ulb.git"}]
                                }
                            }
                        }
                    }
                }
            }
        }"#;
        let file = write_catalog(json);
        let catalog = Catalog::load(file.path(), std::time::Duration::from_secs(60)).unwrap();
        let location = catalog.resolve("en", "ulb", "tit");
        assert!(location.is_found());
        assert_eq!(location.transport, TransportKind::Git);
    }

    #[test]
    fn missing_entry_is_not_found_not_an_error() {
        let file = write_catalog(r#"{"languages": {}}"#);
        let catalog = Catalog::load(file.path(), std::time::Duration::from_secs(60)).unwrap();
        let location = catalog.resolve("sw", "tn", "col");
        assert!(!location.is_found());
    }

    #[test]
    fn missing_catalog_file_is_fatal() {
        let result = Catalog::load(Path::new("/nonexistent/catalog.json"), std::time::Duration::from_secs(60));
        assert!(result.is_err());
    }
}
