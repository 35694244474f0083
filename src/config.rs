use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Process-wide configuration, loaded once at binary startup and threaded
/// by reference through the pipeline rather than held as a global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Where the catalog JSON lives on disk.
    pub catalog_path: PathBuf,
    /// How long a loaded catalog is trusted before its `mtime` is rechecked.
    pub catalog_ttl_seconds: u64,
    /// Root directory under which provisioned asset trees are cached,
    /// keyed by `{lang}_{resource_type}`.
    pub cache_root: PathBuf,
    /// Where assembled HTML (and any converted PDF/ePub/DOCX) is written.
    pub output_dir: PathBuf,
    /// Number of worker threads used to fan out catalog resolution,
    /// provisioning, and parsing.
    pub worker_pool_size: usize,
    /// Maximum provision attempts before a resource is dropped as a
    /// `ProvisionFailure`.
    pub provision_max_attempts: u32,
    /// Base delay for provisioning's exponential backoff.
    pub provision_backoff_base_ms: u64,
    /// Per-attempt provisioning timeout.
    pub provision_attempt_timeout_ms: u64,
    /// Whether book introductions are included for Notes/Commentary.
    pub include_tn_book_intros: bool,
    /// Format string used to rewrite commentary article links to absolute
    /// external URLs. Must contain one `{}` placeholder for the
    /// article's relative path.
    pub commentary_external_url_fmt: String,
    /// Additional CSS files appended after the default stylesheet.
    pub additional_css: Vec<PathBuf>,
    pub use_default_css: bool,
    /// Heading titles the Section Remover strips before conversion.
    /// Empty by default; operators populate it per-deployment (e.g. a
    /// "Links" or "Translation Words" section some source repos carry
    /// that this pipeline already renders separately).
    pub removed_section_titles: Vec<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, Error> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_seconds)
    }

    pub fn provision_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.provision_attempt_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            catalog_path: PathBuf::from("catalog.json"),
            catalog_ttl_seconds: 300,
            cache_root: PathBuf::from("cache"),
            output_dir: PathBuf::from("output"),
            worker_pool_size: 8,
            provision_max_attempts: 3,
            provision_backoff_base_ms: 250,
            provision_attempt_timeout_ms: 30_000,
            include_tn_book_intros: true,
            commentary_external_url_fmt: "https://git.door43.org/{}".to_string(),
            use_default_css: true,
            additional_css: Vec::new(),
            removed_section_titles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = Config::default();
        assert_eq!(config.provision_max_attempts, 3);
        assert!(config.use_default_css);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, parsed);
    }
}
