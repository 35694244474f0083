//! The Asset Provisioner: materializes a [`ResourceLocation`] into a
//! local directory, idempotently and safely under concurrent re-entry.

mod lock;
mod transport;

pub use lock::LockRegistry;
pub use transport::{Fetcher, NetworkFetcher};

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::errors::Error;
use crate::model::ResourceLocation;

/// Deterministic cache directory name for a `(lang_code, resource_type)`
/// pair, matching "derived deterministically from (lang_code,
/// resource_type)".
pub fn target_dir(cache_root: &Path, lang_code: &str, resource_type: &str) -> PathBuf {
    cache_root.join(format!("{lang_code}_{resource_type}"))
}

/// Materialize `location` into the deterministic cache directory for
/// `(lang_code, resource_type)`, fetching over the network through
/// `fetcher`. Idempotent: an existing non-empty directory is returned
/// as-is without re-fetching. Retried up to `config.provision_max_attempts`
/// times with exponential backoff; on final failure the caller should drop
/// this resource and record a `ProvisionFailure` status.
#[instrument(skip(fetcher, config, locks), fields(lang_code, resource_type))]
pub fn provision(
    fetcher: &dyn Fetcher,
    locks: &LockRegistry,
    config: &Config,
    lang_code: &str,
    resource_type: &str,
    location: &ResourceLocation,
) -> Result<PathBuf, Error> {
    let dest = target_dir(&config.cache_root, lang_code, resource_type);

    let key = format!("{lang_code}_{resource_type}");
    let handle = locks.acquire(&key);
    let _guard = handle.guard();

    if is_already_provisioned(&dest) {
        debug!(dest = %dest.display(), "cache hit, skipping fetch");
        return Ok(dest);
    }

    let Some(_url) = location.url.as_deref() else {
        return Err(Error::CatalogMiss {
            lang_code: lang_code.to_string(),
            resource_type: resource_type.to_string(),
            book_code: String::new(),
        });
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        let tmp_dest = dest.with_extension(format!("tmp-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&tmp_dest);

        match transport::materialize(fetcher, location, &tmp_dest) {
            Ok(()) => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::rename(&tmp_dest, &dest)?;
                info!(dest = %dest.display(), attempt, "provisioned resource");
                return Ok(dest);
            }
            Err(err) if attempt < config.provision_max_attempts => {
                let backoff = Duration::from_millis(config.provision_backoff_base_ms * 2u64.pow(attempt - 1));
                warn!(attempt, ?backoff, error = %err, "provision attempt failed, retrying");
                let _ = std::fs::remove_dir_all(&tmp_dest);
                thread::sleep(backoff);
            }
            Err(err) => {
                let _ = std::fs::remove_dir_all(&tmp_dest);
                return Err(Error::ProvisionFailure {
                    lang_code: lang_code.to_string(),
                    resource_type: resource_type.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
        }
    }
}

fn is_already_provisioned(dest: &Path) -> bool {
    match std::fs::read_dir(dest) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransportKind;
    use tempfile::TempDir;

    fn location(url: &str, transport: TransportKind) -> ResourceLocation {
        ResourceLocation {
            url: Some(url.to_string()),
            transport,
            resource_type_name: "Unlocked Literal Bible".to_string(),
            path_selector: None,
        }
    }

    #[test]
    fn idempotent_when_already_populated() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            cache_root: tmp.path().to_path_buf(),
            ..Config::default()
        };
        let dest = target_dir(&config.cache_root, "en", "ulb");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("marker.txt"), b"present").unwrap();

        let mut mock = transport::MockFetcher::new();
        mock.expect_download_bytes().times(0);
        mock.expect_clone_git().times(0);

        let locks = LockRegistry::new();
        let result = provision(
            &mock,
            &locks,
            &config,
            "en",
            "ulb",
            &location("https://example.org/en_ulb.git", TransportKind::Git),
        );
        assert_eq!(result.unwrap(), dest);
    }

    #[test]
    fn unfound_location_is_catalog_miss() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            cache_root: tmp.path().to_path_buf(),
            ..Config::default()
        };
        let mock = transport::MockFetcher::new();
        let locks = LockRegistry::new();
        let result = provision(
            &mock,
            &locks,
            &config,
            "sw",
            "tn",
            &ResourceLocation::not_found("tn"),
        );
        assert!(matches!(result, Err(Error::CatalogMiss { .. })));
    }

    #[test]
    fn retries_then_succeeds() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            cache_root: tmp.path().to_path_buf(),
            provision_backoff_base_ms: 1,
            ..Config::default()
        };
        let mut mock = transport::MockFetcher::new();
        let mut call = 0;
        mock.expect_download_bytes().times(2).returning(move |_| {
            call += 1;
            if call == 1 {
                Err(Error::AssetFileNotFound("simulated transient failure".to_string()))
            } else {
                Ok(b"hello".to_vec())
            }
        });

        let locks = LockRegistry::new();
        let result = provision(
            &mock,
            &locks,
            &config,
            "en",
            "tw",
            &location("https://example.org/en_tw.txt", TransportKind::SingleFile),
        );
        assert!(result.is_ok());
    }
}
