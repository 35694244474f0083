//! Fetches the bytes behind a [`ResourceLocation`] once resolved, one
//! function per [`TransportKind`]. The `Fetcher` trait is a small seam so
//! tests can substitute a fake fetcher instead of hitting the network.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::errors::Error;
use crate::model::ResourceLocation;

/// Fetches remote content. The default methods implement the real
/// transports; tests substitute a mock that never touches the network.
#[cfg_attr(test, automock)]
pub trait Fetcher {
    /// Shallow-clone a git repository into `dest` (must not already exist).
    fn clone_git(&self, url: &str, dest: &Path) -> Result<(), Error>;
    /// Download `url` and return its raw bytes.
    fn download_bytes(&self, url: &str) -> Result<Vec<u8>, Error>;
}

/// The real, network-backed [`Fetcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFetcher;

impl Fetcher for NetworkFetcher {
    fn clone_git(&self, url: &str, dest: &Path) -> Result<(), Error> {
        debug!(url, dest = %dest.display(), "shallow-cloning git repository");
        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.depth(1);
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_options);
        builder.clone(url, dest)?;
        Ok(())
    }

    fn download_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!(url, "downloading resource");
        let res = ureq::get(url).call()?;
        let mut bytes = Vec::new();
        let (_, body) = res.into_parts();
        body.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Materialize `location` into `dest`, a directory that does not yet exist
/// (the caller is responsible for the idempotency check and the
/// temp-then-rename atomicity; see `provision::provision`).
pub fn materialize(fetcher: &dyn Fetcher, location: &ResourceLocation, dest: &Path) -> Result<(), Error> {
    let url = location.url.as_deref().expect("materialize called on an unresolved location");

    use crate::model::TransportKind::*;
    match location.transport {
        Git => fetcher.clone_git(url, dest),
        Zip => {
            let bytes = fetcher.download_bytes(url)?;
            unpack_zip(&bytes, dest)
        }
        SingleFile => {
            let bytes = fetcher.download_bytes(url)?;
            fs::create_dir_all(dest)?;
            let filename = url.rsplit('/').next().unwrap_or("resource");
            let mut file = File::create(dest.join(filename))?;
            io::copy(&mut io::Cursor::new(bytes), &mut file)?;
            Ok(())
        }
    }
}

fn unpack_zip(bytes: &[u8], dest: &Path) -> Result<(), Error> {
    fs::create_dir_all(dest)?;
    let cursor = io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative_path) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping zip entry with unsafe path");
            continue;
        };
        let out_path: PathBuf = dest.join(relative_path);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out_file = File::create(&out_path)?;
            io::copy(&mut entry, &mut out_file)?;
        }
    }
    Ok(())
}
