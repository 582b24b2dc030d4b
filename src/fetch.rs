// src/fetch.rs

//! Artifact retrieval with checksum verification and a download cache
//!
//! Every locator fetch goes through [`Fetcher::fetch`]: the artifact lands
//! in a content-addressed cache keyed by its declared checksum, so repeated
//! invocations for the same version never re-download. Downloads are
//! written to a `.tmp` name and renamed only after verification — a partial
//! or corrupt fetch is never visible under the final cache name.
//!
//! Locators may also point at local files (`file://` URLs or bare paths)
//! for mirrored or air-gapped recipe data; those are copied and verified
//! exactly like remote objects.

use crate::error::{Error, Result};
use crate::hash;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Blocking artifact fetcher with a checksum-keyed cache
pub struct Fetcher {
    client: Client,
    cache_dir: PathBuf,
    progress: bool,
}

impl Fetcher {
    /// Create a fetcher caching downloads under `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("galley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::RetrievalFailed(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache_dir,
            progress: false,
        })
    }

    /// Enable progress bars for downloads
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Retrieve `url` into the cache, verifying `checksum`
    ///
    /// Returns the cached path. A cache hit is re-verified; a stale or
    /// corrupt cached file is discarded and fetched again.
    pub fn fetch(&self, url: &str, checksum: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.cache_dir)?;

        let cache_key = checksum.replace(':', "_");
        let cached = self.cache_dir.join(&cache_key);

        if cached.exists() {
            if hash::verify_file(&cached, checksum).is_ok() {
                debug!("Using cached artifact: {}", cached.display());
                return Ok(cached);
            }
            warn!("Cached artifact failed verification, refetching");
            fs::remove_file(&cached)?;
        }

        let temp = self.cache_dir.join(format!("{cache_key}.tmp"));
        if let Err(e) = self.retrieve(url, &temp) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = hash::verify_file(&temp, checksum) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        fs::rename(&temp, &cached)?;
        Ok(cached)
    }

    fn retrieve(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(path) = local_source(url) {
            debug!("Copying local artifact: {}", path.display());
            fs::copy(&path, dest).map_err(|e| {
                Error::RetrievalFailed(format!("cannot copy {}: {e}", path.display()))
            })?;
            return Ok(());
        }

        info!("Downloading {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::RetrievalFailed(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::RetrievalFailed(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let total = response.content_length().unwrap_or(0);
        let bar = if self.progress && total > 0 {
            Some(download_bar(total, url))
        } else {
            None
        };

        let mut file = File::create(dest)?;
        stream_to_file(response, &mut file, bar.as_ref())?;

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        Ok(())
    }
}

/// Resolve `file://` URLs and bare paths to a local filesystem path
fn local_source(url: &str) -> Option<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    if !url.contains("://") {
        return Some(PathBuf::from(url));
    }
    None
}

/// Stream an HTTP response to a file in fixed-size chunks
fn stream_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let read = response
            .read(&mut buffer)
            .map_err(|e| Error::RetrievalFailed(format!("failed to read response: {e}")))?;
        if read == 0 {
            break;
        }

        file.write_all(&buffer[..read])
            .map_err(|e| Error::RetrievalFailed(format!("failed to write download: {e}")))?;
        downloaded += read as u64;

        if let Some(bar) = progress {
            bar.set_position(downloaded);
        }
    }

    Ok(downloaded)
}

fn download_bar(size: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    bar.set_message(name.to_string());
    bar
}
