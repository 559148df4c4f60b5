//! Local file cache for warehouse dataset files.
//!
//! Each logical view (`covid`, `cases`, `mobility`) maps to a location that is
//! either a local path or an `http(s)` URL. Remote files are downloaded once
//! into the cache directory; `.gz` payloads are decompressed on the way in.

use crate::error::{InsightsError, Result};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolves dataset locations to local files, downloading remote ones.
pub struct DatasetStore {
    /// Directory where downloaded files are stored.
    pub cache_dir: PathBuf,
    /// If true, never download (use cached files only).
    pub offline: bool,
    sources: HashMap<String, String>,
    timeout: Duration,
    client: Option<Client>,
}

impl DatasetStore {
    /// Create a new store.
    ///
    /// Creates the cache directory if it does not exist.
    pub fn new(
        cache_dir: PathBuf,
        sources: HashMap<String, String>,
        offline: bool,
        timeout: Duration,
    ) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            offline,
            sources,
            timeout,
            client: None,
        })
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Ensure the file behind `view_name` is available locally.
    ///
    /// Returns the local filesystem path of the dataset file.
    pub fn ensure_file(&mut self, view_name: &str) -> Result<PathBuf> {
        let location = self
            .sources
            .get(view_name)
            .cloned()
            .ok_or_else(|| InsightsError::NotFound(format!("No source configured for view '{}'", view_name)))?;

        if !is_remote(&location) {
            let path = PathBuf::from(&location);
            if !path.exists() {
                return Err(InsightsError::NotFound(format!(
                    "Dataset file {} does not exist",
                    path.display()
                )));
            }
            return Ok(path);
        }

        let local_path = self.cache_dir.join(local_file_name(view_name, &location));
        if local_path.exists() {
            return Ok(local_path);
        }
        if self.offline {
            return Err(InsightsError::NotFound(format!(
                "Dataset {} not cached and offline mode is enabled",
                location
            )));
        }

        self.download(&location, &local_path)?;
        Ok(local_path)
    }

    /// Download `url` to `dest` through a temp file in the cache directory.
    fn download(&mut self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!(url, "downloading dataset");
        let client = self.client()?;
        let resp = client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(InsightsError::UpstreamUnavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }
        let bytes = resp.bytes()?;

        let payload = if url.ends_with(".gz") {
            let mut decoder = GzDecoder::new(bytes.as_ref());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            out
        } else {
            bytes.to_vec()
        };

        // Dropped (and deleted) on any error before persist.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&payload)?;
        tmp.flush()?;
        tmp.persist(dest).map_err(|e| InsightsError::Io(e.error))?;
        Ok(())
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// `{view}.{ext}` where `ext` is the URL's file extension with any `.gz` removed.
fn local_file_name(view_name: &str, url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let file = file.strip_suffix(".gz").unwrap_or(file);
    match file.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}.{}", view_name, ext),
        _ => view_name.to_string(),
    }
}
