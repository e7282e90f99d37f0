//! HTTP access for the download API and artifact downloads.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use crate::config::DownloadSettings;
use crate::error::{Result, SetupError};

/// Read buffer size for streaming downloads.
const CHUNK_SIZE: usize = 64 * 1024;

/// Progress information during a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Total bytes to download, 0 when the server did not say.
    pub total: u64,
}

impl DownloadProgress {
    /// Creates a new progress instance.
    #[must_use]
    pub fn new(downloaded: u64, total: u64) -> Self {
        Self { downloaded, total }
    }

    /// Returns the progress as a fraction (0.0 to 1.0).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.downloaded as f64 / self.total as f64) as f32
    }

    /// Returns the progress as a percentage (0 to 100).
    #[must_use]
    pub fn percentage(&self) -> u8 {
        (self.fraction() * 100.0).min(100.0) as u8
    }
}

/// Format bytes as a human-readable string.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Remote resources the workflows need.
pub trait HttpSource {
    /// Fetches and parses a JSON document.
    fn get_json(&self, url: &str) -> Result<serde_json::Value>;

    /// Downloads `url` to `dest`, returning the number of bytes written.
    ///
    /// `dest` is only created once the body has been received completely.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &dyn Fn(DownloadProgress),
    ) -> Result<u64>;
}

/// [`HttpSource`] backed by a blocking `reqwest` client.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client using the configured user agent and timeout.
    pub fn new(settings: &DownloadSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpSource for HttpClient {
    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::Network(format!(
                "request to {url} failed with status {status}"
            )));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &dyn Fn(DownloadProgress),
    ) -> Result<u64> {
        tracing::info!("Starting download from {}", url);

        let mut response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::Network(format!(
                "Download failed with status {}",
                status
            )));
        }

        let total = response.content_length().unwrap_or(0);
        let parent = dest
            .parent()
            .ok_or_else(|| SetupError::Io(format!("{} has no parent", dest.display())))?;
        fs::create_dir_all(parent)?;
        let mut file = tempfile::NamedTempFile::new_in(parent)?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|e| SetupError::Network(e.to_string()))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            downloaded += read as u64;
            on_progress(DownloadProgress::new(downloaded, total));
        }
        file.flush()?;

        file.persist(dest).map_err(|e| SetupError::Io(e.to_string()))?;

        tracing::info!("Download complete: {}", format_bytes(downloaded));
        Ok(downloaded)
    }
}
