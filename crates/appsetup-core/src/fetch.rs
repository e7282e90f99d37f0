//! Obtaining the application image.
//!
//! The normal path asks the download API for the current artifact URL and
//! downloads it. When that fails the user may retry, point at a file they
//! already have, or give up.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{Config, DownloadSettings};
use crate::error::{Result, SetupError};
use crate::host::{DownloadProgress, Host, HttpSource, Prompter};

/// What the download API told us about the current build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Direct artifact URL.
    pub download_url: String,
    /// Version string, when the API provides one.
    pub version: Option<String>,
    /// Expected SHA256 digest, when the API provides one.
    pub checksum: Option<String>,
}

/// Where an artifact came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Downloaded from this URL.
    Downloaded(String),
    /// Supplied by the user from the local file system.
    Local,
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Downloaded(url) => write!(f, "{url}"),
            Self::Local => write!(f, "local file"),
        }
    }
}

/// An application image ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location on disk.
    pub path: PathBuf,
    /// Version, if known.
    pub version: Option<String>,
    /// SHA256 of the file contents.
    pub sha256: String,
    /// Origin of the file.
    pub source: ArtifactSource,
}

fn pointer_string(document: &Value, pointer: &str) -> Option<String> {
    document
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Asks the download API for the current build.
pub fn resolve_release(settings: &DownloadSettings, http: &dyn HttpSource) -> Result<ReleaseInfo> {
    tracing::info!("Resolving download URL from {}", settings.api_url);
    let document = http.get_json(&settings.api_url)?;

    let download_url = pointer_string(&document, &settings.url_pointer).ok_or_else(|| {
        SetupError::ApiResponse(format!("no string at {}", settings.url_pointer))
    })?;
    if !download_url.starts_with("https://") && !download_url.starts_with("http://") {
        return Err(SetupError::ApiResponse(format!(
            "download URL is not HTTP(S): {download_url}"
        )));
    }

    let version = settings
        .version_pointer
        .as_deref()
        .and_then(|pointer| pointer_string(&document, pointer));
    let checksum = settings
        .checksum_pointer
        .as_deref()
        .and_then(|pointer| pointer_string(&document, pointer));

    tracing::debug!(
        "Resolved {} (version: {})",
        download_url,
        version.as_deref().unwrap_or("unknown")
    );
    Ok(ReleaseInfo {
        download_url,
        version,
        checksum,
    })
}

/// Whether `path` ends in `.extension` (ASCII case-insensitive).
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}

/// Checks a user-supplied artifact path.
pub fn validate_artifact_path(path: &Path, extension: &str) -> Result<PathBuf> {
    let invalid = |reason: String| SetupError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };

    if !has_extension(path, extension) {
        return Err(invalid(format!("expected a .{extension} file")));
    }
    let metadata = std::fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_file() {
        return Err(invalid("not a regular file".to_string()));
    }
    if metadata.len() == 0 {
        return Err(invalid("file is empty".to_string()));
    }
    Ok(path.to_path_buf())
}

/// File name for a downloaded artifact: the URL's last path segment when it
/// carries the right extension, `<fallback>.<extension>` otherwise.
#[must_use]
pub fn artifact_file_name(url: &str, fallback: &str, extension: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    if !segment.is_empty() && has_extension(Path::new(segment), extension) {
        segment.to_string()
    } else {
        format!("{fallback}.{extension}")
    }
}

/// Computes the SHA256 of a file as lowercase hex.
pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compares a computed digest with an expected one.
///
/// Accepts both `sha256:abc123` and plain `abc123` forms.
pub fn verify_sha256(actual: &str, expected: &str) -> Result<()> {
    let expected = expected
        .strip_prefix("sha256:")
        .unwrap_or(expected)
        .trim()
        .to_lowercase();
    if expected != actual {
        return Err(SetupError::ChecksumMismatch {
            expected,
            actual: actual.to_string(),
        });
    }
    tracing::info!("SHA256 verification passed: {}", actual);
    Ok(())
}

/// Downloads the artifact described by `release` into `dir`.
pub fn download_artifact(
    release: &ReleaseInfo,
    config: &Config,
    http: &dyn HttpSource,
    dir: &Path,
    on_progress: &dyn Fn(DownloadProgress),
) -> Result<Artifact> {
    let extension = &config.download.artifact_extension;
    let file_name = artifact_file_name(&release.download_url, &config.app.name, extension);
    let dest = dir.join(file_name);

    http.download(&release.download_url, &dest, on_progress)?;

    let sha256 = compute_sha256(&dest)?;
    if let Some(expected) = &release.checksum {
        verify_sha256(&sha256, expected)?;
    }

    Ok(Artifact {
        path: dest,
        version: release.version.clone(),
        sha256,
        source: ArtifactSource::Downloaded(release.download_url.clone()),
    })
}

fn fetch_latest(config: &Config, host: &Host<'_>, dir: &Path) -> Result<Artifact> {
    let release = resolve_release(&config.download, host.http)?;
    download_artifact(&release, config, host.http, dir, host.progress)
}

/// Obtains an artifact, falling back to manual entry when downloading fails.
pub fn obtain_artifact(config: &Config, host: &Host<'_>, dir: &Path) -> Result<Artifact> {
    let extension = &config.download.artifact_extension;
    let choices = [
        "Retry the download".to_string(),
        format!("Use a local .{extension} file"),
        "Abort".to_string(),
    ];

    loop {
        match fetch_latest(config, host, dir) {
            Ok(artifact) => return Ok(artifact),
            Err(err) => {
                tracing::warn!("Download failed: {}", err);
                host.prompter.notify(&format!("Download failed: {err}"));
                match host.prompter.select("How do you want to continue?", &choices)? {
                    0 => continue,
                    1 => return prompt_local_artifact(extension, host.prompter),
                    _ => return Err(SetupError::Aborted),
                }
            }
        }
    }
}

/// Asks for a local artifact path until a valid one is given or the user stops.
pub fn prompt_local_artifact(extension: &str, prompter: &dyn Prompter) -> Result<Artifact> {
    loop {
        let answer = prompter.input(&format!("Path to the .{extension} file"))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SetupError::Aborted);
        }

        let path = expand_home(answer);
        match validate_artifact_path(&path, extension) {
            Ok(path) => {
                let sha256 = compute_sha256(&path)?;
                tracing::info!("Using local artifact {}", path.display());
                return Ok(Artifact {
                    path,
                    version: None,
                    sha256,
                    source: ArtifactSource::Local,
                });
            }
            Err(err) => {
                prompter.notify(&err.to_string());
                if !prompter.confirm("Try another path?", true)? {
                    return Err(SetupError::Aborted);
                }
            }
        }
    }
}

fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(input),
    }
}
