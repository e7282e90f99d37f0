//! Install record kept next to the deployed tree.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};
use crate::fetch::{Artifact, ArtifactSource};

/// What was installed, from where, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Application name.
    pub app: String,
    /// Installed version, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// SHA256 of the artifact that was deployed.
    pub sha256: String,
    /// Download URL, or `None` for a local file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Installation timestamp.
    pub installed_at: DateTime<Utc>,
}

impl InstallRecord {
    /// Builds a record for a freshly deployed artifact.
    #[must_use]
    pub fn new(app: &str, artifact: &Artifact) -> Self {
        let source_url = match &artifact.source {
            ArtifactSource::Downloaded(url) => Some(url.clone()),
            ArtifactSource::Local => None,
        };
        Self {
            app: app.to_string(),
            version: artifact.version.clone(),
            sha256: artifact.sha256.clone(),
            source_url,
            installed_at: Utc::now(),
        }
    }

    /// Reads a record. A missing or unreadable record yields `None`.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("Ignoring unreadable install record {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Writes the record as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SetupError::Io(format!("cannot serialize install record: {e}")))?;
        std::fs::write(path, json)?;
        tracing::debug!("Wrote install record {}", path.display());
        Ok(())
    }
}
