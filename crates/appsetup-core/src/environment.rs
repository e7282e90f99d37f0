//! Host operating system check.

use std::collections::HashMap;
use std::path::Path;

use crate::config::EnvironmentSettings;
use crate::error::{Result, SetupError};

/// Parsed `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    fields: HashMap<String, String>,
}

impl OsRelease {
    /// Parses os-release text (`KEY=value` lines, optionally quoted).
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), unquote(value.trim())))
            .collect();
        Self { fields }
    }

    /// Reads and parses an os-release file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SetupError::OsRelease {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    /// Looks up a raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Distribution identifier (`ID`).
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get("ID")
    }

    /// Release identifier (`VERSION_ID`).
    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        self.get("VERSION_ID")
    }

    /// Human-readable name, falling back to `ID VERSION_ID`.
    #[must_use]
    pub fn pretty_name(&self) -> String {
        match self.get("PRETTY_NAME") {
            Some(name) => name.to_string(),
            None => self.describe(),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} {}",
            self.id().unwrap_or("unknown"),
            self.version_id().unwrap_or("?")
        )
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"")
}

/// Verifies the host matches the configured distribution and release.
///
/// Performs no side effects besides reading the os-release file.
pub fn check_environment(settings: &EnvironmentSettings) -> Result<OsRelease> {
    let release = OsRelease::read(&settings.os_release)?;

    let expected = if settings.version_ids.is_empty() {
        settings.distro_id.clone()
    } else {
        format!("{} {}", settings.distro_id, settings.version_ids.join("/"))
    };

    let id_matches = release
        .id()
        .is_some_and(|id| id.eq_ignore_ascii_case(&settings.distro_id));
    let version_matches = settings.version_ids.is_empty()
        || release
            .version_id()
            .is_some_and(|v| settings.version_ids.iter().any(|allowed| allowed == v));

    if !(id_matches && version_matches) {
        return Err(SetupError::UnsupportedOs {
            found: release.describe(),
            expected,
        });
    }

    tracing::info!("Detected {}", release.pretty_name());
    Ok(release)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 24.04.1 LTS"
NAME="Ubuntu"
VERSION_ID="24.04"
VERSION="24.04.1 LTS (Noble Numbat)"
ID=ubuntu
ID_LIKE=debian
# comment line
"#;

    fn settings_for(path: PathBuf) -> EnvironmentSettings {
        EnvironmentSettings {
            os_release: path,
            ..EnvironmentSettings::default()
        }
    }

    #[test]
    fn test_parse_os_release() {
        let release = OsRelease::parse(UBUNTU);
        assert_eq!(release.id(), Some("ubuntu"));
        assert_eq!(release.version_id(), Some("24.04"));
        assert_eq!(release.pretty_name(), "Ubuntu 24.04.1 LTS");
        assert_eq!(release.get("ID_LIKE"), Some("debian"));
    }

    #[test]
    fn test_parse_single_quotes_and_blank_lines() {
        let release = OsRelease::parse("\nID='fedora'\n\nVERSION_ID=40\n");
        assert_eq!(release.id(), Some("fedora"));
        assert_eq!(release.version_id(), Some("40"));
        assert_eq!(release.pretty_name(), "fedora 40");
    }

    #[test]
    fn test_check_environment_accepts_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, UBUNTU).unwrap();

        let release = check_environment(&settings_for(path)).unwrap();
        assert_eq!(release.version_id(), Some("24.04"));
    }

    #[test]
    fn test_check_environment_rejects_other_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, UBUNTU.replace("24.04", "22.04")).unwrap();

        let err = check_environment(&settings_for(path)).unwrap_err();
        match err {
            SetupError::UnsupportedOs { found, expected } => {
                assert_eq!(found, "ubuntu 22.04");
                assert_eq!(expected, "ubuntu 24.04");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_environment_rejects_other_distro() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, "ID=arch\n").unwrap();

        let mut settings = settings_for(path);
        settings.version_ids.clear();
        assert!(matches!(
            check_environment(&settings),
            Err(SetupError::UnsupportedOs { .. })
        ));
    }

    #[test]
    fn test_check_environment_any_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, "ID=ubuntu\nVERSION_ID=26.04\n").unwrap();

        let mut settings = settings_for(path);
        settings.version_ids.clear();
        assert!(check_environment(&settings).is_ok());
    }

    #[test]
    fn test_missing_os_release() {
        let settings = settings_for(PathBuf::from("/nonexistent/os-release"));
        assert!(matches!(
            check_environment(&settings),
            Err(SetupError::OsRelease { .. })
        ));
    }
}
