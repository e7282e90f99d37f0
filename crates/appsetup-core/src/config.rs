//! Installer configuration.
//!
//! The built-in defaults describe the Cursor editor AppImage on Ubuntu 24.04.
//! Every value can be overridden from a TOML file; missing keys fall back to
//! the defaults section by section.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};

/// File name of the install record kept inside the install directory.
pub const RECORD_FILE_NAME: &str = ".appsetup.json";

/// Complete installer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application identity and launcher fields.
    pub app: AppSettings,
    /// Fixed file-system locations.
    pub paths: PathSettings,
    /// Supported host operating system.
    pub environment: EnvironmentSettings,
    /// Package manager and required programs.
    pub packages: PackageSettings,
    /// Download API and artifact rules.
    pub download: DownloadSettings,
    /// Icon choices offered to the user.
    pub icons: Vec<IconChoice>,
    /// Deployment details.
    pub deploy: DeploySettings,
}

/// Application identity and launcher fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Short machine name, used for file names.
    pub name: String,
    /// Name shown in menus.
    pub display_name: String,
    /// Launcher tooltip.
    pub comment: String,
    /// freedesktop menu categories.
    pub categories: Vec<String>,
    /// Main executable, relative to the install directory.
    pub executable: PathBuf,
    /// Arguments appended to the executable in the launcher.
    pub exec_args: String,
    /// Window class used by docks to group windows.
    pub startup_wm_class: Option<String>,
    /// MIME types the application handles.
    pub mime_types: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "cursor".to_string(),
            display_name: "Cursor".to_string(),
            comment: "The AI Code Editor".to_string(),
            categories: vec!["Development".to_string(), "IDE".to_string()],
            executable: PathBuf::from("AppRun"),
            exec_args: "--no-sandbox %F".to_string(),
            startup_wm_class: Some("Cursor".to_string()),
            mime_types: vec!["x-scheme-handler/cursor".to_string()],
        }
    }
}

/// Fixed file-system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory the application tree is deployed to.
    pub install_dir: PathBuf,
    /// Launcher descriptor file.
    pub desktop_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("/opt/cursor"),
            desktop_file: PathBuf::from("/usr/share/applications/cursor.desktop"),
        }
    }
}

/// Supported host operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Required `ID` from os-release.
    pub distro_id: String,
    /// Accepted `VERSION_ID` values. Empty accepts any version.
    pub version_ids: Vec<String>,
    /// Location of the os-release file.
    pub os_release: PathBuf,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            distro_id: "ubuntu".to_string(),
            version_ids: vec!["24.04".to_string()],
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

/// A program that must be on `PATH`, and the package that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Executable looked up on `PATH`.
    pub program: String,
    /// Package installed when the program is missing.
    pub package: String,
}

impl Requirement {
    /// Creates a new requirement.
    pub fn new(program: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            package: package.into(),
        }
    }
}

/// Package manager and required programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    /// Command (argv) that installs packages; package names are appended.
    pub install_command: Vec<String>,
    /// Command (argv) run once before installing, e.g. an index refresh.
    pub refresh_command: Option<Vec<String>>,
    /// Programs the workflows rely on.
    pub requirements: Vec<Requirement>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            install_command: vec![
                "apt-get".to_string(),
                "install".to_string(),
                "-y".to_string(),
            ],
            refresh_command: Some(vec!["apt-get".to_string(), "update".to_string()]),
            requirements: vec![
                Requirement::new("figlet", "figlet"),
                Requirement::new("update-desktop-database", "desktop-file-utils"),
            ],
        }
    }
}

/// Download API and artifact rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Endpoint returning a JSON document describing the latest build.
    pub api_url: String,
    /// JSON pointer to the artifact URL in the API response.
    pub url_pointer: String,
    /// JSON pointer to the version string, if the API provides one.
    pub version_pointer: Option<String>,
    /// JSON pointer to a SHA256 digest, if the API provides one.
    pub checksum_pointer: Option<String>,
    /// Required artifact file extension (without the dot).
    pub artifact_extension: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            api_url: "https://www.cursor.com/api/download?platform=linux-x64&releaseTrack=stable"
                .to_string(),
            url_pointer: "/downloadUrl".to_string(),
            version_pointer: Some("/version".to_string()),
            checksum_pointer: None,
            artifact_extension: "AppImage".to_string(),
            user_agent: concat!("appsetup/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 300,
        }
    }
}

/// One selectable launcher icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconChoice {
    /// Stable identifier.
    pub key: String,
    /// Text shown in the selection prompt.
    pub label: String,
    /// Where the image is downloaded from.
    pub url: String,
    /// File name inside the install directory.
    pub file_name: String,
}

/// Deployment details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Directory the archive unpacks itself into.
    pub extract_dir_name: String,
    /// Helpers that need the setuid bit (relative to the install directory).
    pub setuid_helpers: Vec<PathBuf>,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            extract_dir_name: "squashfs-root".to_string(),
            setuid_helpers: vec![PathBuf::from("chrome-sandbox")],
        }
    }
}

fn default_icons() -> Vec<IconChoice> {
    vec![
        IconChoice {
            key: "classic".to_string(),
            label: "Classic icon".to_string(),
            url: "https://www.cursor.com/assets/images/logo.png".to_string(),
            file_name: "cursor-classic.png".to_string(),
        },
        IconChoice {
            key: "modern".to_string(),
            label: "Modern icon".to_string(),
            url: "https://www.cursor.com/apple-touch-icon.png".to_string(),
            file_name: "cursor-modern.png".to_string(),
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            paths: PathSettings::default(),
            environment: EnvironmentSettings::default(),
            packages: PackageSettings::default(),
            download: DownloadSettings::default(),
            icons: default_icons(),
            deploy: DeploySettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SetupError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, the default config location, or built-ins.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                tracing::debug!("Using built-in configuration");
                Ok(Self::default())
            }
        }
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "appsetup", "appsetup")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.app.name.trim().is_empty() {
            return Err(SetupError::Config("app.name must not be empty".to_string()));
        }
        if !self.paths.install_dir.is_absolute() {
            return Err(SetupError::Config(format!(
                "paths.install_dir must be absolute: {}",
                self.paths.install_dir.display()
            )));
        }
        if !self.paths.desktop_file.is_absolute() {
            return Err(SetupError::Config(format!(
                "paths.desktop_file must be absolute: {}",
                self.paths.desktop_file.display()
            )));
        }
        if self.app.executable.is_absolute() {
            return Err(SetupError::Config(
                "app.executable must be relative to the install directory".to_string(),
            ));
        }
        if self.download.artifact_extension.trim().is_empty() {
            return Err(SetupError::Config(
                "download.artifact_extension must not be empty".to_string(),
            ));
        }
        if self.packages.install_command.is_empty() {
            return Err(SetupError::Config(
                "packages.install_command must not be empty".to_string(),
            ));
        }
        if self.icons.is_empty() {
            return Err(SetupError::Config("at least one icon choice is required".to_string()));
        }

        if !is_plain_file_name(&self.deploy.extract_dir_name) {
            return Err(SetupError::Config(format!(
                "deploy.extract_dir_name must be a single path component: {:?}",
                self.deploy.extract_dir_name
            )));
        }

        let mut keys = HashSet::new();
        let mut files = HashSet::new();
        for icon in &self.icons {
            if !keys.insert(icon.key.as_str()) {
                return Err(SetupError::Config(format!("duplicate icon key: {}", icon.key)));
            }
            if !is_plain_file_name(&icon.file_name) || !files.insert(icon.file_name.as_str()) {
                return Err(SetupError::Config(format!(
                    "icon file name must be unique and plain: {:?}",
                    icon.file_name
                )));
            }
            if Path::new(&icon.file_name) == self.app.executable
                || icon.file_name == RECORD_FILE_NAME
            {
                return Err(SetupError::Config(format!(
                    "icon file name {} is reserved",
                    icon.file_name
                )));
            }
        }
        Ok(())
    }

    /// Absolute path of the main executable.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.paths.install_dir.join(&self.app.executable)
    }

    /// Absolute path of an icon inside the install tree.
    #[must_use]
    pub fn icon_path(&self, icon: &IconChoice) -> PathBuf {
        self.paths.install_dir.join(&icon.file_name)
    }

    /// File names of every configured icon.
    #[must_use]
    pub fn icon_file_names(&self) -> Vec<&str> {
        self.icons.iter().map(|icon| icon.file_name.as_str()).collect()
    }

    /// Location of the install record.
    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        self.paths.install_dir.join(RECORD_FILE_NAME)
    }
}

/// Whether `name` is exactly one normal path component.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
