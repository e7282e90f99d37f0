//! Error types for the setup workflows.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while installing, updating or removing the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    /// Host distribution or release does not match the configured target.
    #[error("unsupported operating system: found {found}, expected {expected}")]
    UnsupportedOs {
        /// What the host reported (`ID VERSION_ID`).
        found: String,
        /// What the configuration requires.
        expected: String,
    },

    /// The os-release file could not be read or lacks required keys.
    #[error("cannot read {path}: {reason}")]
    OsRelease {
        /// Path that was inspected.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external command exited unsuccessfully.
    #[error("command `{program}` failed ({status}): {stderr}")]
    Command {
        /// Program that was executed.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error (trimmed).
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("failed to run `{program}`: {reason}")]
    CommandSpawn {
        /// Program that was executed.
        program: String,
        /// OS error description.
        reason: String,
    },

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The download API answered with something we cannot use.
    #[error("unexpected API response: {0}")]
    ApiResponse(String),

    /// SHA256 checksum verification failed.
    #[error("checksum verification failed: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Expected SHA256 hash.
        expected: String,
        /// Actual SHA256 hash of the artifact.
        actual: String,
    },

    /// A user-supplied artifact path is not acceptable.
    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact {
        /// Offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Self-extraction of the archive failed.
    #[error("archive extraction error: {0}")]
    Extraction(String),

    /// Replacing or repairing the installed tree failed.
    #[error("deployment error: {0}")]
    Deploy(String),

    /// Writing the launcher descriptor failed.
    #[error("desktop entry error: {0}")]
    DesktopEntry(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(String),

    /// Reading from the terminal failed.
    #[error("prompt error: {0}")]
    Prompt(String),

    /// The user chose to stop.
    #[error("aborted by user")]
    Aborted,
}

impl SetupError {
    /// Returns a short message suitable for the terminal.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::UnsupportedOs { .. } => "This system is not supported by this installer.",
            Self::OsRelease { .. } => "Could not determine the operating system version.",
            Self::Config(_) => "The installer configuration is invalid.",
            Self::Command { .. } | Self::CommandSpawn { .. } => "A system command failed.",
            Self::Network(_) | Self::ApiResponse(_) => {
                "Could not download the application. Please check your internet connection."
            }
            Self::ChecksumMismatch { .. } => {
                "Security verification failed. The download may have been tampered with."
            }
            Self::InvalidArtifact { .. } => "The selected file is not a valid application image.",
            Self::Extraction(_) => "Could not extract the application image.",
            Self::Deploy(_) => "Could not install the application files.",
            Self::DesktopEntry(_) => "Could not create the application launcher.",
            Self::Io(_) => "A file operation failed. Are you running with enough privileges?",
            Self::Prompt(_) => "Could not read input from the terminal.",
            Self::Aborted => "Cancelled.",
        }
    }

    /// Process exit code for this error. Every failure is terminal for the run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<reqwest::Error> for SetupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(err: serde_json::Error) -> Self {
        Self::ApiResponse(err.to_string())
    }
}

impl From<toml::de::Error> for SetupError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, SetupError>;
