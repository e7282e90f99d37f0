//! The four user-facing workflows.
//!
//! Each workflow is a plain function over a [`Config`] and a [`Host`]. They
//! return an [`Outcome`] for the expected non-error endings and a
//! [`SetupError`](crate::error::SetupError) for everything that stops the run.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::dependencies::ensure_dependencies;
use crate::deploy::{
    IconBackup, extract_archive, fix_permissions, remove_installation, replace_tree,
};
use crate::desktop::{
    DesktopEntry, current_icon, refresh_desktop_database, remove_desktop_entry, write_desktop_entry,
};
use crate::error::Result;
use crate::fetch::{Artifact, obtain_artifact};
use crate::host::Host;
use crate::icons::{choose_icon, fetch_icon};
use crate::record::InstallRecord;

/// Operation chosen from the menu or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fresh installation.
    Install,
    /// Replace the installed tree with the latest build.
    Update,
    /// Pick a launcher icon again.
    RestoreIcons,
    /// Remove the application.
    Uninstall,
}

impl Operation {
    /// Every operation in menu order.
    pub const ALL: [Self; 4] = [Self::Install, Self::Update, Self::RestoreIcons, Self::Uninstall];

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Update => "Update",
            Self::RestoreIcons => "Restore icons",
            Self::Uninstall => "Uninstall",
        }
    }

    /// Parses a 1-based menu answer.
    #[must_use]
    pub fn from_menu_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Install),
            "2" => Some(Self::Update),
            "3" => Some(Self::RestoreIcons),
            "4" => Some(Self::Uninstall),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a workflow ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The workflow did its work.
    Completed,
    /// Install was asked for but the application is already there.
    AlreadyInstalled,
    /// The workflow needs an installation and there is none.
    NotInstalled,
    /// The user answered "no" to a confirmation.
    Declined,
    /// The installed build is already the latest one.
    UpToDate,
}

/// Whether the application is installed.
#[must_use]
pub fn is_installed(config: &Config) -> bool {
    config.paths.install_dir.is_dir()
}

/// Dispatches `operation`.
pub fn run(operation: Operation, config: &Config, host: &Host<'_>) -> Result<Outcome> {
    tracing::info!("Starting {}", operation.label().to_lowercase());
    match operation {
        Operation::Install => install(config, host),
        Operation::Update => update(config, host),
        Operation::RestoreIcons => restore_icons(config, host),
        Operation::Uninstall => uninstall(config, host),
    }
}

/// Installs the application, then asks for an icon and writes the launcher.
///
/// The deployed tree is removed again when no icon could be installed, so a
/// later Install starts over.
pub fn install(config: &Config, host: &Host<'_>) -> Result<Outcome> {
    if is_installed(config) {
        tracing::info!(
            "{} is already installed at {}",
            config.app.display_name,
            config.paths.install_dir.display()
        );
        return Ok(Outcome::AlreadyInstalled);
    }

    ensure_dependencies(&config.packages, host.runner)?;

    let workdir = tempfile::tempdir()?;
    let artifact = obtain_artifact(config, host, workdir.path())?;
    deploy_artifact(&artifact, config, host, workdir.path())?;

    let icon_path = match choose_icon(config, host.prompter)
        .and_then(|icon| fetch_icon(icon, config, host.http, host.prompter))
    {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!("No launcher icon, removing {}", config.paths.install_dir.display());
            remove_installation(&config.paths.install_dir)?;
            return Err(err);
        }
    };
    write_launcher(config, host, &icon_path)?;

    save_record(config, &artifact);
    host.prompter.notify(&format!(
        "{} installed to {}",
        config.app.display_name,
        config.paths.install_dir.display()
    ));
    Ok(Outcome::Completed)
}

/// Replaces the installed tree with a fresh build, keeping downloaded icons.
pub fn update(config: &Config, host: &Host<'_>) -> Result<Outcome> {
    if !is_installed(config) {
        return Ok(Outcome::NotInstalled);
    }

    ensure_dependencies(&config.packages, host.runner)?;

    let workdir = tempfile::tempdir()?;
    let artifact = obtain_artifact(config, host, workdir.path())?;

    if let Some(record) = InstallRecord::load(&config.record_path())
        && is_same_build(&record, &artifact)
    {
        let version = artifact.version.as_deref().unwrap_or("this build");
        let prompt = format!("{version} is already installed. Reinstall anyway?");
        if !host.prompter.confirm(&prompt, false)? {
            return Ok(Outcome::UpToDate);
        }
    }

    let backup = IconBackup::capture(&config.paths.install_dir, &config.icon_file_names())?;
    deploy_artifact(&artifact, config, host, workdir.path())?;
    backup.restore(&config.paths.install_dir)?;

    save_record(config, &artifact);
    host.prompter.notify(&format!("{} updated", config.app.display_name));
    Ok(Outcome::Completed)
}

fn is_same_build(record: &InstallRecord, artifact: &Artifact) -> bool {
    if record.sha256 == artifact.sha256 {
        return true;
    }
    matches!((&record.version, &artifact.version), (Some(old), Some(new)) if old == new)
}

/// Downloads a chosen icon again and points the launcher at it.
pub fn restore_icons(config: &Config, host: &Host<'_>) -> Result<Outcome> {
    if !is_installed(config) {
        return Ok(Outcome::NotInstalled);
    }

    let icon = choose_icon(config, host.prompter)?;
    let icon_path = fetch_icon(icon, config, host.http, host.prompter)?;
    write_launcher(config, host, &icon_path)?;

    host.prompter.notify(&format!("Launcher icon set to {}", icon.label));
    Ok(Outcome::Completed)
}

/// Removes the install tree and the launcher after confirmation.
pub fn uninstall(config: &Config, host: &Host<'_>) -> Result<Outcome> {
    let install_dir = &config.paths.install_dir;
    let desktop_file = &config.paths.desktop_file;
    if !install_dir.exists() && !desktop_file.exists() {
        return Ok(Outcome::NotInstalled);
    }

    let prompt = format!(
        "Remove {} from {}?",
        config.app.display_name,
        install_dir.display()
    );
    if !host.prompter.confirm(&prompt, false)? {
        tracing::info!("Uninstall declined");
        return Ok(Outcome::Declined);
    }

    remove_installation(install_dir)?;
    remove_desktop_entry(desktop_file)?;
    refresh_launcher_cache(config, host);

    host.prompter.notify(&format!("{} removed", config.app.display_name));
    Ok(Outcome::Completed)
}

fn deploy_artifact(
    artifact: &Artifact,
    config: &Config,
    host: &Host<'_>,
    workdir: &Path,
) -> Result<()> {
    let extracted = extract_archive(&artifact.path, &config.deploy, host.runner, workdir)?;
    replace_tree(&extracted, &config.paths.install_dir)?;
    fix_permissions(
        &config.paths.install_dir,
        &config.executable_path(),
        &config.deploy.setuid_helpers,
    )
}

fn write_launcher(config: &Config, host: &Host<'_>, icon: &Path) -> Result<()> {
    let entry = DesktopEntry::from_config(config, icon);
    write_desktop_entry(&entry, &config.paths.desktop_file)?;
    refresh_launcher_cache(config, host);
    Ok(())
}

fn refresh_launcher_cache(config: &Config, host: &Host<'_>) {
    if let Some(dir) = config.paths.desktop_file.parent() {
        refresh_desktop_database(host.runner, dir);
    }
}

fn save_record(config: &Config, artifact: &Artifact) {
    let record = InstallRecord::new(&config.app.name, artifact);
    if let Err(err) = record.save(&config.record_path()) {
        tracing::warn!("Could not write install record: {}", err);
    }
}

/// Snapshot of what is currently on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStatus {
    /// Install directory.
    pub install_dir: PathBuf,
    /// Whether the install directory exists.
    pub installed: bool,
    /// Version from the install record.
    pub version: Option<String>,
    /// Timestamp from the install record.
    pub installed_at: Option<DateTime<Utc>>,
    /// Launcher descriptor path.
    pub desktop_file: PathBuf,
    /// Whether the descriptor exists.
    pub desktop_file_present: bool,
    /// Icon the descriptor points at.
    pub current_icon: Option<PathBuf>,
    /// Each configured icon label with whether its file is present.
    pub icons: Vec<(String, bool)>,
}

/// Inspects the installation without changing anything.
#[must_use]
pub fn status(config: &Config) -> InstallStatus {
    let record = InstallRecord::load(&config.record_path());
    InstallStatus {
        install_dir: config.paths.install_dir.clone(),
        installed: is_installed(config),
        version: record.as_ref().and_then(|r| r.version.clone()),
        installed_at: record.as_ref().map(|r| r.installed_at),
        desktop_file: config.paths.desktop_file.clone(),
        desktop_file_present: config.paths.desktop_file.is_file(),
        current_icon: current_icon(&config.paths.desktop_file),
        icons: config
            .icons
            .iter()
            .map(|icon| (icon.label.clone(), config.icon_path(icon).is_file()))
            .collect(),
    }
}
