//! Extraction and deployment of the application tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::DeploySettings;
use crate::error::{Result, SetupError};
use crate::host::{CommandRunner, CommandSpec};

/// Argument that makes an AppImage unpack itself into the working directory.
pub const EXTRACT_FLAG: &str = "--appimage-extract";

const DIR_MODE: u32 = 0o755;
/// Mode of plain data files such as icons and the launcher.
pub(crate) const FILE_MODE: u32 = 0o644;
const EXECUTABLE_MODE: u32 = 0o755;
const SETUID_MODE: u32 = 0o4755;

/// Sets the Unix permission bits of `path`.
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Unpacks the artifact inside `workdir` by running it with [`EXTRACT_FLAG`].
///
/// Returns the extracted tree (`<workdir>/<extract_dir_name>`).
pub fn extract_archive(
    artifact: &Path,
    settings: &DeploySettings,
    runner: &dyn CommandRunner,
    workdir: &Path,
) -> Result<PathBuf> {
    let file_name = artifact
        .file_name()
        .ok_or_else(|| SetupError::Extraction(format!("{} has no file name", artifact.display())))?;
    let staged = workdir.join(file_name);
    if staged != artifact {
        fs::copy(artifact, &staged).map_err(|e| {
            SetupError::Extraction(format!("failed to stage {}: {e}", artifact.display()))
        })?;
    }
    set_mode(&staged, EXECUTABLE_MODE)
        .map_err(|e| SetupError::Extraction(format!("failed to mark executable: {e}")))?;

    let extracted = workdir.join(&settings.extract_dir_name);
    if extracted.exists() {
        fs::remove_dir_all(&extracted)?;
    }

    tracing::info!("Extracting {}", staged.display());
    let spec = CommandSpec::new(&staged).arg(EXTRACT_FLAG).current_dir(workdir);
    runner
        .run(&spec)
        .map_err(|e| SetupError::Extraction(e.to_string()))?;

    if !extracted.is_dir() {
        return Err(SetupError::Extraction(format!(
            "expected {} after extraction",
            extracted.display()
        )));
    }
    tracing::debug!("Extracted tree at {}", extracted.display());
    Ok(extracted)
}

/// Copies of icon files taken before the install tree is replaced.
#[derive(Debug)]
pub struct IconBackup {
    dir: TempDir,
    saved: Vec<String>,
}

impl IconBackup {
    /// Copies every existing `names` entry of `install_dir` to a temporary place.
    ///
    /// Icons that do not exist are skipped.
    pub fn capture(install_dir: &Path, names: &[&str]) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut saved = Vec::new();
        for name in names {
            let source = install_dir.join(name);
            if source.is_file() {
                fs::copy(&source, dir.path().join(name))?;
                saved.push((*name).to_string());
            }
        }
        tracing::debug!("Backed up {} icon(s)", saved.len());
        Ok(Self { dir, saved })
    }

    /// Copies the saved icons back, overwriting whatever is there.
    pub fn restore(&self, install_dir: &Path) -> Result<usize> {
        for name in &self.saved {
            let dest = install_dir.join(name);
            fs::copy(self.dir.path().join(name), &dest)?;
            set_mode(&dest, FILE_MODE)?;
        }
        tracing::debug!("Restored {} icon(s)", self.saved.len());
        Ok(self.saved.len())
    }
}

/// Replaces `install_dir` with the `extracted` tree.
///
/// The old tree is removed first. Falls back to a recursive copy when the
/// tree cannot be renamed (different file systems).
pub fn replace_tree(extracted: &Path, install_dir: &Path) -> Result<()> {
    if install_dir.exists() {
        tracing::info!("Removing previous installation at {}", install_dir.display());
        fs::remove_dir_all(install_dir).map_err(|e| {
            SetupError::Deploy(format!("cannot remove {}: {e}", install_dir.display()))
        })?;
    }
    if let Some(parent) = install_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Err(err) = fs::rename(extracted, install_dir) {
        tracing::debug!("Rename failed ({}), copying instead", err);
        copy_tree(extracted, install_dir).map_err(|e| {
            SetupError::Deploy(format!("cannot copy into {}: {e}", install_dir.display()))
        })?;
        fs::remove_dir_all(extracted)?;
    }
    tracing::info!("Deployed to {}", install_dir.display());
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_tree(&source, &dest)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(&source)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dest)?;
            #[cfg(not(unix))]
            fs::copy(source.parent().unwrap_or(from).join(&target), &dest).map(|_| ())?;
        } else {
            fs::copy(&source, &dest)?;
        }
    }
    Ok(())
}

/// Makes the tree usable by every user.
///
/// Directories get 0755, files become world-readable (and world-executable
/// when the owner may execute them), the main executable gets 0755 and any
/// existing setuid helper gets 04755.
pub fn fix_permissions(
    install_dir: &Path,
    executable: &Path,
    setuid_helpers: &[PathBuf],
) -> Result<()> {
    normalize_tree(install_dir)
        .map_err(|e| SetupError::Deploy(format!("cannot set permissions: {e}")))?;

    if !executable.is_file() {
        return Err(SetupError::Deploy(format!(
            "executable {} is missing",
            executable.display()
        )));
    }
    set_mode(executable, EXECUTABLE_MODE)?;

    for helper in setuid_helpers {
        let path = install_dir.join(helper);
        if path.is_file() {
            set_mode(&path, SETUID_MODE)?;
            tracing::debug!("Set setuid bit on {}", path.display());
        }
    }
    Ok(())
}

fn normalize_tree(dir: &Path) -> io::Result<()> {
    set_mode(dir, DIR_MODE)?;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            normalize_tree(&path)?;
        } else if file_type.is_file() {
            #[cfg(unix)]
            {
                let mode = mode_of(&entry.metadata()?);
                let mut wanted = mode | 0o444;
                if mode & 0o100 != 0 {
                    wanted |= 0o111;
                }
                if wanted != mode {
                    set_mode(&path, wanted)?;
                }
            }
        }
    }
    Ok(())
}

/// Removes the install directory. Returns whether anything was removed.
pub fn remove_installation(install_dir: &Path) -> Result<bool> {
    match fs::remove_dir_all(install_dir) {
        Ok(()) => {
            tracing::info!("Removed {}", install_dir.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SetupError::Deploy(format!(
            "cannot remove {}: {e}",
            install_dir.display()
        ))),
    }
}
