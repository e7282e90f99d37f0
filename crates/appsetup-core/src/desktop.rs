//! Launcher descriptor (freedesktop `.desktop` file).

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::deploy::{FILE_MODE, set_mode};
use crate::error::{Result, SetupError};
use crate::host::{CommandRunner, CommandSpec};

/// Program that refreshes the desktop menu cache.
pub const DESKTOP_DATABASE_TOOL: &str = "update-desktop-database";

/// Contents of a launcher descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    /// Menu name.
    pub name: String,
    /// Tooltip.
    pub comment: String,
    /// Command line.
    pub exec: String,
    /// Icon path.
    pub icon: PathBuf,
    /// Menu categories.
    pub categories: Vec<String>,
    /// Window class used to group windows.
    pub startup_wm_class: Option<String>,
    /// Handled MIME types.
    pub mime_types: Vec<String>,
}

impl DesktopEntry {
    /// Builds the entry for the configured application using `icon`.
    #[must_use]
    pub fn from_config(config: &Config, icon: &Path) -> Self {
        let executable = config.executable_path();
        let mut exec = quote_exec(&executable.to_string_lossy());
        if !config.app.exec_args.trim().is_empty() {
            exec.push(' ');
            exec.push_str(config.app.exec_args.trim());
        }

        Self {
            name: config.app.display_name.clone(),
            comment: config.app.comment.clone(),
            exec,
            icon: icon.to_path_buf(),
            categories: config.app.categories.clone(),
            startup_wm_class: config.app.startup_wm_class.clone(),
            mime_types: config.app.mime_types.clone(),
        }
    }

    /// Renders the descriptor file contents.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("[Desktop Entry]\n");
        let _ = writeln!(out, "Name={}", self.name);
        if !self.comment.is_empty() {
            let _ = writeln!(out, "Comment={}", self.comment);
        }
        let _ = writeln!(out, "Exec={}", self.exec);
        let _ = writeln!(out, "Icon={}", self.icon.display());
        out.push_str("Type=Application\n");
        out.push_str("Terminal=false\n");
        if !self.categories.is_empty() {
            let _ = writeln!(out, "Categories={};", self.categories.join(";"));
        }
        if let Some(class) = &self.startup_wm_class {
            let _ = writeln!(out, "StartupWMClass={class}");
        }
        if !self.mime_types.is_empty() {
            let _ = writeln!(out, "MimeType={};", self.mime_types.join(";"));
        }
        out
    }
}

/// Quotes an Exec program path when it contains reserved characters.
fn quote_exec(program: &str) -> String {
    let reserved = |c: char| c.is_whitespace() || "\"'\\><~|&;$*?#()`".contains(c);
    if program.contains(reserved) {
        let escaped = program
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('`', "\\`")
            .replace('$', "\\$");
        format!("\"{escaped}\"")
    } else {
        program.to_string()
    }
}

/// Writes the descriptor atomically and sets mode 0644.
pub fn write_desktop_entry(entry: &DesktopEntry, path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| SetupError::DesktopEntry(format!("{} has no parent", path.display())))?;
    let to_error =
        |e: io::Error| SetupError::DesktopEntry(format!("cannot write {}: {e}", path.display()));

    fs::create_dir_all(parent).map_err(to_error)?;
    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(to_error)?;
    file.write_all(entry.render().as_bytes()).map_err(to_error)?;
    file.flush().map_err(to_error)?;
    file.persist(path).map_err(|e| to_error(e.error))?;
    set_mode(path, FILE_MODE).map_err(to_error)?;

    tracing::info!("Wrote launcher {}", path.display());
    Ok(())
}

/// Removes the descriptor. Returns whether a file was removed.
pub fn remove_desktop_entry(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("Removed launcher {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SetupError::DesktopEntry(format!(
            "cannot remove {}: {e}",
            path.display()
        ))),
    }
}

/// Reads the `Icon=` value of an existing descriptor.
#[must_use]
pub fn current_icon(path: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("Icon="))
        .map(|value| PathBuf::from(value.trim()))
}

/// Refreshes the desktop menu cache for `dir`. Failures only log a warning.
pub fn refresh_desktop_database(runner: &dyn CommandRunner, dir: &Path) {
    if !runner.is_available(DESKTOP_DATABASE_TOOL) {
        tracing::debug!("{} not found, skipping", DESKTOP_DATABASE_TOOL);
        return;
    }
    let spec = CommandSpec::new(DESKTOP_DATABASE_TOOL).arg(dir);
    if let Err(err) = runner.run(&spec) {
        tracing::warn!("Could not refresh desktop database: {}", err);
    }
}
