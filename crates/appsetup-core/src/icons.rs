//! Launcher icon selection and download.

use std::path::PathBuf;

use crate::config::{Config, IconChoice};
use crate::deploy::{FILE_MODE, set_mode};
use crate::error::{Result, SetupError};
use crate::host::{HttpSource, Prompter, no_progress};

/// Asks the user which configured icon to use.
pub fn choose_icon<'a>(config: &'a Config, prompter: &dyn Prompter) -> Result<&'a IconChoice> {
    let labels: Vec<String> = config.icons.iter().map(|icon| icon.label.clone()).collect();
    let index = prompter.select("Choose an icon for the launcher", &labels)?;
    config
        .icons
        .get(index)
        .ok_or_else(|| SetupError::Prompt(format!("no icon at position {}", index + 1)))
}

fn install_icon(
    choice: &IconChoice,
    config: &Config,
    http: &dyn HttpSource,
) -> Result<PathBuf> {
    let dest = config.icon_path(choice);
    tracing::info!("Downloading icon '{}' to {}", choice.key, dest.display());
    http.download(&choice.url, &dest, &no_progress)?;
    set_mode(&dest, FILE_MODE)?;
    Ok(dest)
}

/// Downloads `choice` into the install tree and returns its path.
///
/// A failed download can be retried. Returns [`SetupError::Aborted`] when the user gives up.
pub fn fetch_icon(
    choice: &IconChoice,
    config: &Config,
    http: &dyn HttpSource,
    prompter: &dyn Prompter,
) -> Result<PathBuf> {
    let choices = ["Retry the download".to_string(), "Abort".to_string()];
    loop {
        match install_icon(choice, config, http) {
            Ok(path) => return Ok(path),
            Err(err) => {
                tracing::warn!("Icon download failed: {}", err);
                prompter.notify(&format!("Icon download failed: {err}"));
                if prompter.select("How do you want to continue?", &choices)? != 0 {
                    return Err(SetupError::Aborted);
                }
            }
        }
    }
}
