//! Terminal prompts.

use appsetup_core::error::{Result, SetupError};
use appsetup_core::host::Prompter;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

fn prompt_error(err: dialoguer::Error) -> SetupError {
    SetupError::Prompt(err.to_string())
}

/// [`Prompter`] that asks on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .map_err(prompt_error)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// Wraps a prompter and answers every confirmation with "yes".
pub struct AssumeYes<'a> {
    inner: &'a dyn Prompter,
}

impl<'a> AssumeYes<'a> {
    pub fn new(inner: &'a dyn Prompter) -> Self {
        Self { inner }
    }
}

impl Prompter for AssumeYes<'_> {
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        self.inner.select(prompt, items)
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        tracing::info!("Assuming yes: {}", prompt);
        Ok(true)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.inner.input(prompt)
    }

    fn notify(&self, message: &str) {
        self.inner.notify(message);
    }
}
