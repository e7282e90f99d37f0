//! Interactive questions.

use crate::error::Result;

/// Asks the user questions and shows them short notices.
pub trait Prompter {
    /// Lets the user pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Asks a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Reads one line of free text.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Shows a message that needs no answer.
    fn notify(&self, message: &str);
}
