//! Seams between the workflows and the outside world.
//!
//! Workflows never spawn processes, open sockets or read the terminal
//! directly; they go through the traits re-exported here. The binary wires in
//! [`SystemRunner`], [`HttpClient`] and a terminal prompter; tests wire in
//! scripted fakes.

pub mod command;
pub mod http;
pub mod prompt;

pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use http::{DownloadProgress, HttpClient, HttpSource, format_bytes};
pub use prompt::Prompter;

/// Progress sink that discards every update.
pub fn no_progress(_: DownloadProgress) {}

/// Everything a workflow needs besides its configuration.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    /// Runs external programs.
    pub runner: &'a dyn CommandRunner,
    /// Talks to the download API.
    pub http: &'a dyn HttpSource,
    /// Asks the user questions.
    pub prompter: &'a dyn Prompter,
    /// Receives download progress.
    pub progress: &'a dyn Fn(DownloadProgress),
}

impl<'a> Host<'a> {
    /// Creates a host without progress reporting.
    pub fn new(
        runner: &'a dyn CommandRunner,
        http: &'a dyn HttpSource,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            runner,
            http,
            prompter,
            progress: &no_progress,
        }
    }

    /// Replaces the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Fn(DownloadProgress)) -> Self {
        self.progress = progress;
        self
    }
}
