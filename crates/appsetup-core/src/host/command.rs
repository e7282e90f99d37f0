//! External command execution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, SetupError};

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: OsString,
    /// Arguments.
    pub args: Vec<OsString>,
    /// Working directory, if different from the current one.
    pub cwd: Option<PathBuf>,
    /// Let the child write straight to the terminal instead of capturing output.
    pub passthrough: bool,
}

impl CommandSpec {
    /// Starts a new invocation of `program`.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            passthrough: false,
        }
    }

    /// Builds an invocation from an argv vector (`argv[0]` is the program).
    ///
    /// Returns `None` for an empty vector.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program).args(args))
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Inherit the terminal for stdout/stderr.
    #[must_use]
    pub fn passthrough(mut self, enable: bool) -> Self {
        self.passthrough = enable;
        self
    }

    /// Program name as a lossy string, for messages.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Whole command line as a lossy string, for logs.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output (empty in passthrough mode).
    pub stdout: String,
    /// Standard error (empty in passthrough mode).
    pub stderr: String,
}

/// Runs external programs.
pub trait CommandRunner {
    /// Runs the command to completion. A non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Whether `program` can be found on `PATH`.
    fn is_available(&self, program: &str) -> bool;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("Running: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null());
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        if spec.passthrough {
            let status = command.status().map_err(|e| SetupError::CommandSpawn {
                program: spec.program_name(),
                reason: e.to_string(),
            })?;
            if !status.success() {
                return Err(SetupError::Command {
                    program: spec.program_name(),
                    status: status.to_string(),
                    stderr: String::new(),
                });
            }
            return Ok(CommandOutput::default());
        }

        let output = command.output().map_err(|e| SetupError::CommandSpawn {
            program: spec.program_name(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(SetupError::Command {
                program: spec.program_name(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        tracing::trace!("{} finished: {} bytes of output", spec.program_name(), stdout.len());
        Ok(CommandOutput { stdout, stderr })
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
