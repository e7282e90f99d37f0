//! Interactive menu and dispatch.
//!
//! The host is checked before anything else happens. In menu mode an
//! install request on an existing installation shows the menu again; a
//! direct subcommand runs exactly once.

use appsetup_core::error::{Result, SetupError};
use appsetup_core::host::{Host, Prompter};
use appsetup_core::{Config, Operation, Outcome, check_environment, workflow};

use crate::prompt::AssumeYes;

/// How the session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ask which operation to run.
    Menu,
    /// Run this operation without asking.
    Direct(Operation),
}

/// Session options that come from the command line.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub mode: Mode,
    /// Answer the uninstall confirmation with "yes".
    pub assume_yes: bool,
}

/// What the session ran and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub operation: Operation,
    pub outcome: Outcome,
}

impl SessionResult {
    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        match (&self.outcome, self.operation) {
            (Outcome::Completed | Outcome::Declined | Outcome::UpToDate, _)
            | (Outcome::NotInstalled, Operation::Uninstall) => 0,
            (Outcome::NotInstalled | Outcome::AlreadyInstalled, _) => 1,
        }
    }

    /// Line printed when the session ends.
    pub fn message(&self, config: &Config) -> String {
        let app = &config.app.display_name;
        match (&self.outcome, self.operation) {
            (Outcome::Completed, op) => format!("{} finished.", op.label()),
            (Outcome::Declined, _) => "Nothing was changed.".to_string(),
            (Outcome::UpToDate, _) => format!("{app} is already up to date."),
            (Outcome::AlreadyInstalled, _) => format!(
                "{app} is already installed at {}.",
                config.paths.install_dir.display()
            ),
            (Outcome::NotInstalled, Operation::Uninstall) => {
                format!("{app} is not installed, nothing to remove.")
            }
            (Outcome::NotInstalled, _) => format!("{app} is not installed. Install it first."),
        }
    }
}

/// Runs one session: environment check, then the chosen operation.
pub fn run_session(
    config: &Config,
    host: &Host<'_>,
    options: SessionOptions,
) -> Result<SessionResult> {
    check_environment(&config.environment)?;

    match options.mode {
        Mode::Direct(operation) => {
            let outcome = dispatch(operation, config, host, options.assume_yes)?;
            Ok(SessionResult { operation, outcome })
        }
        Mode::Menu => loop {
            let operation = ask_operation(host.prompter)?;
            let outcome = dispatch(operation, config, host, options.assume_yes)?;
            if outcome == Outcome::AlreadyInstalled {
                let result = SessionResult { operation, outcome };
                host.prompter.notify(&result.message(config));
                continue;
            }
            return Ok(SessionResult { operation, outcome });
        },
    }
}

fn dispatch(
    operation: Operation,
    config: &Config,
    host: &Host<'_>,
    assume_yes: bool,
) -> Result<Outcome> {
    if operation == Operation::Uninstall && assume_yes {
        let prompter = AssumeYes::new(host.prompter);
        let host = Host {
            prompter: &prompter,
            ..*host
        };
        return workflow::run(operation, config, &host);
    }
    workflow::run(operation, config, host)
}

/// Shows the numbered menu until a valid choice is entered.
///
/// An empty answer ends the session.
pub fn ask_operation(prompter: &dyn Prompter) -> Result<Operation> {
    let mut menu = String::from("What do you want to do?");
    for (index, operation) in Operation::ALL.iter().enumerate() {
        menu.push_str(&format!("\n  {}) {}", index + 1, operation.label()));
    }
    prompter.notify(&menu);

    loop {
        let answer = prompter.input("Enter a number (1-4)")?;
        if answer.trim().is_empty() {
            return Err(SetupError::Aborted);
        }
        match Operation::from_menu_choice(&answer) {
            Some(operation) => return Ok(operation),
            None => prompter.notify(&format!("'{}' is not a valid choice.", answer.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(operation: Operation, outcome: Outcome) -> SessionResult {
        SessionResult { operation, outcome }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(result(Operation::Install, Outcome::Completed).exit_code(), 0);
        assert_eq!(result(Operation::Uninstall, Outcome::Declined).exit_code(), 0);
        assert_eq!(result(Operation::Update, Outcome::UpToDate).exit_code(), 0);
        assert_eq!(result(Operation::Uninstall, Outcome::NotInstalled).exit_code(), 0);
        assert_eq!(result(Operation::Update, Outcome::NotInstalled).exit_code(), 1);
        assert_eq!(result(Operation::RestoreIcons, Outcome::NotInstalled).exit_code(), 1);
        assert_eq!(result(Operation::Install, Outcome::AlreadyInstalled).exit_code(), 1);
    }

    #[test]
    fn test_messages() {
        let config = Config::default();
        assert_eq!(
            result(Operation::Update, Outcome::NotInstalled).message(&config),
            "Cursor is not installed. Install it first."
        );
        assert_eq!(
            result(Operation::Install, Outcome::AlreadyInstalled).message(&config),
            "Cursor is already installed at /opt/cursor."
        );
        assert_eq!(
            result(Operation::RestoreIcons, Outcome::Completed).message(&config),
            "Restore icons finished."
        );
    }
}
