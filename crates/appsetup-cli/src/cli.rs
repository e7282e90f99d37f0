//! CLI argument definitions for the installer.

use std::path::PathBuf;

use appsetup_core::Operation;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "appsetup",
    version,
    about = "Install, update and remove an AppImage-distributed desktop application",
    long_about = "Install, update and remove an AppImage-distributed desktop application.\n\n\
                  Without a subcommand an interactive menu is shown.\n\
                  Most operations write to system directories and need root."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (default: the per-user config location, then built-ins).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Skip the startup banner.
    #[arg(long = "no-banner", global = true)]
    pub no_banner: bool,

    /// Answer "yes" to the uninstall confirmation.
    #[arg(long = "yes", short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Clone, Copy, Subcommand)]
pub enum Command {
    /// Download and install the application.
    Install,

    /// Replace the installed application with the latest build.
    Update,

    /// Choose the launcher icon again.
    RestoreIcons,

    /// Remove the application and its launcher.
    Uninstall,

    /// Show what is currently installed.
    Status,
}

impl Command {
    /// The workflow behind this subcommand; `None` for `status`.
    pub fn operation(self) -> Option<Operation> {
        match self {
            Self::Install => Some(Operation::Install),
            Self::Update => Some(Operation::Update),
            Self::RestoreIcons => Some(Operation::RestoreIcons),
            Self::Uninstall => Some(Operation::Uninstall),
            Self::Status => None,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["appsetup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.yes);
    }

    #[test]
    fn test_subcommands_map_to_operations() {
        let cli = Cli::try_parse_from(["appsetup", "restore-icons"]).unwrap();
        assert_eq!(
            cli.command.and_then(Command::operation),
            Some(Operation::RestoreIcons)
        );

        let cli = Cli::try_parse_from(["appsetup", "uninstall", "--yes"]).unwrap();
        assert_eq!(
            cli.command.and_then(Command::operation),
            Some(Operation::Uninstall)
        );
        assert!(cli.yes);

        let cli = Cli::try_parse_from(["appsetup", "status"]).unwrap();
        assert_eq!(cli.command.and_then(Command::operation), None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "appsetup",
            "install",
            "--config",
            "/etc/appsetup.toml",
            "--log-format",
            "json",
            "--no-banner",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/appsetup.toml")));
        assert!(matches!(cli.log_format, LogFormatArg::Json));
        assert!(cli.no_banner);
    }
}
