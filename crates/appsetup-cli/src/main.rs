//! appsetup CLI.

use std::io::{self, IsTerminal};

use anyhow::Context;
use appsetup_cli::banner::render_banner;
use appsetup_cli::logging::{LogConfig, LogFormat, init_logging};
use appsetup_cli::menu::{Mode, SessionOptions, run_session};
use appsetup_cli::progress::DownloadBar;
use appsetup_cli::prompt::TerminalPrompter;
use appsetup_cli::status::print_status;
use appsetup_core::host::{DownloadProgress, Host, HttpClient, SystemRunner};
use appsetup_core::{Config, SetupError, status};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => report_error(&error),
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config =
        Config::load_or_default(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate()?;

    if matches!(cli.command, Some(Command::Status)) {
        print_status(&status(&config));
        return Ok(0);
    }

    let runner = SystemRunner;
    if !cli.no_banner {
        let title = format!("{} Setup", config.app.display_name);
        println!("{}", render_banner(&title, &runner));
    }

    let http = HttpClient::new(&config.download)?;
    let prompter = TerminalPrompter::new();
    let bar = if io::stderr().is_terminal() {
        DownloadBar::new()
    } else {
        DownloadBar::hidden()
    };
    let on_progress = |progress: DownloadProgress| bar.update(progress);
    let host = Host::new(&runner, &http, &prompter).with_progress(&on_progress);

    let mode = match cli.command.and_then(Command::operation) {
        Some(operation) => Mode::Direct(operation),
        None => Mode::Menu,
    };
    let options = SessionOptions {
        mode,
        assume_yes: cli.yes,
    };
    let result = run_session(&config, &host, options);
    bar.finish();

    let result = result?;
    println!("{}", result.message(&config));
    Ok(result.exit_code())
}

/// Print an error for the user and return the exit code.
fn report_error(error: &anyhow::Error) -> i32 {
    tracing::debug!("{error:?}");
    match error.downcast_ref::<SetupError>() {
        Some(SetupError::Aborted) => {
            eprintln!("{}", SetupError::Aborted.user_message());
            SetupError::Aborted.exit_code()
        }
        Some(setup_error) => {
            eprintln!("error: {}", setup_error.user_message());
            eprintln!("  {error:#}");
            setup_error.exit_code()
        }
        None => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };

    let mut config = LogConfig::default()
        .with_level(level_filter)
        .with_format(format)
        .with_ansi(with_ansi)
        .with_timestamps(cli.log_file.is_some())
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config
}
