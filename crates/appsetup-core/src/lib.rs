//! Installer for a desktop application distributed as an AppImage.
//!
//! This crate holds everything except the terminal front end: configuration,
//! the host checks, dependency installation, artifact download, deployment,
//! the launcher descriptor and the four workflows built from them.
//!
//! # Overview
//!
//! - [`workflow::install`] - deploy the application, pick an icon, write the launcher
//! - [`workflow::update`] - replace the deployed tree, keeping downloaded icons
//! - [`workflow::restore_icons`] - pick an icon again and rewrite the launcher
//! - [`workflow::uninstall`] - remove the tree and the launcher after confirmation
//!
//! Workflows talk to the outside world only through the [`host`] traits, so
//! the binary can plug in real processes, HTTP and a terminal while tests
//! plug in scripted fakes.
//!
//! # Example
//!
//! ```no_run
//! use appsetup_core::host::{HttpClient, Host, Prompter, SystemRunner};
//! use appsetup_core::{Config, Operation, check_environment, run};
//!
//! fn install(prompter: &dyn Prompter) -> appsetup_core::Result<()> {
//!     let config = Config::load_or_default(None)?;
//!     config.validate()?;
//!     check_environment(&config.environment)?;
//!
//!     let runner = SystemRunner;
//!     let http = HttpClient::new(&config.download)?;
//!     let host = Host::new(&runner, &http, prompter);
//!     let outcome = run(Operation::Install, &config, &host)?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dependencies;
pub mod deploy;
pub mod desktop;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod host;
pub mod icons;
pub mod record;
pub mod workflow;

pub use config::{Config, IconChoice};
pub use environment::{OsRelease, check_environment};
pub use error::{Result, SetupError};
pub use record::InstallRecord;
pub use workflow::{InstallStatus, Operation, Outcome, is_installed, run, status};
