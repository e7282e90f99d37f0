//! Terminal front end for the installer.

pub mod banner;
pub mod logging;
pub mod menu;
pub mod progress;
pub mod prompt;
pub mod status;
