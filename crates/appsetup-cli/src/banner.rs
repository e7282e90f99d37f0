//! Startup banner.

use appsetup_core::host::{CommandRunner, CommandSpec};

const FIGLET: &str = "figlet";

/// Renders `title` with figlet when it is installed, as plain text otherwise.
pub fn render_banner(title: &str, runner: &dyn CommandRunner) -> String {
    if runner.is_available(FIGLET) {
        match runner.run(&CommandSpec::new(FIGLET).arg(title)) {
            Ok(output) if !output.stdout.trim().is_empty() => return output.stdout,
            Ok(_) => {}
            Err(err) => tracing::debug!("figlet failed: {}", err),
        }
    }
    plain_banner(title)
}

fn plain_banner(title: &str) -> String {
    let rule = "=".repeat(title.chars().count() + 8);
    format!("{rule}\n    {title}\n{rule}\n")
}
