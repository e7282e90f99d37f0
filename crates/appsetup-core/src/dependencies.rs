//! Required external programs.

use crate::config::{PackageSettings, Requirement};
use crate::error::{Result, SetupError};
use crate::host::{CommandRunner, CommandSpec};

/// Requirements whose program is not on `PATH`.
#[must_use]
pub fn missing_requirements<'a>(
    settings: &'a PackageSettings,
    runner: &dyn CommandRunner,
) -> Vec<&'a Requirement> {
    settings
        .requirements
        .iter()
        .filter(|req| !runner.is_available(&req.program))
        .collect()
}

/// Installs the packages providing any missing program.
///
/// Returns the packages that were installed; empty when everything was
/// already present, in which case no command is run.
pub fn ensure_dependencies(
    settings: &PackageSettings,
    runner: &dyn CommandRunner,
) -> Result<Vec<String>> {
    let missing = missing_requirements(settings, runner);
    if missing.is_empty() {
        tracing::debug!("All required programs are present");
        return Ok(Vec::new());
    }

    let mut packages: Vec<String> = Vec::new();
    for req in &missing {
        if !packages.contains(&req.package) {
            packages.push(req.package.clone());
        }
    }
    tracing::info!("Installing missing packages: {}", packages.join(", "));

    if let Some(refresh) = &settings.refresh_command
        && let Some(spec) = CommandSpec::from_argv(refresh)
    {
        runner.run(&spec.passthrough(true))?;
    }

    let install = CommandSpec::from_argv(&settings.install_command)
        .ok_or_else(|| SetupError::Config("packages.install_command is empty".to_string()))?
        .args(&packages)
        .passthrough(true);
    runner.run(&install)?;

    let still_missing = missing_requirements(settings, runner);
    if let Some(req) = still_missing.first() {
        return Err(SetupError::Command {
            program: req.program.clone(),
            status: "not found after install".to_string(),
            stderr: format!("package `{}` did not provide `{}`", req.package, req.program),
        });
    }

    Ok(packages)
}
