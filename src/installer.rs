//! Installation of the external programs the pipeline depends on.

use tracing::{debug, info};

use crate::cmd_abstraction::{args_to_strings, CommandExecutor};
use crate::config::Config;
use crate::error::BlockError;
use crate::validation::TargetAddress;

/// Check whether `name` resolves to an executable on PATH
pub async fn is_available<E>(executor: &E, config: &Config, name: &str) -> bool
where
    E: CommandExecutor + ?Sized,
{
    let args = args_to_strings(&[name]);
    match executor
        .execute(&config.tools.which, &args, config.timeouts.command)
        .await
    {
        Ok(output) => output.success,
        Err(e) => {
            debug!("{} lookup failed: {:#}", name, e);
            false
        }
    }
}

/// Make sure `name` is installed, installing the package of the same name
/// if it is missing.
///
/// # Errors
/// Returns [`BlockError::Dependency`] if the package manager cannot be run,
/// exits non-zero, or exceeds the install timeout.
pub async fn ensure_dependency<E>(
    executor: &E,
    config: &Config,
    name: &str,
    target: &TargetAddress,
) -> Result<(), BlockError>
where
    E: CommandExecutor + ?Sized,
{
    let ip = target.to_string();

    if is_available(executor, config, name).await {
        debug!(ip = %ip, "{} is already installed", name);
        return Ok(());
    }

    info!(ip = %ip, "Installing {}...", name);

    let mut args = config.tools.install_args.clone();
    args.push(name.to_string());

    let dependency_error = |reason: String| BlockError::Dependency {
        package: name.to_string(),
        ip: ip.clone(),
        reason,
    };

    let output = executor
        .execute(&config.tools.package_manager, &args, config.timeouts.install)
        .await
        .map_err(|e| dependency_error(format!("{:#}", e)))?;

    if !output.success {
        return Err(dependency_error(output.failure_reason()));
    }

    info!(ip = %ip, "{} installed successfully.", name);
    Ok(())
}
