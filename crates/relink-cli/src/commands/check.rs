//! Check command implementation.
//!
//! Validates the configuration and loads every extension once, counting the
//! ones that fail.

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::{host, ui};

/// Execute the check command.
///
/// # Errors
///
/// Returns `CliError::CheckFailed` when any extension fails to load.
pub fn execute(args: CheckArgs, globals: &GlobalArgs) -> Result<()> {
    ui::info("Checking configuration...");
    let dir = utils::project_dir(globals)?;
    let config = utils::load_config(globals, &dir)?;
    ui::success("Configuration is valid");

    if args.config_only {
        return Ok(());
    }

    let extensions = utils::startup_extensions(&config)?;
    if extensions.is_empty() {
        ui::warning(&format!("No extensions found under {}", config.root.display()));
        return Ok(());
    }

    ui::info(&format!("Loading {} extensions...", extensions.len()));
    let host = host::open(&config);
    let failures = utils::load_extensions(&host, &extensions);

    for name in &extensions {
        match failures.iter().find(|(failed, _)| failed == name) {
            Some((_, err)) => ui::error(&format!("  {name}: {err}")),
            None => ui::success(&format!("  {name}")),
        }
    }

    if failures.is_empty() {
        ui::success(&format!("All {} extensions loaded", extensions.len()));
        Ok(())
    } else {
        Err(CliError::CheckFailed {
            failed: failures.len(),
            total: extensions.len(),
        })
    }
}
