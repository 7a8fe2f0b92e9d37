//! Reload command implementation.
//!
//! Starts the host the way a bot would at startup, then reloads one
//! extension through it.

use crate::cli::{GlobalArgs, ReloadArgs};
use crate::commands::utils;
use crate::error::Result;
use crate::{host, ui};

/// Execute the reload command.
///
/// # Steps
///
/// 1. Load and validate the configuration
/// 2. Load the startup extensions (failures are reported, not fatal)
/// 3. Load the target if it is not a startup extension
/// 4. Reload the target, its dependencies first unless `--no-submodules`
pub fn execute(args: ReloadArgs, globals: &GlobalArgs) -> Result<()> {
    let dir = utils::project_dir(globals)?;
    let config = utils::load_config(globals, &dir)?;
    let host = host::open(&config);

    let startup = utils::startup_extensions(&config)?;
    for (name, err) in utils::load_extensions(&host, &startup) {
        ui::warning(&format!("Failed to load {name}: {err}"));
    }
    if !host.is_loaded(&args.extension) {
        host.load_extension(&args.extension)?;
    }

    let reload_submodules = config.reload_submodules && !args.no_submodules;
    let reload = host.reload_extension(&args.extension, reload_submodules)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reload)?);
    } else {
        ui::print_reload(&reload);
        ui::success(&format!(
            "Reloaded {} in {}",
            reload.name,
            ui::format_duration(reload.duration)
        ));
    }
    Ok(())
}
