//! Shared utilities for command implementations.
//!
//! - Working directory resolution
//! - Configuration loading and validation
//! - Startup extension loading

use std::path::{Path, PathBuf};

use relink_config::{ConfigDiscovery, RelinkConfig};
use relink_graph::{ModuleName, SourceLoader};
use tracing::{debug, warn};

use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};
use crate::host::{ExtensionHost, HostError, discover_modules};

/// Resolve a path relative to a working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// The project directory: `--cwd` when given, otherwise the process cwd.
///
/// # Errors
///
/// Returns `CliError::DirectoryNotFound` if `--cwd` is not a directory.
pub fn project_dir(globals: &GlobalArgs) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    match &globals.cwd {
        Some(dir) => {
            let dir = resolve_path(dir, &current);
            if !dir.is_dir() {
                return Err(CliError::DirectoryNotFound(dir));
            }
            Ok(dir)
        }
        None => Ok(current),
    }
}

/// Load and validate the configuration for `dir`.
///
/// An explicit `--config` must exist; otherwise `relink.toml` in `dir` is used
/// when present and defaults apply when it is not.
pub fn load_config(globals: &GlobalArgs, dir: &Path) -> Result<RelinkConfig> {
    let discovery = ConfigDiscovery::new(dir);
    let config = match &globals.config {
        Some(path) => discovery.load_from(&resolve_path(path, dir))?,
        None => discovery.load_or_default()?,
    };
    config.validate()?;
    debug!(root = %config.root.display(), "configuration loaded");
    Ok(config)
}

/// Extensions to load at startup: the configured list, or every extension
/// candidate under the root when the list is empty.
pub fn startup_extensions(config: &RelinkConfig) -> Result<Vec<ModuleName>> {
    if !config.extensions.is_empty() {
        return Ok(config.extensions.clone());
    }

    let modules = discover_modules(&config.root, &config.module_extension)?;
    Ok(modules
        .into_iter()
        .filter(|module| module.is_extension_candidate())
        .map(|module| module.name)
        .collect())
}

/// Load every extension in `names`, returning the ones that failed.
///
/// A failing extension does not stop the others from loading.
pub fn load_extensions<L: SourceLoader>(
    host: &ExtensionHost<L>,
    names: &[ModuleName],
) -> Vec<(ModuleName, HostError)> {
    let mut failures = Vec::new();
    for name in names {
        if host.is_loaded(name) {
            continue;
        }
        if let Err(err) = host.load_extension(name) {
            warn!(extension = %name, error = %err, "failed to load extension");
            failures.push((name.clone(), err));
        }
    }
    failures
}
