//! Miette diagnostic conversion for CLI errors.

use miette::Report;
use relink_graph::ReloadError;

use crate::error::CliError;
use crate::host::HostError;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!(
            "Configuration error: {}\n\nHint: Check relink.toml or pass --config <path>",
            e
        ),
        CliError::Host(e) => host_error_to_miette(e),
        CliError::Reload(e) => reload_error_to_miette(e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert HostError to miette Report
pub fn host_error_to_miette(err: HostError) -> Report {
    match err {
        HostError::ExtensionNotLoaded(name) => miette::miette!(
            "Extension not loaded: {}\n\nHint: Add it to `extensions` in relink.toml",
            name
        ),
        HostError::NoEntryPoint(name) => miette::miette!(
            "Module {} has no entry point\n\nHint: Set `entry_point = true` in its manifest",
            name
        ),
        HostError::ExtensionFailed { name, source } => miette::miette!(
            "Extension {} failed to load\n\n{}\n\nHint: The previous version is still loaded",
            name,
            source
        ),
        HostError::Reload(e) => reload_error_to_miette(e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert ReloadError to miette Report
pub fn reload_error_to_miette(err: ReloadError) -> Report {
    match err {
        ReloadError::UnresolvableModule(name) => miette::miette!(
            "Module could not be located: {}\n\nHint: List third-party modules under `external` in relink.toml",
            name
        ),
        ReloadError::InconsistentHierarchy { .. } => miette::miette!(
            "{}\n\nHint: Break the reference cycle between these modules",
            err
        ),
        ReloadError::ReloadExecution { .. } => miette::miette!(
            "{}\n\nHint: Nothing was changed; fix the module and reload again",
            err
        ),
        _ => miette::miette!("{}", err),
    }
}
