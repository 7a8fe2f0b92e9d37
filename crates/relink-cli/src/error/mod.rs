//! Error handling for the relink CLI.
//!
//! Commands return [`CliError`], which wraps the errors of the library crates
//! and is turned into a `miette` report in `main`.

mod miette;

use std::path::PathBuf;

use relink_graph::ReloadError;
use thiserror::Error;

use crate::host::HostError;

pub use self::miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] relink_config::ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Reload(#[from] ReloadError),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} extensions failed to load")]
    CheckFailed { failed: usize, total: usize },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use relink_graph::ModuleName;

    #[test]
    fn host_errors_are_transparent() {
        let name = ModuleName::new("cogs.genshin.gapi").unwrap();
        let err = CliError::from(HostError::ExtensionNotLoaded(name));
        assert_eq!(err.to_string(), "extension `cogs.genshin.gapi` has not been loaded");
    }

    #[test]
    fn check_failure_counts_extensions() {
        let err = CliError::CheckFailed { failed: 2, total: 9 };
        assert_eq!(err.to_string(), "2 of 9 extensions failed to load");
    }
}
