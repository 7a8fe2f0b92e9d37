//! The host side of reloading: file-backed sources, project discovery and
//! the extension manager.

mod extensions;
mod source;

use relink_config::RelinkConfig;
use relink_graph::{ModuleName, ReloadError, Reloader};
use thiserror::Error;

pub use extensions::{ExtensionHost, ExtensionReload};
pub use source::{
    DiscoveredModule, FileSourceLoader, ManifestError, PACKAGE_STEM, discover_modules,
};

/// Extension lifecycle errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("extension `{0}` has not been loaded")]
    ExtensionNotLoaded(ModuleName),

    #[error("extension `{0}` is already loaded")]
    ExtensionAlreadyLoaded(ModuleName),

    #[error("extension `{0}` could not be found")]
    ExtensionNotFound(ModuleName),

    #[error("extension `{0}` has no entry point")]
    NoEntryPoint(ModuleName),

    #[error("extension `{name}` raised an error: {source}")]
    ExtensionFailed {
        name: ModuleName,
        #[source]
        source: ReloadError,
    },

    #[error(transparent)]
    Reload(#[from] ReloadError),

    #[error("failed to scan source tree: {0}")]
    Discovery(#[from] walkdir::Error),
}

/// Build an extension host for the project described by `config`.
pub fn open(config: &RelinkConfig) -> ExtensionHost<FileSourceLoader> {
    let loader = FileSourceLoader::from_config(config);
    ExtensionHost::new(Reloader::new(config.boundary(), loader))
}
