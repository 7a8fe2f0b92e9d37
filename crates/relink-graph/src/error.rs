//! Error types for reload preparation and execution.

use super::ModuleName;

/// Boxed error produced by a [`SourceLoader`](crate::SourceLoader) while
/// re-executing a module.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way a reload request can fail.
///
/// All variants are fatal to the current request. Only
/// [`ReloadError::ReloadExecution`] can happen after the registry was touched,
/// and the executor restores the registry before returning it.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// A module could not be located at all.
    #[error("module `{0}` could not be located")]
    UnresolvableModule(ModuleName),

    /// No order satisfies every reference in the graph.
    #[error(
        "inconsistent hierarchy while ordering `{module}` (conflicting candidates: {})",
        format_names(.candidates)
    )]
    InconsistentHierarchy {
        module: ModuleName,
        candidates: Vec<ModuleName>,
    },

    /// Re-executing a module's source failed.
    #[error("failed to reload `{module}`: {source}")]
    ReloadExecution {
        module: ModuleName,
        #[source]
        source: BoxError,
    },
}

impl ReloadError {
    /// Name of the module the error is about.
    pub fn module(&self) -> &ModuleName {
        match self {
            Self::UnresolvableModule(module)
            | Self::InconsistentHierarchy { module, .. }
            | Self::ReloadExecution { module, .. } => module,
        }
    }
}

fn format_names(names: &[ModuleName]) -> String {
    names
        .iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = ReloadError> = std::result::Result<T, E>;
