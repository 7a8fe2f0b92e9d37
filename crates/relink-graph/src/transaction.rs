//! All-or-nothing re-execution of a linear reload order.
//!
//! ```text
//! Idle -> Snapshotting -> Executing -> Committed
//!              |               |
//!              +---------------+----> RolledBack
//! ```
//!
//! The transaction assumes it is the only writer of the registry while it
//! runs. Hosts serialize reload requests.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{BoxError, LinearOrder, ModuleName, ModuleRegistry, ModuleUnit, ReloadError, Result};

/// A located, not yet executed module source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub name: ModuleName,
    /// Source file, if the module has one.
    pub path: Option<PathBuf>,
    pub is_package: bool,
}

impl ModuleSource {
    pub fn new(name: ModuleName, path: Option<PathBuf>) -> Self {
        Self {
            name,
            path,
            is_package: false,
        }
    }

    pub fn package(mut self, is_package: bool) -> Self {
        self.is_package = is_package;
        self
    }
}

/// Host hook that finds and re-executes module sources.
pub trait SourceLoader {
    /// Find the source for `name`, or `None` if it cannot be located.
    fn locate(&self, name: &ModuleName) -> Option<ModuleSource>;

    /// Execute `source` from scratch into a fresh unit.
    ///
    /// Units installed earlier in the same transaction are visible through
    /// `registry`.
    fn execute(
        &self,
        source: &ModuleSource,
        registry: &ModuleRegistry,
    ) -> std::result::Result<ModuleUnit, BoxError>;
}

impl<L: SourceLoader + ?Sized> SourceLoader for &L {
    fn locate(&self, name: &ModuleName) -> Option<ModuleSource> {
        (**self).locate(name)
    }

    fn execute(
        &self,
        source: &ModuleSource,
        registry: &ModuleRegistry,
    ) -> std::result::Result<ModuleUnit, BoxError> {
        (**self).execute(source, registry)
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for Arc<L> {
    fn locate(&self, name: &ModuleName) -> Option<ModuleSource> {
        (**self).locate(name)
    }

    fn execute(
        &self,
        source: &ModuleSource,
        registry: &ModuleRegistry,
    ) -> std::result::Result<ModuleUnit, BoxError> {
        (**self).execute(source, registry)
    }
}

/// Lifecycle of a [`ReloadTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    Idle,
    Snapshotting,
    Executing,
    Committed,
    RolledBack,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Idle => "idle",
            Self::Snapshotting => "snapshotting",
            Self::Executing => "executing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        };
        f.write_str(state)
    }
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    pub root: ModuleName,
    /// Reloaded modules with their new generation, in execution order.
    pub reloaded: Vec<(ModuleName, u64)>,
    pub duration: Duration,
}

impl ReloadReport {
    pub fn reloaded_names(&self) -> impl Iterator<Item = &ModuleName> {
        self.reloaded.iter().map(|(name, _)| name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("loader produced `{produced}` while reloading `{expected}`")]
pub(crate) struct MismatchedUnit {
    pub(crate) expected: ModuleName,
    pub(crate) produced: ModuleName,
}

/// One reload request against a registry.
pub struct ReloadTransaction<'a, L: ?Sized> {
    registry: &'a ModuleRegistry,
    loader: &'a L,
    state: TransactionState,
}

impl<'a, L: SourceLoader + ?Sized> ReloadTransaction<'a, L> {
    pub fn new(registry: &'a ModuleRegistry, loader: &'a L) -> Self {
        Self {
            registry,
            loader,
            state: TransactionState::Idle,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Re-execute every dependency of `order` (the root excluded), in order.
    ///
    /// On failure the registry entries of every module in `order` are put back
    /// exactly as they were and the original error is returned.
    pub fn execute(&mut self, order: &LinearOrder) -> Result<ReloadReport> {
        let started = Instant::now();

        self.state = TransactionState::Snapshotting;
        let snapshot = self.registry.snapshot(order.iter());
        let mut sources = Vec::with_capacity(order.dependencies().len());
        for name in order.dependencies() {
            match self.loader.locate(name) {
                Some(source) => sources.push(source),
                None => {
                    self.state = TransactionState::RolledBack;
                    return Err(ReloadError::UnresolvableModule(name.clone()));
                }
            }
        }

        self.state = TransactionState::Executing;
        let mut reloaded = Vec::with_capacity(sources.len());
        for source in &sources {
            let unit = match self.loader.execute(source, self.registry) {
                Ok(unit) if unit.name == source.name => unit,
                Ok(unit) => {
                    let error = MismatchedUnit {
                        expected: source.name.clone(),
                        produced: unit.name,
                    };
                    return Err(self.roll_back(&snapshot, &source.name, Box::new(error)));
                }
                Err(error) => return Err(self.roll_back(&snapshot, &source.name, error)),
            };

            let installed = self.registry.install(unit);
            debug!(module = %installed.name, generation = installed.generation, "reloaded module");
            reloaded.push((installed.name.clone(), installed.generation));
        }

        self.state = TransactionState::Committed;
        let report = ReloadReport {
            root: order.root().clone(),
            reloaded,
            duration: started.elapsed(),
        };
        info!(
            root = %report.root,
            modules = report.reloaded.len(),
            duration_ms = report.duration.as_millis() as u64,
            "reload committed"
        );
        Ok(report)
    }

    fn roll_back(
        &mut self,
        snapshot: &super::RegistrySnapshot,
        module: &ModuleName,
        source: BoxError,
    ) -> ReloadError {
        self.registry.restore(snapshot);
        self.state = TransactionState::RolledBack;
        warn!(module = %module, error = %source, restored = snapshot.len(), "reload rolled back");
        ReloadError::ReloadExecution {
            module: module.clone(),
            source,
        }
    }
}
