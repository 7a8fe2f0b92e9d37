//! Extension lifecycle on top of the reloader.
//!
//! An extension is a module exposing an entry point. Loading one pulls in its
//! dependencies, unloading drops it together with its submodules, and
//! reloading optionally refreshes its dependencies first and then swaps the
//! extension itself, putting the old entries back if that fails.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use relink_graph::{ModuleName, ReloadError, ReloadReport, Reloader, SourceLoader};
use serde::Serialize;
use tracing::{info, warn};

use super::HostError;

/// Outcome of [`ExtensionHost::reload_extension`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionReload {
    pub name: ModuleName,
    /// Dependencies refreshed before the extension, when requested.
    pub children: Option<ReloadReport>,
    /// Generation of the freshly installed extension unit.
    pub generation: u64,
    pub duration: Duration,
}

/// Loads, unloads and reloads extensions.
///
/// Every operation holds the host lock for its whole duration, so at most one
/// reload touches the registry at a time.
#[derive(Debug)]
pub struct ExtensionHost<L> {
    reloader: Reloader<L>,
    extensions: Mutex<BTreeSet<ModuleName>>,
}

impl<L: SourceLoader> ExtensionHost<L> {
    pub fn new(reloader: Reloader<L>) -> Self {
        Self {
            reloader,
            extensions: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn reloader(&self) -> &Reloader<L> {
        &self.reloader
    }

    /// Loaded extensions in name order.
    pub fn extensions(&self) -> Vec<ModuleName> {
        self.extensions.lock().iter().cloned().collect()
    }

    pub fn is_loaded(&self, name: &ModuleName) -> bool {
        self.extensions.lock().contains(name)
    }

    pub fn load_extension(&self, name: &ModuleName) -> Result<(), HostError> {
        let mut extensions = self.extensions.lock();
        if extensions.contains(name) {
            return Err(HostError::ExtensionAlreadyLoaded(name.clone()));
        }

        self.install(name)?;
        extensions.insert(name.clone());
        info!(extension = %name, "loaded extension");
        Ok(())
    }

    pub fn unload_extension(&self, name: &ModuleName) -> Result<(), HostError> {
        let mut extensions = self.extensions.lock();
        if !extensions.remove(name) {
            return Err(HostError::ExtensionNotLoaded(name.clone()));
        }

        let registry = self.reloader.registry();
        for module in registry.submodules_of(name) {
            registry.remove(&module);
        }
        info!(extension = %name, "unloaded extension");
        Ok(())
    }

    /// Reload a loaded extension.
    ///
    /// With `reload_submodules` the extension's dependencies are re-executed
    /// first as one transaction. The extension is then unloaded and loaded
    /// again; if that fails its previous entries are restored. Refreshed
    /// dependencies stay refreshed either way.
    pub fn reload_extension(
        &self,
        name: &ModuleName,
        reload_submodules: bool,
    ) -> Result<ExtensionReload, HostError> {
        let extensions = self.extensions.lock();
        if !extensions.contains(name) {
            return Err(HostError::ExtensionNotLoaded(name.clone()));
        }
        let started = Instant::now();

        let children = if reload_submodules {
            Some(self.reloader.reload_children(name)?)
        } else {
            None
        };

        let registry = self.reloader.registry();
        let previous = registry.submodules_of(name);
        let snapshot = registry.snapshot(&previous);
        for module in &previous {
            registry.remove(module);
        }

        let generation = match self.install(name) {
            Ok(generation) => generation,
            Err(err) => {
                registry.restore(&snapshot);
                warn!(extension = %name, error = %err, "extension reload failed, previous version restored");
                return Err(err);
            }
        };
        drop(extensions);

        let reload = ExtensionReload {
            name: name.clone(),
            children,
            generation,
            duration: started.elapsed(),
        };
        info!(
            extension = %name,
            generation,
            duration_ms = reload.duration.as_millis() as u64,
            "reloaded extension"
        );
        Ok(reload)
    }

    /// Load `name` and its dependencies and check it is an extension.
    /// Leaves the registry as it was on failure.
    fn install(&self, name: &ModuleName) -> Result<u64, HostError> {
        let registry = self.reloader.registry();
        let installed = self.reloader.load(name).map_err(|err| match err {
            ReloadError::UnresolvableModule(module) if module == *name => {
                HostError::ExtensionNotFound(module)
            }
            source => HostError::ExtensionFailed {
                name: name.clone(),
                source,
            },
        })?;

        match registry.get(name) {
            Some(unit) if unit.entry_point => Ok(unit.generation),
            _ => {
                for module in &installed {
                    registry.remove(module);
                }
                Err(HostError::NoEntryPoint(name.clone()))
            }
        }
    }
}
