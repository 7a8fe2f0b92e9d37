//! Process-wide table of live module units.
//!
//! The registry is owned by a single runtime object (see
//! [`Reloader`](crate::Reloader)) and handed to collaborators by reference.
//! Entries are only ever replaced as whole `Arc`s, so a reader sees either the
//! previous unit or the new one.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;

use super::{ModuleName, ModuleUnit};

#[derive(Debug, Default)]
struct RegistryInner {
    units: HashMap<ModuleName, Arc<ModuleUnit>>,
    next_generation: u64,
}

/// Mapping `ModuleName -> live unit`.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

/// Entries captured by [`ModuleRegistry::snapshot`].
///
/// `None` records that the name was not registered at capture time.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<(ModuleName, Option<Arc<ModuleUnit>>)>,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unit captured for `name`, if it was registered.
    pub fn get(&self, name: &ModuleName) -> Option<&Arc<ModuleUnit>> {
        self.entries
            .iter()
            .find(|(captured, _)| captured == name)
            .and_then(|(_, unit)| unit.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &ModuleName> {
        self.entries.iter().map(|(name, _)| name)
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &ModuleName) -> Option<Arc<ModuleUnit>> {
        self.inner.read().units.get(name).cloned()
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.inner.read().units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().units.is_empty()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<ModuleName> {
        let mut names: Vec<_> = self.inner.read().units.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered names equal to or nested below `package`, sorted.
    pub fn submodules_of(&self, package: &ModuleName) -> Vec<ModuleName> {
        let mut names: Vec<_> = self
            .inner
            .read()
            .units
            .keys()
            .filter(|name| name.is_within(package))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Install a unit, replacing any previous entry with the same name.
    ///
    /// The unit is stamped with a fresh generation number.
    pub fn install(&self, mut unit: ModuleUnit) -> Arc<ModuleUnit> {
        let mut inner = self.inner.write();
        inner.next_generation += 1;
        unit.generation = inner.next_generation;

        let unit = Arc::new(unit);
        inner.units.insert(unit.name.clone(), Arc::clone(&unit));
        unit
    }

    /// Drop an entry.
    pub fn remove(&self, name: &ModuleName) -> Option<Arc<ModuleUnit>> {
        self.inner.write().units.remove(name)
    }

    /// Capture the current entries for `names`.
    pub fn snapshot<'a, I>(&self, names: I) -> RegistrySnapshot
    where
        I: IntoIterator<Item = &'a ModuleName>,
    {
        let inner = self.inner.read();
        let entries = names
            .into_iter()
            .map(|name| (name.clone(), inner.units.get(name).cloned()))
            .collect();
        RegistrySnapshot { entries }
    }

    /// Put every captured entry back exactly as it was.
    pub fn restore(&self, snapshot: &RegistrySnapshot) {
        let mut inner = self.inner.write();
        for (name, unit) in &snapshot.entries {
            match unit {
                Some(unit) => {
                    inner.units.insert(name.clone(), Arc::clone(unit));
                }
                None => {
                    inner.units.remove(name);
                }
            }
        }
    }
}
