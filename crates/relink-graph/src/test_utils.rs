//! Test utilities for relink-graph.
//!
//! [`MemoryLoader`] keeps module sources in memory so tests can describe a
//! host source tree without touching the filesystem, edit it between reloads
//! and make individual modules fail on their next execution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::{
    Binding, BoxError, ModuleName, ModuleRegistry, ModuleSource, ModuleUnit, SourceLoader,
    UnitOrigin,
};

#[derive(Debug, Clone)]
struct MemorySource {
    path: Option<PathBuf>,
    is_package: bool,
    entry_point: bool,
    bindings: Vec<Binding>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sources: BTreeMap<ModuleName, MemorySource>,
    failures: HashMap<ModuleName, String>,
    executions: Vec<ModuleName>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InjectedFailure(String);

/// In-memory [`SourceLoader`].
///
/// Module `a.b` lives at `<root>/a/b.toml`, package `a.b` at
/// `<root>/a/b/__init__.toml`. External modules have no path.
#[derive(Debug)]
pub struct MemoryLoader {
    root: PathBuf,
    state: Mutex<MemoryState>,
}

fn parse(name: &str) -> ModuleName {
    ModuleName::new(name).unwrap_or_else(|err| panic!("invalid module name {name:?}: {err}"))
}

impl MemoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a plain module under the root.
    pub fn module(self, name: &str, bindings: Vec<Binding>) -> Self {
        let path = self.path_of(name, false);
        self.with_source(name, Some(path), false, false, bindings)
    }

    /// Add a package aggregator under the root.
    pub fn package(self, name: &str, bindings: Vec<Binding>) -> Self {
        let path = self.path_of(name, true);
        self.with_source(name, Some(path), true, false, bindings)
    }

    /// Add a module exposing a host entry point.
    pub fn extension(self, name: &str, bindings: Vec<Binding>) -> Self {
        let path = self.path_of(name, false);
        self.with_source(name, Some(path), false, true, bindings)
    }

    /// Add a third-party module without a source file.
    pub fn external(self, name: &str) -> Self {
        self.with_source(name, None, false, false, Vec::new())
    }

    /// Install the current version of every source, bypassing execution.
    pub fn load_all(&self, registry: &ModuleRegistry) {
        let state = self.state.lock();
        for (name, source) in &state.sources {
            registry.install(Self::unit(name, source));
        }
    }

    /// Replace the bindings a module produces on its next execution.
    pub fn edit(&self, name: &ModuleName, bindings: Vec<Binding>) {
        if let Some(source) = self.state.lock().sources.get_mut(name) {
            source.bindings = bindings;
        }
    }

    /// Make every further execution of `name` fail with `message`.
    pub fn fail_on(&self, name: &ModuleName, message: impl Into<String>) {
        self.state.lock().failures.insert(name.clone(), message.into());
    }

    /// Drop the source of `name` so it can no longer be located.
    pub fn forget(&self, name: &ModuleName) {
        self.state.lock().sources.remove(name);
    }

    /// Every executed module in execution order, failed attempts included.
    pub fn executions(&self) -> Vec<ModuleName> {
        self.state.lock().executions.clone()
    }

    pub fn clear_executions(&self) {
        self.state.lock().executions.clear();
    }

    fn path_of(&self, name: &str, is_package: bool) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(name.split('.'));
        if is_package {
            path.join("__init__.toml")
        } else {
            path.with_extension("toml")
        }
    }

    fn with_source(
        mut self,
        name: &str,
        path: Option<PathBuf>,
        is_package: bool,
        entry_point: bool,
        bindings: Vec<Binding>,
    ) -> Self {
        self.state.get_mut().sources.insert(
            parse(name),
            MemorySource {
                path,
                is_package,
                entry_point,
                bindings,
            },
        );
        self
    }

    fn unit(name: &ModuleName, source: &MemorySource) -> ModuleUnit {
        let origin = match &source.path {
            Some(path) => UnitOrigin::File(path.clone()),
            None => UnitOrigin::Unknown,
        };
        ModuleUnit::builder(name.clone())
            .origin(origin)
            .package(source.is_package)
            .entry_point(source.entry_point)
            .bindings(source.bindings.clone())
            .build()
    }
}

impl SourceLoader for MemoryLoader {
    fn locate(&self, name: &ModuleName) -> Option<ModuleSource> {
        let state = self.state.lock();
        let source = state.sources.get(name)?;
        Some(ModuleSource::new(name.clone(), source.path.clone()).package(source.is_package))
    }

    fn execute(
        &self,
        source: &ModuleSource,
        _registry: &ModuleRegistry,
    ) -> Result<ModuleUnit, BoxError> {
        let mut state = self.state.lock();
        state.executions.push(source.name.clone());

        if let Some(message) = state.failures.get(&source.name) {
            return Err(Box::new(InjectedFailure(message.clone())));
        }
        let stored = state
            .sources
            .get(&source.name)
            .ok_or_else(|| InjectedFailure(format!("`{}` vanished", source.name)))?;
        Ok(Self::unit(&source.name, stored))
    }
}
