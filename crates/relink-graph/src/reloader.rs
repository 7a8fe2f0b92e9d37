use rustc_hash::FxHashSet as HashSet;
use tracing::{debug, info};

use super::transaction::MismatchedUnit;
use super::{
    Boundary, DependencyGraph, LinearOrder, ModuleName, ModuleRegistry, ReloadError,
    ReloadReport, ReloadTransaction, Result, SourceLoader, linearize,
};

/// The runtime object that owns the registry.
///
/// Hosts call [`prepare_reload`](Self::prepare_reload) and
/// [`execute_reload`](Self::execute_reload) (or [`reload_children`](Self::reload_children)
/// for both at once) and reload the root module themselves afterwards.
#[derive(Debug)]
pub struct Reloader<L> {
    registry: ModuleRegistry,
    boundary: Boundary,
    loader: L,
}

impl<L: SourceLoader> Reloader<L> {
    pub fn new(boundary: Boundary, loader: L) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            boundary,
            loader,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load `name` for the first time, along with every enclosing package and
    /// every referenced module that is not registered yet.
    ///
    /// Returns the newly installed names, dependencies first. Nothing stays
    /// installed when any of them fails.
    pub fn load(&self, name: &ModuleName) -> Result<Vec<ModuleName>> {
        let mut pending = HashSet::default();
        let mut installed = Vec::new();

        match self.load_into(name, &mut pending, &mut installed) {
            Ok(()) => {
                debug!(module = %name, installed = installed.len(), "loaded module");
                Ok(installed)
            }
            Err(err) => {
                for module in &installed {
                    self.registry.remove(module);
                }
                Err(err)
            }
        }
    }

    /// Build the dependency graph of `root` without ordering it.
    pub fn graph(&self, root: &ModuleName) -> Result<DependencyGraph> {
        DependencyGraph::build(&self.registry, &self.boundary, root)
    }

    /// Compute the reload order for `root`. Reads the registry only.
    pub fn prepare_reload(&self, root: &ModuleName) -> Result<LinearOrder> {
        let graph = self.graph(root)?;
        linearize(&graph, root)
    }

    /// Re-execute every module of `order` except the root.
    pub fn execute_reload(&self, order: &LinearOrder) -> Result<ReloadReport> {
        ReloadTransaction::new(&self.registry, &self.loader).execute(order)
    }

    /// [`prepare_reload`](Self::prepare_reload) followed by
    /// [`execute_reload`](Self::execute_reload).
    pub fn reload_children(&self, root: &ModuleName) -> Result<ReloadReport> {
        let order = self.prepare_reload(root)?;
        info!(root = %root, modules = order.dependencies().len(), "reloading child modules");
        self.execute_reload(&order)
    }

    fn load_into(
        &self,
        name: &ModuleName,
        pending: &mut HashSet<ModuleName>,
        installed: &mut Vec<ModuleName>,
    ) -> Result<()> {
        if self.registry.contains(name) || !pending.insert(name.clone()) {
            return Ok(());
        }

        if let Some(package) = name.parent() {
            if self.loader.locate(&package).is_some() {
                self.load_into(&package, pending, installed)?;
            }
        }

        let source = self
            .loader
            .locate(name)
            .ok_or_else(|| ReloadError::UnresolvableModule(name.clone()))?;
        let unit = self
            .loader
            .execute(&source, &self.registry)
            .map_err(|source| ReloadError::ReloadExecution {
                module: name.clone(),
                source,
            })?;
        if unit.name != *name {
            return Err(ReloadError::ReloadExecution {
                module: name.clone(),
                source: Box::new(MismatchedUnit {
                    expected: name.clone(),
                    produced: unit.name,
                }),
            });
        }

        for target in unit.referenced_modules() {
            self.load_into(target, pending, installed)?;
        }

        let unit = self.registry.install(unit);
        installed.push(unit.name.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Binding;
    use crate::test_utils::MemoryLoader;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    fn reloader(loader: MemoryLoader) -> Reloader<MemoryLoader> {
        Reloader::new(Boundary::new(loader.root()), loader)
    }

    #[test]
    fn load_pulls_in_packages_and_references() {
        let loader = MemoryLoader::new("/srv/bot")
            .package("cogs", vec![])
            .module("cogs.gapi", vec![Binding::module("helpers", name("utils.helpers"))])
            .module("utils.helpers", vec![Binding::symbol("ClientSession", name("aiohttp"))])
            .external("aiohttp");
        let reloader = reloader(loader);

        let installed = reloader.load(&name("cogs.gapi")).unwrap();
        assert_eq!(
            installed,
            [name("cogs"), name("aiohttp"), name("utils.helpers"), name("cogs.gapi")]
        );
        assert!(reloader.load(&name("cogs.gapi")).unwrap().is_empty());
    }

    #[test]
    fn failed_load_installs_nothing() {
        let loader = MemoryLoader::new("/srv/bot")
            .module("cogs.gapi", vec![Binding::module("helpers", name("utils.helpers"))])
            .module("utils.helpers", vec![Binding::module("broken", name("utils.broken"))])
            .module("utils.broken", vec![]);
        loader.fail_on(&name("cogs.gapi"), "bad manifest");
        let reloader = reloader(loader);

        let err = reloader.load(&name("cogs.gapi")).unwrap_err();
        assert_eq!(err.module(), &name("cogs.gapi"));
        assert!(reloader.registry().is_empty());
    }

    #[test]
    fn unlocatable_reference_fails_the_load() {
        let loader = MemoryLoader::new("/srv/bot")
            .module("cogs.gapi", vec![Binding::module("gone", name("utils.gone"))]);
        let reloader = reloader(loader);

        let err = reloader.load(&name("cogs.gapi")).unwrap_err();
        assert!(matches!(err, ReloadError::UnresolvableModule(module) if module == name("utils.gone")));
        assert!(reloader.registry().is_empty());
    }

    #[test]
    fn reload_children_leaves_the_root_to_the_host() {
        let loader = MemoryLoader::new("/srv/bot")
            .module("cogs.gapi", vec![Binding::module("helpers", name("utils.helpers"))])
            .module("utils.helpers", vec![]);
        let reloader = reloader(loader);
        reloader.load(&name("cogs.gapi")).unwrap();
        let root = reloader.registry().get(&name("cogs.gapi")).unwrap();

        let report = reloader.reload_children(&name("cogs.gapi")).unwrap();
        assert_eq!(report.root, name("cogs.gapi"));
        assert_eq!(report.reloaded_names().collect::<Vec<_>>(), [&name("utils.helpers")]);
        assert_eq!(
            reloader.registry().get(&name("cogs.gapi")).unwrap().generation,
            root.generation
        );
    }
}
