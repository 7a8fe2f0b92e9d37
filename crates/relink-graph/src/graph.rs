//! Dependency graph discovery.
//!
//! Starting from a root module, the builder follows the bindings declared by
//! every installed unit and records which reloadable modules each one
//! references. The result is rebuilt for every reload request and never
//! outlives it.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use super::{Boundary, ModuleName, ModuleRegistry, ModuleUnit, ReloadError, Result};

/// One reloadable module reached from the root.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    pub name: ModuleName,
    /// The unit that was live when the graph was built.
    #[serde(skip)]
    pub unit: Arc<ModuleUnit>,
    /// Reloadable modules referenced directly from this module.
    pub children: BTreeSet<ModuleName>,
    /// Shortest number of reference hops from the root.
    pub depth: usize,
}

impl ModuleRecord {
    pub fn new(unit: Arc<ModuleUnit>, depth: usize) -> Self {
        Self {
            name: unit.name.clone(),
            unit,
            children: BTreeSet::new(),
            depth,
        }
    }

    /// Record a direct child. A module is never its own child.
    pub fn add_child(&mut self, child: ModuleName) -> bool {
        if child == self.name {
            return false;
        }
        self.children.insert(child)
    }

    pub fn with_child(mut self, child: ModuleName) -> Self {
        self.add_child(child);
        self
    }
}

/// `ModuleName -> ModuleRecord` for everything reachable from a root.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyGraph {
    root: ModuleName,
    records: BTreeMap<ModuleName, ModuleRecord>,
}

impl DependencyGraph {
    /// Create a graph holding only `root`.
    pub fn new(root: ModuleRecord) -> Self {
        let name = root.name.clone();
        let mut records = BTreeMap::new();
        records.insert(name.clone(), root);
        Self {
            root: name,
            records,
        }
    }

    /// Walk the registry from `root` at depth zero.
    pub fn build(
        registry: &ModuleRegistry,
        boundary: &Boundary,
        root: &ModuleName,
    ) -> Result<Self> {
        Self::build_from(registry, boundary, root, 0)
    }

    /// Walk the registry from `root`, which is recorded at `start_depth`.
    ///
    /// Fails only when the root itself is not registered; any other reference
    /// that cannot be resolved is skipped.
    pub fn build_from(
        registry: &ModuleRegistry,
        boundary: &Boundary,
        root: &ModuleName,
        start_depth: usize,
    ) -> Result<Self> {
        let unit = registry
            .get(root)
            .ok_or_else(|| ReloadError::UnresolvableModule(root.clone()))?;

        let mut graph = Self::new(ModuleRecord::new(unit, start_depth));
        let mut queue = VecDeque::from([root.clone()]);

        loop {
            while let Some(name) = queue.pop_front() {
                graph.walk(&name, registry, boundary, &mut queue);
            }
            let linked = graph.link_packages(registry, boundary, &mut queue);
            if !linked && queue.is_empty() {
                break;
            }
        }

        debug!(
            root = %graph.root,
            modules = graph.len(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        Ok(graph)
    }

    pub fn root(&self) -> &ModuleName {
        &self.root
    }

    pub fn get(&self, name: &ModuleName) -> Option<&ModuleRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values()
    }

    /// Every `(parent, child)` edge in name order.
    pub fn edges(&self) -> impl Iterator<Item = (&ModuleName, &ModuleName)> {
        self.records
            .values()
            .flat_map(|record| record.children.iter().map(move |child| (&record.name, child)))
    }

    pub fn edge_count(&self) -> usize {
        self.records.values().map(|record| record.children.len()).sum()
    }

    /// Add or replace a record.
    ///
    /// Callers assembling a graph by hand are responsible for adding a record
    /// for every child they reference.
    pub fn insert(&mut self, record: ModuleRecord) {
        self.records.insert(record.name.clone(), record);
    }

    fn walk(
        &mut self,
        name: &ModuleName,
        registry: &ModuleRegistry,
        boundary: &Boundary,
        queue: &mut VecDeque<ModuleName>,
    ) {
        let Some((unit, depth)) = self
            .records
            .get(name)
            .map(|record| (Arc::clone(&record.unit), record.depth))
        else {
            return;
        };

        let mut children = BTreeSet::new();
        for target in unit.referenced_modules() {
            if target == name || children.contains(target) {
                continue;
            }
            let Some(child) = registry.get(target) else {
                trace!(module = %name, reference = %target, "skipping unregistered reference");
                continue;
            };
            if !boundary.is_reloadable(&child) {
                continue;
            }
            children.insert(target.clone());
            self.discover(child, depth + 1, queue);
        }

        if let Some(record) = self.records.get_mut(name) {
            record.children.extend(children);
        }
    }

    /// Add `unit` at `depth`, or lower the depth of an already known module.
    fn discover(
        &mut self,
        unit: Arc<ModuleUnit>,
        depth: usize,
        queue: &mut VecDeque<ModuleName>,
    ) -> bool {
        match self.records.entry(unit.name.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.depth = record.depth.min(depth);
                false
            }
            Entry::Vacant(entry) => {
                queue.push_back(unit.name.clone());
                entry.insert(ModuleRecord::new(unit, depth));
                true
            }
        }
    }

    /// Schedule package aggregators after the members they re-expose.
    ///
    /// For a member `C` of package `P`, `P` joins the graph with the edge
    /// `P -> C`, and every module outside `P` referencing `C` also references
    /// `P`. Packages enclosing the root are left to the host. Returns whether
    /// anything changed.
    fn link_packages(
        &mut self,
        registry: &ModuleRegistry,
        boundary: &Boundary,
        queue: &mut VecDeque<ModuleName>,
    ) -> bool {
        let members: Vec<(ModuleName, usize)> = self
            .records
            .values()
            .filter(|record| record.name != self.root)
            .map(|record| (record.name.clone(), record.depth))
            .collect();

        let mut changed = false;
        for (member, depth) in members {
            let Some(package) = member.parent() else {
                continue;
            };
            if self.root.is_within(&package) {
                continue;
            }
            let Some(unit) = registry.get(&package) else {
                continue;
            };
            if !unit.is_package || !boundary.is_reloadable(&unit) {
                continue;
            }
            // The member imports its own package, so the package has to go first.
            if self
                .records
                .get(&member)
                .is_some_and(|record| record.children.contains(&package))
            {
                continue;
            }

            changed |= self.discover(unit, depth, queue);
            if let Some(record) = self.records.get_mut(&package) {
                changed |= record.add_child(member.clone());
            }

            let importers: Vec<(ModuleName, usize)> = self
                .records
                .values()
                .filter(|record| {
                    !record.name.is_within(&package) && record.children.contains(&member)
                })
                .map(|record| (record.name.clone(), record.depth))
                .collect();

            for (importer, importer_depth) in importers {
                if let Some(record) = self.records.get_mut(&importer) {
                    changed |= record.add_child(package.clone());
                }
                if let Some(record) = self.records.get_mut(&package) {
                    record.depth = record.depth.min(importer_depth + 1);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Binding;

    const ROOT: &str = "/srv/bot";

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    fn module(s: &str) -> crate::ModuleUnitBuilder {
        let path = format!("{ROOT}/{}.toml", s.replace('.', "/"));
        ModuleUnit::builder(name(s)).file(path)
    }

    fn names(set: &BTreeSet<ModuleName>) -> Vec<&str> {
        set.iter().map(ModuleName::as_str).collect()
    }

    #[test]
    fn records_module_and_symbol_references() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("cogs.genshin.gapi")
                .binding(Binding::module("helpers", name("utils.helpers")))
                .binding(Binding::symbol("GenshinUser", name("models.hoyolab")))
                .binding(Binding::value("COOLDOWN"))
                .build(),
        );
        registry.install(module("utils.helpers").build());
        registry.install(module("models.hoyolab").build());

        let boundary = Boundary::new(ROOT);
        let graph = DependencyGraph::build(&registry, &boundary, &name("cogs.genshin.gapi")).unwrap();

        let root = graph.get(&name("cogs.genshin.gapi")).unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(names(&root.children), ["models.hoyolab", "utils.helpers"]);
        assert_eq!(graph.get(&name("utils.helpers")).unwrap().depth, 1);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn skips_external_excluded_and_unregistered_references() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("cogs.administrative.exts")
                .binding(Binding::module("commands", name("disnake.ext.commands")))
                .binding(Binding::symbol("CustomBot", name("utils.bot")))
                .binding(Binding::module("missing", name("utils.gone")))
                .build(),
        );
        registry.install(ModuleUnit::builder(name("disnake.ext.commands")).build());
        registry.install(module("utils.bot").build());

        let boundary = Boundary::new(ROOT).exclude(name("utils.bot"));
        let graph =
            DependencyGraph::build(&registry, &boundary, &name("cogs.administrative.exts")).unwrap();

        assert_eq!(graph.len(), 1);
        assert!(graph.get(&name("cogs.administrative.exts")).unwrap().children.is_empty());
    }

    #[test]
    fn self_references_never_become_children() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("utils.helpers")
                .binding(Binding::symbol("walk_modules", name("utils.helpers")))
                .build(),
        );

        let graph =
            DependencyGraph::build(&registry, &Boundary::new(ROOT), &name("utils.helpers")).unwrap();
        assert!(graph.get(&name("utils.helpers")).unwrap().children.is_empty());
    }

    #[test]
    fn shortest_depth_wins_on_rediscovery() {
        // a -> b -> c -> d, and a -> d directly
        let registry = ModuleRegistry::new();
        registry.install(
            module("a")
                .binding(Binding::module("b", name("b")))
                .binding(Binding::module("d", name("d")))
                .build(),
        );
        registry.install(module("b").binding(Binding::module("c", name("c"))).build());
        registry.install(module("c").binding(Binding::module("d", name("d"))).build());
        registry.install(module("d").build());

        let graph = DependencyGraph::build_from(&registry, &Boundary::new(ROOT), &name("a"), 3).unwrap();
        assert_eq!(graph.get(&name("a")).unwrap().depth, 3);
        assert_eq!(graph.get(&name("c")).unwrap().depth, 5);
        assert_eq!(graph.get(&name("d")).unwrap().depth, 4);
    }

    #[test]
    fn unregistered_root_is_unresolvable() {
        let registry = ModuleRegistry::new();
        let err = DependencyGraph::build(&registry, &Boundary::new(ROOT), &name("cogs.missing"))
            .unwrap_err();
        assert!(matches!(err, ReloadError::UnresolvableModule(module) if module == name("cogs.missing")));
    }

    #[test]
    fn package_aggregators_follow_their_members() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("cogs.mihoyo.wiki")
                .binding(Binding::symbol("WikiPage", name("cogs.mihoyo.__wiki.models")))
                .build(),
        );
        registry.install(
            module("cogs.mihoyo.__wiki")
                .package(true)
                .binding(Binding::symbol("WikiPage", name("cogs.mihoyo.__wiki.models")))
                .build(),
        );
        registry.install(module("cogs.mihoyo.__wiki.models").build());

        let graph =
            DependencyGraph::build(&registry, &Boundary::new(ROOT), &name("cogs.mihoyo.wiki")).unwrap();

        let root = graph.get(&name("cogs.mihoyo.wiki")).unwrap();
        assert_eq!(names(&root.children), ["cogs.mihoyo.__wiki", "cogs.mihoyo.__wiki.models"]);
        let package = graph.get(&name("cogs.mihoyo.__wiki")).unwrap();
        assert_eq!(names(&package.children), ["cogs.mihoyo.__wiki.models"]);
        assert_eq!(package.depth, 1);
    }

    #[test]
    fn packages_enclosing_the_root_are_left_alone() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("cogs.genshin.gapi")
                .binding(Binding::module("claim", name("cogs.genshin.claim")))
                .build(),
        );
        registry.install(module("cogs.genshin.claim").build());
        registry.install(
            module("cogs.genshin")
                .package(true)
                .binding(Binding::module("gapi", name("cogs.genshin.gapi")))
                .build(),
        );

        let graph =
            DependencyGraph::build(&registry, &Boundary::new(ROOT), &name("cogs.genshin.gapi")).unwrap();
        assert!(!graph.contains(&name("cogs.genshin")));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn every_child_has_a_record() {
        let registry = ModuleRegistry::new();
        registry.install(
            module("main")
                .binding(Binding::module("a", name("pkg.a")))
                .binding(Binding::module("b", name("pkg.sub.b")))
                .build(),
        );
        registry.install(module("pkg").package(true).build());
        registry.install(module("pkg.sub").package(true).build());
        registry.install(module("pkg.a").build());
        registry.install(module("pkg.sub.b").build());

        let graph = DependencyGraph::build(&registry, &Boundary::new(ROOT), &name("main")).unwrap();
        for (parent, child) in graph.edges() {
            assert_ne!(parent, child);
            assert!(graph.contains(child), "{child} is missing a record");
        }
        // pkg aggregates both pkg.a and the pkg.sub aggregator
        let pkg = graph.get(&name("pkg")).unwrap();
        assert_eq!(names(&pkg.children), ["pkg.a", "pkg.sub"]);
    }
}
