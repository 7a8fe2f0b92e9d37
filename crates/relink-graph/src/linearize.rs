//! Reload ordering via C3 linearization.
//!
//! Modules are first ranked in a topological order of the graph, dependents
//! before their dependencies, with depth and then name deciding between
//! modules that do not reference each other. Each module's resolution order
//! is the module itself followed by the C3 merge of its children's resolution
//! orders and the list of its children in rank order; among mergeable heads
//! the lowest rank goes first. Reversing the root's resolution order gives a
//! sequence in which every module comes after everything it references.

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;
use tracing::{debug, trace};

use super::{DependencyGraph, ModuleName, ReloadError, Result};

/// Dependency-first reload order. The root is always last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinearOrder {
    modules: Vec<ModuleName>,
}

impl LinearOrder {
    pub fn root(&self) -> &ModuleName {
        // `linearize` always produces at least the root
        &self.modules[self.modules.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.iter()
    }

    pub fn as_slice(&self) -> &[ModuleName] {
        &self.modules
    }

    /// Everything except the root, dependencies first.
    pub fn dependencies(&self) -> &[ModuleName] {
        &self.modules[..self.modules.len() - 1]
    }

    pub fn position(&self, name: &ModuleName) -> Option<usize> {
        self.modules.iter().position(|module| module == name)
    }

    /// Check that every child in `graph` comes before its parent.
    pub fn respects(&self, graph: &DependencyGraph) -> bool {
        graph.edges().all(|(parent, child)| {
            match (self.position(parent), self.position(child)) {
                (Some(parent), Some(child)) => child < parent,
                _ => false,
            }
        })
    }
}

impl<'a> IntoIterator for &'a LinearOrder {
    type Item = &'a ModuleName;
    type IntoIter = std::slice::Iter<'a, ModuleName>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

/// Compute the reload order for `root`.
///
/// Fails with [`ReloadError::InconsistentHierarchy`] when the graph contains a
/// reference cycle.
pub fn linearize(graph: &DependencyGraph, root: &ModuleName) -> Result<LinearOrder> {
    if !graph.contains(root) {
        return Err(ReloadError::UnresolvableModule(root.clone()));
    }

    let rank = topological_rank(graph, root)?;
    let mut visited = HashSet::default();
    let mut modules = resolution_order(graph, root, &rank, &mut visited)?;
    modules.reverse();

    debug!(
        root = %root,
        order = %modules.iter().map(ModuleName::as_str).collect::<Vec<_>>().join(" -> "),
        "linearized reload order"
    );
    Ok(LinearOrder { modules })
}

/// Position of every module in a topological order with parents before
/// children, breaking ties by depth, then name.
fn topological_rank(
    graph: &DependencyGraph,
    root: &ModuleName,
) -> Result<HashMap<ModuleName, usize>> {
    let mut parents: HashMap<&ModuleName, usize> =
        graph.records().map(|record| (&record.name, 0)).collect();
    for (_, child) in graph.edges() {
        if let Some(count) = parents.get_mut(child) {
            *count += 1;
        }
    }

    let mut ready: BTreeSet<(usize, &ModuleName)> = graph
        .records()
        .filter(|record| parents.get(&record.name) == Some(&0))
        .map(|record| (record.depth, &record.name))
        .collect();
    let mut rank = HashMap::default();

    while let Some((_, name)) = ready.pop_first() {
        rank.insert(name.clone(), rank.len());
        let Some(record) = graph.get(name) else {
            continue;
        };
        for child in &record.children {
            let Some(count) = parents.get_mut(child) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                if let Some(child) = graph.get(child) {
                    ready.insert((child.depth, &child.name));
                }
            }
        }
    }

    if rank.len() < graph.len() {
        let candidates: Vec<_> = graph
            .records()
            .map(|record| &record.name)
            .filter(|name| !rank.contains_key(*name))
            .cloned()
            .collect();
        return Err(ReloadError::InconsistentHierarchy {
            module: root.clone(),
            candidates,
        });
    }
    Ok(rank)
}

/// Root-first order: `name`, then whatever it references.
fn resolution_order(
    graph: &DependencyGraph,
    name: &ModuleName,
    rank: &HashMap<ModuleName, usize>,
    visited: &mut HashSet<ModuleName>,
) -> Result<Vec<ModuleName>> {
    visited.insert(name.clone());

    let mut children: Vec<ModuleName> = graph
        .get(name)
        .map(|record| record.children.iter().cloned().collect())
        .unwrap_or_default();
    children.sort_by_key(|child| rank.get(child).copied().unwrap_or(usize::MAX));

    let mut sequences = Vec::with_capacity(children.len() + 1);
    for child in &children {
        // Modules already linearized elsewhere are ordered through that sequence.
        if !visited.contains(child) {
            sequences.push(resolution_order(graph, child, rank, visited)?);
        }
    }
    sequences.push(children);

    let merged = merge(sequences, rank).map_err(|candidates| ReloadError::InconsistentHierarchy {
        module: name.clone(),
        candidates,
    })?;

    let mut order = Vec::with_capacity(merged.len() + 1);
    order.push(name.clone());
    order.extend(merged);
    Ok(order)
}

/// C3 merge.
///
/// Repeatedly takes a sequence head that does not appear in the tail of any
/// sequence, the lowest ranked one when several qualify. Unranked heads come
/// last, in sequence order. On a stall returns the remaining heads.
pub(crate) fn merge<I>(
    sequences: I,
    rank: &HashMap<ModuleName, usize>,
) -> std::result::Result<Vec<ModuleName>, Vec<ModuleName>>
where
    I: IntoIterator<Item = Vec<ModuleName>>,
{
    let mut sequences: Vec<VecDeque<ModuleName>> = sequences
        .into_iter()
        .filter(|sequence| !sequence.is_empty())
        .map(VecDeque::from)
        .collect();
    let mut merged = Vec::new();

    while !sequences.is_empty() {
        let candidate = sequences
            .iter()
            .filter_map(|sequence| sequence.front())
            .filter(|head| {
                trace!(candidate = %head, "checking merge candidate");
                !sequences
                    .iter()
                    .any(|sequence| sequence.iter().skip(1).any(|item| item == *head))
            })
            .min_by_key(|head| rank.get(*head).copied().unwrap_or(usize::MAX))
            .cloned();

        let Some(candidate) = candidate else {
            let mut heads: Vec<_> = sequences
                .iter()
                .filter_map(|sequence| sequence.front().cloned())
                .collect();
            heads.sort();
            heads.dedup();
            return Err(heads);
        };

        for sequence in &mut sequences {
            if sequence.front() == Some(&candidate) {
                sequence.pop_front();
            }
        }
        sequences.retain(|sequence| !sequence.is_empty());
        merged.push(candidate);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ModuleRecord, ModuleUnit};

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    fn seq(items: &[&str]) -> Vec<ModuleName> {
        items.iter().map(|item| name(item)).collect()
    }

    fn record(module: &str, depth: usize, children: &[&str]) -> ModuleRecord {
        let unit = Arc::new(ModuleUnit::builder(name(module)).build());
        children
            .iter()
            .fold(ModuleRecord::new(unit, depth), |record, child| {
                record.with_child(name(child))
            })
    }

    fn graph(records: Vec<ModuleRecord>) -> DependencyGraph {
        let mut records = records.into_iter();
        let mut graph = DependencyGraph::new(records.next().unwrap());
        for record in records {
            graph.insert(record);
        }
        graph
    }

    fn order(order: &LinearOrder) -> Vec<&str> {
        order.iter().map(ModuleName::as_str).collect()
    }

    #[test]
    fn merge_follows_c3() {
        // Classic example: O, A(O), B(O), C(A, B)
        let merged = merge(
            vec![seq(&["A", "O"]), seq(&["B", "O"]), seq(&["A", "B"])],
            &HashMap::default(),
        )
        .unwrap();
        assert_eq!(merged, seq(&["A", "B", "O"]));
    }

    #[test]
    fn merge_reports_conflicting_heads() {
        let heads = merge(vec![seq(&["A", "B"]), seq(&["B", "A"])], &HashMap::default()).unwrap_err();
        assert_eq!(heads, seq(&["A", "B"]));
    }

    #[test]
    fn chain_is_dependency_first() {
        let graph = graph(vec![
            record("a", 0, &["b"]),
            record("b", 1, &["c"]),
            record("c", 2, &[]),
        ]);
        let linear = linearize(&graph, &name("a")).unwrap();

        assert_eq!(order(&linear), ["c", "b", "a"]);
        assert_eq!(linear.root(), &name("a"));
        assert_eq!(linear.dependencies(), seq(&["c", "b"]).as_slice());
        assert!(linear.respects(&graph));
    }

    #[test]
    fn diamond_lists_shared_dependency_once() {
        let graph = graph(vec![
            record("a", 0, &["b", "c"]),
            record("b", 1, &["d"]),
            record("c", 1, &["d"]),
            record("d", 2, &[]),
        ]);
        let linear = linearize(&graph, &name("a")).unwrap();

        assert_eq!(order(&linear), ["d", "c", "b", "a"]);
        assert!(linear.respects(&graph));
    }

    #[test]
    fn siblings_are_ordered_by_depth_then_name() {
        let graph = graph(vec![
            record("root", 0, &["zeta", "alpha", "deep"]),
            record("zeta", 1, &[]),
            record("alpha", 1, &[]),
            record("deep", 2, &[]),
        ]);
        let linear = linearize(&graph, &name("root")).unwrap();
        // resolution order root, alpha, zeta, deep -> reversed
        assert_eq!(order(&linear), ["deep", "zeta", "alpha", "root"]);
    }

    #[test]
    fn merge_prefers_lower_rank_among_free_heads() {
        let rank: HashMap<_, _> = [(name("B"), 0), (name("A"), 1)].into_iter().collect();
        let merged = merge(vec![seq(&["A"]), seq(&["B"])], &rank).unwrap();
        assert_eq!(merged, seq(&["B", "A"]));
    }

    #[test]
    fn sibling_referencing_a_sibling_goes_after_it() {
        // Both children sit at depth 1 and `b` sorts first, but `c` needs it.
        let graph = graph(vec![
            record("a", 0, &["b", "c"]),
            record("b", 1, &[]),
            record("c", 1, &["b"]),
        ]);
        let linear = linearize(&graph, &name("a")).unwrap();

        assert_eq!(order(&linear), ["b", "c", "a"]);
        assert!(linear.respects(&graph));
    }

    #[test]
    fn sibling_constraints_override_name_order() {
        let graph = graph(vec![
            record("root", 0, &["helpers", "models", "embeds"]),
            record("helpers", 1, &["models"]),
            record("models", 1, &[]),
            record("embeds", 1, &["models"]),
        ]);
        let linear = linearize(&graph, &name("root")).unwrap();

        assert_eq!(order(&linear), ["models", "helpers", "embeds", "root"]);
        assert!(linear.respects(&graph));
    }

    #[test]
    fn mutual_references_are_inconsistent() {
        let graph = graph(vec![
            record("a", 0, &["b", "c"]),
            record("b", 1, &["c"]),
            record("c", 1, &["b"]),
        ]);
        let err = linearize(&graph, &name("a")).unwrap_err();
        assert!(matches!(err, ReloadError::InconsistentHierarchy { .. }));
    }

    #[test]
    fn reference_back_to_root_is_inconsistent() {
        let graph = graph(vec![record("a", 0, &["b"]), record("b", 1, &["a"])]);
        let err = linearize(&graph, &name("a")).unwrap_err();
        assert!(
            matches!(err, ReloadError::InconsistentHierarchy { module, .. } if module == name("a"))
        );
    }

    #[test]
    fn unknown_root_is_unresolvable() {
        let graph = graph(vec![record("a", 0, &[])]);
        assert!(matches!(
            linearize(&graph, &name("b")),
            Err(ReloadError::UnresolvableModule(_))
        ));
    }
}
