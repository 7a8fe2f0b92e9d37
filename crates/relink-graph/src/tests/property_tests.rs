//! Property-based tests for reload ordering using proptest.
//!
//! Random acyclic reference graphs are built into a registry and ordered from
//! `m0`. An order must always exist; it lists every reachable module exactly
//! once, puts every child before its parent and is reproducible.
//!
//! Run with: cargo test --features proptest --package relink-graph property_tests

#![cfg(feature = "proptest")]

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::{
    Binding, Boundary, DependencyGraph, ModuleName, ModuleRegistry, ModuleUnit, linearize,
};

const ROOT: &str = "/srv/bot";

fn module_name(index: usize) -> ModuleName {
    ModuleName::new(format!("m{index}")).unwrap()
}

/// Strategy for acyclic graphs.
///
/// Edges point forward in a random permutation of the modules, so name order
/// and reference order disagree as often as they agree.
fn dag_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..=12).prop_flat_map(|size| {
        let order = Just((0..size).collect::<Vec<_>>()).prop_shuffle();
        let pairs = prop::collection::vec((0..size, 0..size), 0..=size * 3);
        (Just(size), (order, pairs).prop_map(|(order, pairs)| {
            pairs
                .into_iter()
                .filter(|(from, to)| from < to)
                .map(|(from, to)| (order[from], order[to]))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        }))
    })
}

fn registry_for(size: usize, edges: &[(usize, usize)]) -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    for index in 0..size {
        let bindings = edges
            .iter()
            .filter(|(from, _)| *from == index)
            .map(|(_, to)| Binding::module(format!("m{to}"), module_name(*to)))
            .collect();
        registry.install(
            ModuleUnit::builder(module_name(index))
                .file(format!("{ROOT}/m{index}.toml"))
                .bindings(bindings)
                .build(),
        );
    }
    registry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: every acyclic graph has an order, and it covers the graph and
    /// respects every edge.
    #[test]
    fn prop_order_respects_edges((size, edges) in dag_strategy()) {
        let registry = registry_for(size, &edges);
        let root = module_name(0);
        let graph = DependencyGraph::build(&registry, &Boundary::new(ROOT), &root).unwrap();

        let result = linearize(&graph, &root);
        prop_assert!(result.is_ok(), "acyclic graph rejected: {:?}", result);
        let order = result.unwrap();

        prop_assert!(order.respects(&graph));
        prop_assert_eq!(order.len(), graph.len());
        prop_assert_eq!(order.root(), &root);

        let unique: BTreeSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), order.len());
    }

    /// Property: the same registry always yields the same outcome.
    #[test]
    fn prop_order_is_deterministic((size, edges) in dag_strategy()) {
        let root = module_name(0);
        let first = {
            let registry = registry_for(size, &edges);
            let graph = DependencyGraph::build(&registry, &Boundary::new(ROOT), &root).unwrap();
            linearize(&graph, &root).map_err(|err| err.to_string())
        };
        let second = {
            let registry = registry_for(size, &edges);
            let graph = DependencyGraph::build(&registry, &Boundary::new(ROOT), &root).unwrap();
            linearize(&graph, &root).map_err(|err| err.to_string())
        };
        prop_assert_eq!(first, second);
    }

    /// Property: the graph never records a module as its own child, and every
    /// child has a record.
    #[test]
    fn prop_graph_is_closed((size, edges) in dag_strategy()) {
        let registry = registry_for(size, &edges);
        let graph = DependencyGraph::build(&registry, &Boundary::new(ROOT), &module_name(0)).unwrap();

        for (parent, child) in graph.edges() {
            prop_assert_ne!(parent, child);
            prop_assert!(graph.contains(child));
        }
    }
}
