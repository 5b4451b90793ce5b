//! Kahn's-algorithm topological ordering for the standalone executor.
//!
//! Distinct from the three-coloured DFS used by workstream discovery: this
//! one operates on whatever dependency edges the caller hands it (already
//! safe-fallback'd by [`crate::deps::parse_dependencies`]) and reports a
//! cycle by naming the nodes that never reached in-degree zero.

use sdp_utils::identifiers::WorkstreamId;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, thiserror::Error)]
#[error("cycle detected among workstreams: {0}")]
pub struct CycleError(pub String);

/// `edges[a]` lists the dependencies of `a` (edges point from a node to what
/// it depends on). Returns the nodes ordered so every dependency precedes
/// its dependents; ties break on id order for determinism.
pub fn topological_sort(
    nodes: &[WorkstreamId],
    edges: &BTreeMap<WorkstreamId, Vec<WorkstreamId>>,
) -> Result<Vec<WorkstreamId>, CycleError> {
    let node_set: std::collections::BTreeSet<&WorkstreamId> = nodes.iter().collect();

    // dependents[d] = nodes that depend on d; in_degree[n] = number of unresolved deps of n.
    let mut dependents: HashMap<&WorkstreamId, Vec<&WorkstreamId>> = HashMap::new();
    let mut in_degree: HashMap<&WorkstreamId, usize> = nodes.iter().map(|n| (n, 0usize)).collect();

    for node in nodes {
        let deps = edges.get(node).map(Vec::as_slice).unwrap_or(&[]);
        for dep in deps {
            if !node_set.contains(dep) {
                continue;
            }
            dependents.entry(dep).or_default().push(node);
            *in_degree.get_mut(node).unwrap() += 1;
        }
    }

    let mut ready: VecDeque<&WorkstreamId> = nodes.iter().filter(|n| in_degree[n] == 0).collect();
    let ready_sorted = {
        let mut v: Vec<&WorkstreamId> = ready.drain(..).collect();
        v.sort();
        v
    };
    let mut ready: VecDeque<&WorkstreamId> = ready_sorted.into();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop_front() {
        order.push(node.clone());
        if let Some(deps) = dependents.get(node) {
            let mut newly_ready = Vec::new();
            for dependent in deps {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    newly_ready.push(*dependent);
                }
            }
            newly_ready.sort();
            for n in newly_ready {
                ready.push_back(n);
            }
        }
    }

    if order.len() != nodes.len() {
        let remaining: Vec<String> = nodes
            .iter()
            .filter(|n| !order.contains(n))
            .map(ToString::to_string)
            .collect();
        return Err(CycleError(remaining.join(", ")));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> WorkstreamId {
        WorkstreamId::parse(s).unwrap()
    }

    #[test]
    fn orders_dependency_before_dependent() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let mut edges = BTreeMap::new();
        edges.insert(b.clone(), vec![a.clone()]);
        let order = topological_sort(&[a.clone(), b.clone()], &edges).unwrap();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn detects_two_node_cycle() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let mut edges = BTreeMap::new();
        edges.insert(a.clone(), vec![b.clone()]);
        edges.insert(b.clone(), vec![a.clone()]);
        let err = topological_sort(&[a, b], &edges).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("cycle"));
    }

    #[test]
    fn ties_break_on_id_order() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let c = id("00-016-03");
        let edges = BTreeMap::new();
        let order = topological_sort(&[c.clone(), a.clone(), b.clone()], &edges).unwrap();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn ignores_dependencies_outside_the_node_set() {
        let a = id("00-016-01");
        let mut edges = BTreeMap::new();
        edges.insert(a.clone(), vec![id("00-015-09")]);
        let order = topological_sort(&[a.clone()], &edges).unwrap();
        assert_eq!(order, vec![a]);
    }
}
