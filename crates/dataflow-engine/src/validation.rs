//! Cycle detection and ancestor-closure computation, both hand-rolled
//! over `String`-keyed maps rather than pulling in a graph crate.

use crate::error::{DataflowError, ErrorCategory, Result};
use crate::graph::Graph;
use std::collections::{HashMap, HashSet, VecDeque};

/// Kahn's algorithm over the whole graph. Fails with `graph_cyclic` if
/// not every node can be processed.
pub fn topological_order(graph: &Graph) -> Result<Vec<String>> {
    topological_order_subset(graph, &graph.nodes.iter().map(|n| n.id.clone()).collect())
}

/// Kahn's algorithm restricted to `subset` (used by `preview_node` after
/// computing the ancestor closure).
pub fn topological_order_subset(graph: &Graph, subset: &HashSet<String>) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = subset.iter().map(|id| (id.as_str(), 0usize)).collect();
    for e in &graph.edges {
        if subset.contains(&e.source) && subset.contains(&e.target) {
            *in_degree.get_mut(e.target.as_str()).unwrap() += 1;
        }
    }

    let mut queue: VecDeque<String> = graph
        .nodes
        .iter()
        .map(|n| n.id.clone())
        .filter(|id| subset.contains(id) && in_degree[id.as_str()] == 0)
        .collect();

    let mut order = Vec::with_capacity(subset.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.clone());
        for next in graph.adjacency.get(&id).into_iter().flatten() {
            if !subset.contains(next) {
                continue;
            }
            let deg = in_degree.get_mut(next.as_str()).unwrap();
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(next.clone());
            }
        }
    }

    if order.len() != subset.len() {
        return Err(DataflowError::new(
            ErrorCategory::GraphCyclic,
            "graph contains a cycle: topological sort could not process every node",
        ));
    }
    Ok(order)
}

/// Transitive closure over reverse adjacency, including `node_id` itself,
/// computed as an iterative fixed point (repeated full edge-list scans)
/// rather than a single BFS/DFS pass — mirrors the validator's own
/// Kahn's-iteration style so the two graph algorithms in this module read
/// the same way.
pub fn ancestor_closure(graph: &Graph, node_id: &str) -> HashSet<String> {
    let mut set: HashSet<String> = HashSet::new();
    set.insert(node_id.to_string());
    loop {
        let mut added = false;
        for e in &graph.edges {
            if set.contains(&e.target) && !set.contains(&e.source) {
                set.insert(e.source.clone());
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RawWorkflow;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let raw: RawWorkflow = serde_json::from_value(serde_json::json!({
            "nodes": nodes.iter().map(|id| serde_json::json!({"id": id, "type": "source"})).collect::<Vec<_>>(),
            "edges": edges.iter().map(|(s, t)| serde_json::json!({"source": s, "target": t})).collect::<Vec<_>>(),
        }))
        .unwrap();
        Graph::normalize(raw).unwrap()
    }

    #[test]
    fn detects_cycle() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let err = topological_order(&g).unwrap_err();
        assert_eq!(err.category, ErrorCategory::GraphCyclic);
    }

    #[test]
    fn orders_acyclic_graph() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let order = topological_order(&g).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn ancestor_closure_stops_at_roots() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("d", "c")]);
        let mut closure: Vec<String> = ancestor_closure(&g, "c").into_iter().collect();
        closure.sort();
        assert_eq!(closure, vec!["a", "b", "c", "d"]);
    }
}
