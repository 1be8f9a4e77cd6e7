//! Brandes betweenness centrality, normalized. Above
//! `SAMPLING_THRESHOLD` nodes the computation samples source vertices
//! instead of running every-source Brandes, trading exactness for
//! tractable runtime on large graphs.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::graph::Graph;
use crate::types::SymbolId;

/// Above this many nodes, betweenness samples source vertices rather than
/// running the full O(VE) Brandes pass from every node.
const SAMPLING_THRESHOLD: usize = 2_000;
const SAMPLE_SIZE: usize = 500;

pub fn compute(graph: &Graph) -> HashMap<SymbolId, f64> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }

    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let sources: Vec<NodeIndex> = if n > SAMPLING_THRESHOLD {
        nodes.iter().step_by((n / SAMPLE_SIZE).max(1)).copied().collect()
    } else {
        nodes.clone()
    };

    let mut centrality: HashMap<NodeIndex, f64> = nodes.iter().map(|&node| (node, 0.0)).collect();

    for &source in &sources {
        brandes_single_source(graph, source, &mut centrality);
    }

    // Normalize: divide by (n-1)(n-2), scale by sampling ratio if sampled.
    let scale = if sources.len() < nodes.len() {
        nodes.len() as f64 / sources.len() as f64
    } else {
        1.0
    };
    let norm = if n > 2 { ((n - 1) * (n - 2)) as f64 } else { 1.0 };

    nodes
        .into_iter()
        .map(|node| (graph.symbol_of(node), centrality[&node] * scale / norm))
        .collect()
}

/// One source's contribution to betweenness, via Brandes' algorithm:
/// BFS to build shortest-path DAG + dependency counts, then back-propagate.
fn brandes_single_source(graph: &Graph, source: NodeIndex, centrality: &mut HashMap<NodeIndex, f64>) {
    let mut stack = Vec::new();
    let mut predecessors: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    let mut sigma: HashMap<NodeIndex, f64> = HashMap::new();
    let mut dist: HashMap<NodeIndex, i64> = HashMap::new();

    for node in graph.node_indices() {
        predecessors.insert(node, Vec::new());
        sigma.insert(node, 0.0);
        dist.insert(node, -1);
    }
    sigma.insert(source, 1.0);
    dist.insert(source, 0);

    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for edge in graph.inner().edges_directed(v, Direction::Outgoing) {
            let w = edge.target();
            if dist[&w] < 0 {
                dist.insert(w, dist[&v] + 1);
                queue.push_back(w);
            }
            if dist[&w] == dist[&v] + 1 {
                *sigma.get_mut(&w).unwrap() += sigma[&v];
                predecessors.get_mut(&w).unwrap().push(v);
            }
        }
    }

    let mut delta: HashMap<NodeIndex, f64> = graph.node_indices().map(|n| (n, 0.0)).collect();
    while let Some(w) = stack.pop() {
        for &v in &predecessors[&w] {
            let contribution = (sigma[&v] / sigma[&w]) * (1.0 + delta[&w]);
            *delta.get_mut(&v).unwrap() += contribution;
        }
        if w != source {
            *centrality.get_mut(&w).unwrap() += delta[&w];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_betweenness_empty_graph() {
        let graph = Graph::new();
        assert!(compute(&graph).is_empty());
    }

    #[test]
    fn test_bridge_node_has_highest_betweenness() {
        // 1 -> 2 -> 3, 2 is the only path between 1 and 3.
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        let scores = compute(&graph);
        assert!(scores[&sid(2)] >= scores[&sid(1)]);
        assert!(scores[&sid(2)] >= scores[&sid(3)]);
    }
}
