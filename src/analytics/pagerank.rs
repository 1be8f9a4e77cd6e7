//! PageRank: damping 0.85, convergence by L1 < 1e-6 or 100
//! iterations, whichever comes first.

use std::collections::HashMap;

use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::CancellationToken;
use crate::graph::Graph;
use crate::types::SymbolId;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const CONVERGENCE_THRESHOLD: f64 = 1e-6;

pub fn compute(graph: &Graph, token: &CancellationToken) -> HashMap<SymbolId, f64> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }

    let nodes: Vec<_> = graph.node_indices().collect();
    let initial = 1.0 / n as f64;
    let mut scores: HashMap<_, f64> = nodes.iter().map(|&node| (node, initial)).collect();

    for _ in 0..MAX_ITERATIONS {
        if token.is_cancelled() {
            break;
        }

        let dangling_mass: f64 = nodes
            .iter()
            .filter(|&&node| graph.out_degree(node) == 0)
            .map(|&node| scores[&node])
            .sum();

        let mut next_scores: HashMap<_, f64> = HashMap::new();
        let base = (1.0 - DAMPING) / n as f64 + DAMPING * dangling_mass / n as f64;
        for &node in &nodes {
            next_scores.insert(node, base);
        }

        for &node in &nodes {
            let out_degree = graph.out_degree(node);
            if out_degree == 0 {
                continue;
            }
            let contribution = DAMPING * scores[&node] / out_degree as f64;
            for edge in graph.inner().edges_directed(node, Direction::Outgoing) {
                *next_scores.get_mut(&edge.target()).unwrap() += contribution;
            }
        }

        let l1_delta: f64 = nodes.iter().map(|node| (next_scores[node] - scores[node]).abs()).sum();
        scores = next_scores;
        if l1_delta < CONVERGENCE_THRESHOLD {
            break;
        }
    }

    nodes.into_iter().map(|node| (graph.symbol_of(node), scores[&node])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_pagerank_uniform_for_disconnected_graph() {
        let graph = Graph::build([sid(1), sid(2), sid(3)], &[]);
        let scores = compute(&graph, &CancellationToken::new());
        for (_, score) in &scores {
            assert!((*score - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pagerank_sums_to_roughly_one() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Call, 1);
        let scores = compute(&graph, &CancellationToken::new());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pagerank_hub_scores_higher() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(4), sid(3), EdgeKind::Call, 1);
        let scores = compute(&graph, &CancellationToken::new());
        assert!(scores[&sid(3)] > scores[&sid(1)]);
    }
}
