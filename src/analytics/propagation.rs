//! Propagation cost: `reach_pairs / n(n-1)`, where `reach_pairs`
//! sums the transitive-closure cardinality — for every node, how many other
//! nodes it can reach.

use crate::graph::Graph;

pub fn compute(graph: &Graph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }

    let mut reach_pairs: u64 = 0;
    for node in graph.node_indices() {
        let symbol_id = graph.symbol_of(node);
        let reachable = graph.bfs(symbol_id, petgraph::Direction::Outgoing, usize::MAX);
        // bfs includes the start node itself at depth 0; exclude it.
        reach_pairs += reachable.len().saturating_sub(1) as u64;
    }

    reach_pairs as f64 / (n as f64 * (n - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, SymbolId};

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_empty_and_singleton_graphs_are_zero() {
        assert_eq!(compute(&Graph::new()), 0.0);
        let graph = Graph::build([sid(1)], &[]);
        assert_eq!(compute(&graph), 0.0);
    }

    #[test]
    fn test_fully_connected_chain() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        // reach pairs: 1->{2,3}=2, 2->{3}=1, 3->{}=0. total=3. n(n-1)=6.
        let cost = compute(&graph);
        assert!((cost - 0.5).abs() < 1e-9);
    }
}
