//! The in-memory directed multigraph.
//!
//! Built on `petgraph::graph::DiGraph`. Not a long-lived `RwLock`-guarded
//! singleton: the graph is owned by the current analytics invocation and
//! dropped on return, so `Graph` here is a plain owned value built fresh
//! from a Store read at the start of each `GraphAnalytics`/`QueryEngine`
//! call.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::model::Edge;
use crate::types::{EdgeKind, SymbolId};

/// Edge weight stored on each graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeWeight {
    pub kind: EdgeKind,
    pub line: u32,
}

pub struct Graph {
    inner: DiGraph<SymbolId, EdgeWeight>,
    node_index: HashMap<SymbolId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self { inner: DiGraph::new(), node_index: HashMap::new() }
    }

    /// Build a graph from every symbol id referenced by `edges`, plus an
    /// explicit `all_symbols` set so isolated nodes (no edges at all) are
    /// still present for per-symbol metrics.
    pub fn build(all_symbols: impl IntoIterator<Item = SymbolId>, edges: &[Edge]) -> Self {
        let mut graph = Self::new();
        for id in all_symbols {
            graph.ensure_node(id);
        }
        for edge in edges {
            graph.add_edge(edge.source_id, edge.target_id, edge.kind, edge.line);
        }
        graph
    }

    pub fn ensure_node(&mut self, symbol_id: SymbolId) -> NodeIndex {
        *self.node_index.entry(symbol_id).or_insert_with(|| self.inner.add_node(symbol_id))
    }

    pub fn add_edge(&mut self, source: SymbolId, target: SymbolId, kind: EdgeKind, line: u32) {
        let source_idx = self.ensure_node(source);
        let target_idx = self.ensure_node(target);
        self.inner.add_edge(source_idx, target_idx, EdgeWeight { kind, line });
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn node_index_of(&self, symbol_id: SymbolId) -> Option<NodeIndex> {
        self.node_index.get(&symbol_id).copied()
    }

    pub fn symbol_of(&self, node: NodeIndex) -> SymbolId {
        self.inner[node]
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.inner.node_weights().copied()
    }

    pub fn inner(&self) -> &DiGraph<SymbolId, EdgeWeight> {
        &self.inner
    }

    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.inner.edges_directed(node, Direction::Incoming).count()
    }

    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.inner.edges_directed(node, Direction::Outgoing).count()
    }

    /// Direct callers/referrers of `symbol_id` (incoming edge sources).
    pub fn incoming(&self, symbol_id: SymbolId) -> Vec<SymbolId> {
        let Some(node) = self.node_index_of(symbol_id) else { return Vec::new() };
        self.inner
            .edges_directed(node, Direction::Incoming)
            .map(|edge| self.inner[edge.source()])
            .collect()
    }

    /// Direct callees/referents of `symbol_id` (outgoing edge targets).
    pub fn outgoing(&self, symbol_id: SymbolId) -> Vec<SymbolId> {
        let Some(node) = self.node_index_of(symbol_id) else { return Vec::new() };
        self.inner
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| self.inner[edge.target()])
            .collect()
    }

    /// Breadth-first reachable set from `start`, following the given
    /// direction, bounded by `max_depth` (inclusive). Used by blast-radius
    /// and affected-tests queries.
    pub fn bfs(&self, start: SymbolId, direction: Direction, max_depth: usize) -> HashMap<SymbolId, usize> {
        let mut depths = HashMap::new();
        let Some(start_node) = self.node_index_of(start) else { return depths };
        depths.insert(start, 0);
        let mut frontier = vec![start_node];
        let mut depth = 0;
        while !frontier.is_empty() && depth < max_depth {
            depth += 1;
            let mut next_frontier = Vec::new();
            for node in frontier {
                for edge in self.inner.edges_directed(node, direction) {
                    let neighbor = match direction {
                        Direction::Outgoing => edge.target(),
                        Direction::Incoming => edge.source(),
                    };
                    let neighbor_symbol = self.inner[neighbor];
                    if depths.contains_key(&neighbor_symbol) {
                        continue;
                    }
                    depths.insert(neighbor_symbol, depth);
                    next_frontier.push(neighbor);
                }
            }
            frontier = next_frontier;
        }
        depths
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_build_includes_isolated_nodes() {
        let graph = Graph::build([sid(1), sid(2)], &[]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_incoming_outgoing() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 10);
        graph.add_edge(sid(3), sid(2), EdgeKind::Call, 20);

        let mut incoming = graph.incoming(sid(2));
        incoming.sort_by_key(|s| s.value());
        assert_eq!(incoming, vec![sid(1), sid(3)]);
        assert_eq!(graph.outgoing(sid(1)), vec![sid(2)]);
    }

    #[test]
    fn test_bfs_respects_max_depth() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(4), EdgeKind::Call, 1);

        let depths = graph.bfs(sid(1), Direction::Outgoing, 2);
        assert_eq!(depths.get(&sid(1)), Some(&0));
        assert_eq!(depths.get(&sid(2)), Some(&1));
        assert_eq!(depths.get(&sid(3)), Some(&2));
        assert_eq!(depths.get(&sid(4)), None);
    }

    #[test]
    fn test_bfs_incoming_direction_finds_callers() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        let depths = graph.bfs(sid(2), Direction::Incoming, 5);
        assert_eq!(depths.get(&sid(1)), Some(&1));
    }
}
