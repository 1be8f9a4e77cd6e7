//! Topological layering: heuristic leveling on the DAG of SCCs.
//!
//! Layer 0 is assigned to "sink" components (nothing they call is itself
//! calling back into the graph — typically foundational/utility code);
//! layer increases with distance from a sink along call edges, so a typical
//! caller sits at a higher layer than its callees. A layer violation is an
//! edge that runs the other way: a lower-layer component reaching back up
//! into a higher layer.

use std::collections::HashMap;

use petgraph::algo::{condensation, toposort};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::graph::Graph;
use crate::types::SymbolId;

pub fn compute(graph: &Graph) -> HashMap<SymbolId, u32> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }

    let collapsed = condensation(graph.inner().clone(), true);
    let order = toposort(&collapsed, None).unwrap_or_default();

    let mut layer_of_component: HashMap<NodeIndex, u32> = HashMap::new();
    for &node in order.iter().rev() {
        let out_layers: Vec<u32> = collapsed
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| layer_of_component.get(&edge.target()).copied().unwrap_or(0))
            .collect();
        let layer = out_layers.into_iter().max().map(|m| m + 1).unwrap_or(0);
        layer_of_component.insert(node, layer);
    }

    let mut layers = HashMap::new();
    for node in collapsed.node_indices() {
        let layer = layer_of_component.get(&node).copied().unwrap_or(0);
        for &symbol_id in &collapsed[node] {
            layers.insert(symbol_id, layer);
        }
    }
    layers
}

/// Edges whose source layer is less than their target layer:
/// both endpoints must have defined layers.
pub fn violations(graph: &Graph, layers: &HashMap<SymbolId, u32>) -> Vec<(SymbolId, SymbolId)> {
    let mut out = Vec::new();
    for node in graph.node_indices() {
        let source = graph.symbol_of(node);
        let Some(&source_layer) = layers.get(&source) else { continue };
        for target in graph.outgoing(source) {
            let Some(&target_layer) = layers.get(&target) else { continue };
            if source_layer < target_layer {
                out.push((source, target));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_leaf_has_layer_zero() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        let layers = compute(&graph);
        assert_eq!(layers[&sid(2)], 0);
        assert_eq!(layers[&sid(1)], 1);
    }

    #[test]
    fn test_chain_layers_increase_toward_root() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        let layers = compute(&graph);
        assert!(layers[&sid(1)] > layers[&sid(2)]);
        assert!(layers[&sid(2)] > layers[&sid(3)]);
    }

    #[test]
    fn test_backward_edge_is_a_violation() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Reference, 5);
        let layers = compute(&graph);
        let violations = violations(&graph, &layers);
        assert!(!violations.is_empty());
    }
}
