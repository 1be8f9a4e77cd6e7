//! Strongly-connected components and the weakest-edge-in-SCC heuristic
//!. Tarjan's algorithm comes straight from `petgraph`; trivial
//! singleton components are excluded here, not by petgraph itself.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::visit::EdgeRef;

use crate::graph::Graph;
use crate::types::SymbolId;

#[derive(Debug, Clone, PartialEq)]
pub struct WeakestEdge {
    pub source: SymbolId,
    pub target: SymbolId,
    pub reason: String,
}

/// All strongly-connected components, including trivial size-1 ones. The
/// caller (`analytics::run`) filters to size >= 2 when building cycle
/// reports; `find_sccs` itself stays a faithful Tarjan wrapper.
pub fn find_sccs(graph: &Graph) -> Vec<Vec<SymbolId>> {
    tarjan_scc(graph.inner())
        .into_iter()
        .map(|component| component.into_iter().map(|node| graph.symbol_of(node)).collect())
        .collect()
}

/// Pick the edge inside `members` whose removal most reduces the SCC's
/// strongly-connected size. Approximated by: for each intra-SCC edge,
/// recompute SCC size on the subgraph with that edge removed; the edge that
/// drops the largest resulting component the most wins. Ties broken by
/// lowest combined PageRank of endpoints.
pub fn weakest_edge(
    graph: &Graph,
    members: &[SymbolId],
    pagerank: &HashMap<SymbolId, f64>,
) -> Option<WeakestEdge> {
    let member_set: HashSet<SymbolId> = members.iter().copied().collect();

    let intra_edges: Vec<(SymbolId, SymbolId)> = members
        .iter()
        .filter_map(|&source| graph.node_index_of(source))
        .flat_map(|node| {
            graph
                .inner()
                .edges_directed(node, petgraph::Direction::Outgoing)
                .map(move |edge| (graph.symbol_of(edge.source()), graph.symbol_of(edge.target())))
        })
        .filter(|(_, target)| member_set.contains(target))
        .collect();

    if intra_edges.is_empty() {
        return None;
    }

    let original_size = members.len();
    let mut best: Option<(usize, f64, SymbolId, SymbolId)> = None;

    for &(source, target) in &intra_edges {
        let remaining_size = largest_scc_without_edge(graph, &member_set, source, target);
        let reduction = original_size.saturating_sub(remaining_size);
        let combined_pagerank = pagerank.get(&source).copied().unwrap_or(0.0)
            + pagerank.get(&target).copied().unwrap_or(0.0);

        let is_better = match &best {
            None => true,
            Some((best_reduction, best_pr, _, _)) => {
                reduction > *best_reduction
                    || (reduction == *best_reduction && combined_pagerank < *best_pr)
            }
        };
        if is_better {
            best = Some((reduction, combined_pagerank, source, target));
        }
    }

    best.map(|(_, _, source, target)| WeakestEdge {
        source,
        target,
        reason: "max-scc-size-reduction".to_string(),
    })
}

/// Size of the largest SCC remaining inside `member_set` once edge
/// `(exclude_source, exclude_target)` is removed from consideration.
fn largest_scc_without_edge(
    graph: &Graph,
    member_set: &HashSet<SymbolId>,
    exclude_source: SymbolId,
    exclude_target: SymbolId,
) -> usize {
    use petgraph::graph::DiGraph;

    let mut sub = DiGraph::<SymbolId, ()>::new();
    let mut indices = HashMap::new();
    for &id in member_set {
        indices.insert(id, sub.add_node(id));
    }
    for &source in member_set {
        let Some(node) = graph.node_index_of(source) else { continue };
        for edge in graph.inner().edges_directed(node, petgraph::Direction::Outgoing) {
            let target = graph.symbol_of(edge.target());
            if !member_set.contains(&target) {
                continue;
            }
            if source == exclude_source && target == exclude_target {
                continue;
            }
            sub.add_edge(indices[&source], indices[&target], ());
        }
    }

    tarjan_scc(&sub).into_iter().map(|c| c.len()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_acyclic_graph_has_only_singletons() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        let sccs = find_sccs(&graph);
        assert!(sccs.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_three_cycle_forms_one_scc() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Call, 1);
        let sccs = find_sccs(&graph);
        let big = sccs.iter().find(|c| c.len() == 3).unwrap();
        assert_eq!(big.len(), 3);
    }

    #[test]
    fn test_weakest_edge_breaks_the_cycle() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Call, 1);
        let members = vec![sid(1), sid(2), sid(3)];
        let pagerank = HashMap::new();
        let weakest = weakest_edge(&graph, &members, &pagerank).unwrap();
        assert!(members.contains(&weakest.source));
        assert!(members.contains(&weakest.target));
    }
}
