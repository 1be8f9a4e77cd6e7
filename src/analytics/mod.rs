//! GraphAnalytics: PageRank, degrees, betweenness, SCCs/cycles,
//! weakest-edge-in-SCC, propagation cost, algebraic connectivity, Louvain
//! clustering, directory mismatch, and topological layering.
//!
//! All algorithms are hand-rolled over `petgraph`'s `DiGraph`/`UnGraph` node
//! and edge iterators: petgraph ships Tarjan SCC and core traversal but not
//! PageRank, Louvain, or betweenness, so those three operate at the same
//! raw `NodeIndex`/`EdgeRef` level rather than reaching for a dedicated
//! graph-analytics crate.

pub mod betweenness;
pub mod connectivity;
pub mod layers;
pub mod louvain;
pub mod pagerank;
pub mod propagation;
pub mod scc;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::graph::Graph;
use crate::model::{Cluster, GraphMetrics};
use crate::types::SymbolId;

/// Coarse-grained cancellation, checked between major phases :
/// each PageRank iteration, each Louvain pass, and per-SCC in the
/// cycle/weakest-edge scan.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A cycle (SCC of size >= 2) with its computed weakest edge.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub members: Vec<SymbolId>,
    pub weakest_edge: Option<scc::WeakestEdge>,
}

/// Everything GraphAnalytics computes in one pass over a `Graph`, ready to
/// be persisted into `GraphMetrics`/`Cluster` by the caller as part of
/// indexing.
pub struct AnalyticsReport {
    pub graph_metrics: Vec<GraphMetrics>,
    pub clusters: Vec<Cluster>,
    pub cycles: Vec<CycleReport>,
    pub propagation_cost: f64,
    pub algebraic_connectivity: f64,
    pub layers: HashMap<SymbolId, u32>,
    pub layer_violations: Vec<(SymbolId, SymbolId)>,
}

/// Facade over the individual analytics passes. Returns partial results
/// (best-effort) if cancelled mid-way; callers should check
/// `token.is_cancelled()` after the call if they need to distinguish a
/// completed run from a cancelled one.
pub fn run(graph: &Graph, token: &CancellationToken) -> AnalyticsReport {
    let pagerank_scores = pagerank::compute(graph, token);
    let betweenness_scores = betweenness::compute(graph);

    let mut graph_metrics = Vec::with_capacity(graph.node_count());
    for node in graph.node_indices() {
        let symbol_id = graph.symbol_of(node);
        graph_metrics.push(GraphMetrics {
            symbol_id,
            pagerank: pagerank_scores.get(&symbol_id).copied().unwrap_or(0.0),
            in_degree: graph.in_degree(node) as u32,
            out_degree: graph.out_degree(node) as u32,
            betweenness: betweenness_scores.get(&symbol_id).copied().unwrap_or(0.0),
        });
    }

    let sccs = scc::find_sccs(graph);
    let mut cycles = Vec::new();
    for members in sccs {
        if token.is_cancelled() {
            break;
        }
        if members.len() < 2 {
            continue;
        }
        let weakest_edge = scc::weakest_edge(graph, &members, &pagerank_scores);
        cycles.push(CycleReport { members, weakest_edge });
    }

    let propagation_cost = propagation::compute(graph);
    let algebraic_connectivity = connectivity::compute(graph);

    let cluster_assignment = louvain::compute(graph, &pagerank_scores, token);
    let clusters = cluster_assignment
        .into_iter()
        .map(|(symbol_id, (cluster_id, cluster_label))| Cluster {
            symbol_id,
            cluster_id,
            cluster_label,
        })
        .collect::<Vec<_>>();

    let layers = layers::compute(graph);
    let layer_violations = layers::violations(graph, &layers);

    AnalyticsReport {
        graph_metrics,
        clusters,
        cycles,
        propagation_cost,
        algebraic_connectivity,
        layers,
        layer_violations,
    }
}

/// Directory mismatch: clusters whose member files fall into
/// more than one top-level directory. Takes `clusters` plus a
/// symbol-to-file-path lookup, both of which live outside `Graph`, so this
/// runs as a second pass over `AnalyticsReport::clusters` rather than inside
/// `run`.
pub fn directory_mismatches(
    clusters: &[Cluster],
    file_path_of_symbol: impl Fn(SymbolId) -> Option<String>,
) -> Vec<crate::types::ClusterId> {
    let mut top_level_dirs_by_cluster: HashMap<crate::types::ClusterId, std::collections::HashSet<String>> =
        HashMap::new();

    for cluster in clusters {
        let Some(path) = file_path_of_symbol(cluster.symbol_id) else { continue };
        let top_level = path.split('/').next().unwrap_or("").to_string();
        top_level_dirs_by_cluster.entry(cluster.cluster_id).or_default().insert(top_level);
    }

    let mut mismatches: Vec<crate::types::ClusterId> = top_level_dirs_by_cluster
        .into_iter()
        .filter(|(_, dirs)| dirs.len() > 1)
        .map(|(cluster_id, _)| cluster_id)
        .collect();
    mismatches.sort_by_key(|id| id.value());
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterId;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_directory_mismatch_flags_cross_directory_clusters() {
        let clusters = vec![
            Cluster { symbol_id: sid(1), cluster_id: ClusterId::new(1).unwrap(), cluster_label: "a".into() },
            Cluster { symbol_id: sid(2), cluster_id: ClusterId::new(1).unwrap(), cluster_label: "a".into() },
        ];
        let paths: HashMap<SymbolId, String> = [
            (sid(1), "src/foo.rs".to_string()),
            (sid(2), "tools/bar.rs".to_string()),
        ]
        .into_iter()
        .collect();

        let mismatches = directory_mismatches(&clusters, |id| paths.get(&id).cloned());
        assert_eq!(mismatches, vec![ClusterId::new(1).unwrap()]);
    }

    #[test]
    fn test_directory_mismatch_ignores_single_directory_clusters() {
        let clusters = vec![
            Cluster { symbol_id: sid(1), cluster_id: ClusterId::new(2).unwrap(), cluster_label: "b".into() },
            Cluster { symbol_id: sid(2), cluster_id: ClusterId::new(2).unwrap(), cluster_label: "b".into() },
        ];
        let paths: HashMap<SymbolId, String> = [
            (sid(1), "src/foo.rs".to_string()),
            (sid(2), "src/bar.rs".to_string()),
        ]
        .into_iter()
        .collect();

        let mismatches = directory_mismatches(&clusters, |id| paths.get(&id).cloned());
        assert!(mismatches.is_empty());
    }
}
