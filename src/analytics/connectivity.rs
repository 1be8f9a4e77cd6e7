//! Algebraic connectivity: the second-smallest eigenvalue of the
//! Laplacian of the graph's undirected projection, a.k.a. the Fiedler value.
//!
//! No linear-algebra crate is in the dependency stack, so this is a dense
//! power-iteration implementation: find the Laplacian's dominant
//! eigenvalue, shift, then deflate against the known all-ones eigenvector
//! (eigenvalue 0) to recover the second-smallest eigenvalue by power
//! iteration on the shifted, deflated matrix.

use crate::graph::Graph;

const POWER_ITERATIONS: usize = 200;
const EPSILON: f64 = 1e-10;

pub fn compute(graph: &Graph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }

    let nodes: Vec<_> = graph.node_indices().collect();
    let index_of: std::collections::HashMap<_, usize> =
        nodes.iter().enumerate().map(|(i, &node)| (node, i)).collect();

    // Undirected adjacency: edge present if either direction exists.
    let mut adjacency = vec![vec![0.0f64; n]; n];
    for &node in &nodes {
        let i = index_of[&node];
        for neighbor in graph.outgoing(graph.symbol_of(node)) {
            if let Some(&j) = graph.node_index_of(neighbor).and_then(|n| index_of.get(&n)) {
                adjacency[i][j] = 1.0;
                adjacency[j][i] = 1.0;
            }
        }
    }

    let mut laplacian = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        let degree: f64 = adjacency[i].iter().sum();
        laplacian[i][i] = degree;
        for j in 0..n {
            if i != j {
                laplacian[i][j] = -adjacency[i][j];
            }
        }
    }

    let lambda_max = dominant_eigenvalue(&laplacian, n);

    // Shifted matrix M = lambda_max * I - L; its dominant eigenvector is
    // the all-ones vector (L's eigenvalue 0 becomes lambda_max). Deflate
    // against it to find M's second-largest eigenvalue, i.e. L's
    // second-smallest eigenvalue (the algebraic connectivity).
    let mut shifted = laplacian.clone();
    for i in 0..n {
        shifted[i][i] = lambda_max - shifted[i][i];
        for j in 0..n {
            if i != j {
                shifted[i][j] = -shifted[i][j];
            }
        }
    }

    let ones = vec![1.0 / (n as f64).sqrt(); n];
    let second_largest_shifted = deflated_power_iteration(&shifted, &ones, n);

    (lambda_max - second_largest_shifted).max(0.0)
}

fn dominant_eigenvalue(matrix: &[Vec<f64>], n: usize) -> f64 {
    let mut vector = vec![1.0; n];
    let mut eigenvalue = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let next = mat_vec(matrix, &vector);
        let norm = norm2(&next);
        if norm < EPSILON {
            break;
        }
        eigenvalue = norm;
        vector = next.iter().map(|v| v / norm).collect();
    }
    eigenvalue
}

/// Power iteration deflated against a known eigenvector `known` (assumed
/// unit-normalized), returning the next-dominant eigenvalue of `matrix`.
fn deflated_power_iteration(matrix: &[Vec<f64>], known: &[f64], n: usize) -> f64 {
    let mut vector = vec![1.0; n];
    deflate_in_place(&mut vector, known);
    let mut eigenvalue = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let mut next = mat_vec(matrix, &vector);
        deflate_in_place(&mut next, known);
        let norm = norm2(&next);
        if norm < EPSILON {
            break;
        }
        eigenvalue = norm;
        vector = next.iter().map(|v| v / norm).collect();
    }
    eigenvalue
}

fn deflate_in_place(vector: &mut [f64], known: &[f64]) {
    let projection: f64 = vector.iter().zip(known).map(|(a, b)| a * b).sum();
    for (v, k) in vector.iter_mut().zip(known) {
        *v -= projection * k;
    }
}

fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum()).collect()
}

fn norm2(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, SymbolId};

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_disconnected_graph_has_zero_connectivity() {
        let graph = Graph::build([sid(1), sid(2)], &[]);
        let connectivity = compute(&graph);
        assert!(connectivity.abs() < 1e-6);
    }

    #[test]
    fn test_connected_triangle_has_positive_connectivity() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Call, 1);
        let connectivity = compute(&graph);
        assert!(connectivity > 0.5);
    }

    #[test]
    fn test_single_node_is_zero() {
        let graph = Graph::build([sid(1)], &[]);
        assert_eq!(compute(&graph), 0.0);
    }
}
