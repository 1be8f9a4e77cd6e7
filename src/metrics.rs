//! Per-symbol complexity metrics.
//!
//! Inputs come from the extractor's AST, reduced to a flat `AstNode` stream
//! per function-like symbol. The algorithm itself is language-agnostic: it
//! only cares whether a node is a branch, loop, boolean operator, return,
//! or nested function expression, and how deeply nested it is.

use crate::extractor::{AstNode, AstNodeKind};
use crate::model::SymbolMetrics;
use crate::types::SymbolId;

/// Raw operator/operand counts feeding the Halstead quartet. A frontend may
/// not always have these; when absent, Halstead metrics degrade to zero
/// rather than erroring, since they are secondary signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalsteadCounts {
    pub distinct_operators: u32,
    pub distinct_operands: u32,
    pub total_operators: u32,
    pub total_operands: u32,
}

impl HalsteadCounts {
    fn volume(&self) -> f64 {
        let vocabulary = (self.distinct_operators + self.distinct_operands) as f64;
        let length = (self.total_operators + self.total_operands) as f64;
        if vocabulary <= 1.0 || length == 0.0 {
            return 0.0;
        }
        length * vocabulary.log2()
    }

    fn difficulty(&self) -> f64 {
        if self.distinct_operands == 0 {
            return 0.0;
        }
        (self.distinct_operators as f64 / 2.0) * (self.total_operands as f64 / self.distinct_operands as f64)
    }
}

/// Compute the per-symbol complexity metrics for one function-like symbol
/// given its AST node stream and a few structural counts the extractor
/// reports directly: `param_count`, `line_count`.
pub fn compute(
    symbol_id: SymbolId,
    nodes: &[AstNode],
    param_count: u32,
    line_count: u32,
    halstead: HalsteadCounts,
) -> SymbolMetrics {
    let mut cognitive_complexity: u32 = 0;
    let mut nesting_depth: u32 = 0;
    let mut return_count: u32 = 0;
    let mut bool_op_count: u32 = 0;
    let mut callback_depth: u32 = 0;
    let mut cyclomatic: u32 = 1; // base path

    for node in nodes {
        match node.kind {
            AstNodeKind::Branch | AstNodeKind::Loop => {
                // +1 per construct, each nested occurrence adds the current
                // nesting depth on top (standard cognitive-complexity rubric).
                cognitive_complexity += 1 + node.depth;
                nesting_depth = nesting_depth.max(node.depth + 1);
                cyclomatic += 1;
            }
            AstNodeKind::BoolOp => {
                cognitive_complexity += 1;
                bool_op_count += 1;
            }
            AstNodeKind::Return => {
                return_count += 1;
            }
            AstNodeKind::NestedFunction => {
                callback_depth = callback_depth.max(node.depth + 1);
            }
            AstNodeKind::Other => {}
        }
    }

    let cyclomatic_density = if line_count > 0 {
        cyclomatic as f64 / line_count as f64
    } else {
        0.0
    };

    let halstead_volume = halstead.volume();
    let halstead_difficulty = halstead.difficulty();
    let halstead_effort = halstead_volume * halstead_difficulty;
    let halstead_bugs = halstead_volume / 3000.0;

    SymbolMetrics {
        symbol_id,
        cognitive_complexity,
        nesting_depth,
        param_count,
        line_count,
        return_count,
        bool_op_count,
        callback_depth,
        cyclomatic_density,
        halstead_volume,
        halstead_difficulty,
        halstead_effort,
        halstead_bugs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> SymbolId {
        SymbolId::new(1).unwrap()
    }

    #[test]
    fn test_flat_function_has_baseline_complexity() {
        let nodes = vec![];
        let metrics = compute(sid(), &nodes, 0, 5, HalsteadCounts::default());
        assert_eq!(metrics.cognitive_complexity, 0);
        assert_eq!(metrics.nesting_depth, 0);
    }

    #[test]
    fn test_nested_branch_adds_depth_penalty() {
        let nodes = vec![
            AstNode { kind: AstNodeKind::Branch, depth: 0 },
            AstNode { kind: AstNodeKind::Branch, depth: 1 },
        ];
        let metrics = compute(sid(), &nodes, 0, 10, HalsteadCounts::default());
        // outer: +1, inner: +1 (base) + 1 (depth) = 2, total 3
        assert_eq!(metrics.cognitive_complexity, 3);
        assert_eq!(metrics.nesting_depth, 2);
    }

    #[test]
    fn test_bool_op_and_return_counts() {
        let nodes = vec![
            AstNode { kind: AstNodeKind::BoolOp, depth: 0 },
            AstNode { kind: AstNodeKind::BoolOp, depth: 0 },
            AstNode { kind: AstNodeKind::Return, depth: 0 },
        ];
        let metrics = compute(sid(), &nodes, 2, 8, HalsteadCounts::default());
        assert_eq!(metrics.bool_op_count, 2);
        assert_eq!(metrics.return_count, 1);
        assert_eq!(metrics.param_count, 2);
    }

    #[test]
    fn test_halstead_bugs_is_volume_over_3000() {
        let halstead = HalsteadCounts {
            distinct_operators: 4,
            distinct_operands: 6,
            total_operators: 20,
            total_operands: 30,
        };
        let metrics = compute(sid(), &[], 0, 40, halstead);
        assert!((metrics.halstead_bugs - metrics.halstead_volume / 3000.0).abs() < 1e-9);
        assert!(metrics.halstead_volume > 0.0);
    }

    #[test]
    fn test_cyclomatic_density_scales_with_lines() {
        let nodes = vec![AstNode { kind: AstNodeKind::Branch, depth: 0 }];
        let metrics = compute(sid(), &nodes, 0, 100, HalsteadCounts::default());
        // cyclomatic = 2 (base 1 + one branch), over 100 lines
        assert!((metrics.cyclomatic_density - 0.02).abs() < 1e-9);
    }
}
