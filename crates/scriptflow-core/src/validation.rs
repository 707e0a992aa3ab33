use crate::{Edge, EdgeId, Node, NodeId, SubstitutionRule};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Problems that make a run behave differently from what the graph suggests.
///
/// None of these block execution: nodes always run in declaration order and
/// a missing dependency just leaves the placeholder in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphWarning {
    #[error("Node id {0} is declared more than once")]
    DuplicateNode(NodeId),

    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    #[error("Substitution rule references missing node {0}")]
    UnknownRuleNode(NodeId),

    #[error("Node {upstream} is declared after its dependent {downstream}")]
    DeclaredAfterDependent { upstream: NodeId, downstream: NodeId },
}

pub fn lint_graph(nodes: &[Node], edges: &[Edge], rules: &[SubstitutionRule]) -> Vec<GraphWarning> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    let mut order: HashMap<&NodeId, usize> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        if !seen.insert(&node.id) {
            warnings.push(GraphWarning::DuplicateNode(node.id.clone()));
            continue;
        }
        order.insert(&node.id, idx);
    }

    let check_order = |upstream: &NodeId, downstream: &NodeId, warnings: &mut Vec<GraphWarning>| {
        if let (Some(up), Some(down)) = (order.get(upstream), order.get(downstream))
            && up > down
        {
            let warning = GraphWarning::DeclaredAfterDependent {
                upstream: upstream.clone(),
                downstream: downstream.clone(),
            };
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    };

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !order.contains_key(endpoint) {
                warnings.push(GraphWarning::DanglingEdge {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        check_order(&edge.source, &edge.target, &mut warnings);
    }

    for rule in rules {
        for endpoint in [&rule.source, &rule.target] {
            if !order.contains_key(endpoint) {
                warnings.push(GraphWarning::UnknownRuleNode(endpoint.clone()));
            }
        }
        check_order(&rule.source, &rule.target, &mut warnings);
    }

    warnings
}
