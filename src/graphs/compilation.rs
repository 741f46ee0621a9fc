//! Structural validation performed once at compile time.

use crate::step::Step;
use crate::types::NodeKind;
use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// A structural defect caught before the graph is frozen.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node `{node}` registered twice")]
    #[diagnostic(code(superstep::graph::duplicate_node))]
    DuplicateNode { node: NodeKind },

    #[error("`{node}` is a reserved virtual endpoint and cannot carry a step")]
    #[diagnostic(
        code(superstep::graph::reserved_node),
        help("Start and End are structural; register your step under a different name")
    )]
    ReservedNode { node: NodeKind },

    #[error("edge {from} -> {to} names an unregistered node")]
    #[diagnostic(code(superstep::graph::dangling_edge))]
    DanglingEdge { from: NodeKind, to: NodeKind },

    #[error("edge {from} -> Start is not allowed")]
    #[diagnostic(
        code(superstep::graph::edge_into_start),
        help("Start only emits edges; loop back to a named node instead")
    )]
    EdgeIntoStart { from: NodeKind },

    #[error("edge End -> {to} is not allowed")]
    #[diagnostic(code(superstep::graph::edge_from_end))]
    EdgeFromEnd { to: NodeKind },

    #[error("graph has no edges out of Start")]
    #[diagnostic(
        code(superstep::graph::no_entry),
        help("add at least one edge from NodeKind::Start to an entry node")
    )]
    NoEntryEdges,

    #[error("node `{node}` is unreachable from Start")]
    #[diagnostic(code(superstep::graph::unreachable))]
    Unreachable { node: NodeKind },
}

/// Check edge endpoints, entry edges, and reachability.
///
/// Spawn targets are not derivable from edges, so reachability here is a
/// static approximation: a registered node with no inbound path from `Start`
/// is still rejected, since nothing could ever schedule it statically and
/// dynamic-only nodes must still be wired in via an edge from their spawner.
pub(super) fn validate(
    nodes: &FxHashMap<NodeKind, Arc<dyn Step>>,
    edges: &FxHashMap<NodeKind, Vec<NodeKind>>,
) -> Result<(), GraphError> {
    let is_known = |kind: &NodeKind| {
        kind.is_start() || kind.is_end() || nodes.contains_key(kind)
    };

    for (from, targets) in edges {
        if from.is_end() {
            // First target is enough to name in the error.
            if let Some(to) = targets.first() {
                return Err(GraphError::EdgeFromEnd { to: to.clone() });
            }
        }
        if !is_known(from) {
            return Err(GraphError::DanglingEdge {
                from: from.clone(),
                to: targets.first().cloned().unwrap_or(NodeKind::End),
            });
        }
        for to in targets {
            if to.is_start() {
                return Err(GraphError::EdgeIntoStart { from: from.clone() });
            }
            if !is_known(to) {
                return Err(GraphError::DanglingEdge {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
    }

    let entry = edges.get(&NodeKind::Start);
    if entry.is_none_or(Vec::is_empty) {
        return Err(GraphError::NoEntryEdges);
    }

    // BFS from Start over the static edges.
    let mut seen: FxHashSet<NodeKind> = FxHashSet::default();
    let mut queue: VecDeque<NodeKind> = VecDeque::new();
    seen.insert(NodeKind::Start);
    queue.push_back(NodeKind::Start);
    while let Some(current) = queue.pop_front() {
        for next in edges.get(&current).map_or(&[][..], Vec::as_slice) {
            if seen.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }
    for node in nodes.keys() {
        if !seen.contains(node) {
            return Err(GraphError::Unreachable { node: node.clone() });
        }
    }
    Ok(())
}
