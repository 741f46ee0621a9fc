//! Graph definition: fixed topology over named steps.
//!
//! Graphs are built with [`GraphBuilder`] and frozen by
//! [`GraphBuilder::compile`], which validates the topology once so the
//! scheduler never has to re-check it mid-run.

mod builder;
mod compilation;

pub use builder::{GraphBuilder, IntoNodeKind};
pub use compilation::GraphError;

use crate::runtimes::RuntimeConfig;
use crate::schema::StateSchema;
use crate::step::Step;
use crate::types::NodeKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A compiled, validated task graph. Immutable once compiled; runs share it
/// behind an `Arc`.
#[derive(Clone)]
pub struct Graph {
    schema: Arc<StateSchema>,
    nodes: FxHashMap<NodeKind, Arc<dyn Step>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    runtime_config: RuntimeConfig,
}

impl Graph {
    #[must_use]
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Step>> {
        &self.nodes
    }

    /// The static successors of `node`, in registration order.
    #[must_use]
    pub fn successors(&self, node: &NodeKind) -> &[NodeKind] {
        self.edges.get(node).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains_node(&self, node: &NodeKind) -> bool {
        self.nodes.contains_key(node)
    }

    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// The frontier a fresh run starts from: `Start`'s static successors,
    /// deduplicated the same way the dispatcher dedups static routing.
    #[must_use]
    pub fn entry_frontier(&self) -> Vec<crate::types::Task> {
        let mut seen: rustc_hash::FxHashSet<&NodeKind> = rustc_hash::FxHashSet::default();
        self.successors(&NodeKind::Start)
            .iter()
            .filter(|node| seen.insert(node))
            .cloned()
            .map(crate::types::Task::shared)
            .collect()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}
