//! Fluent construction of task graphs.
//!
//! ```rust
//! use superstep::graphs::GraphBuilder;
//! use superstep::schema::StateSchema;
//! use superstep::types::NodeKind;
//! # use async_trait::async_trait;
//! # use superstep::state::StateSnapshot;
//! # use superstep::step::{Step, StepContext, StepError, StepOutput};
//! # struct Noop;
//! # #[async_trait]
//! # impl Step for Noop {
//! #     async fn run(&self, _s: StateSnapshot, _c: StepContext) -> Result<StepOutput, StepError> {
//! #         Ok(StepOutput::empty())
//! #     }
//! # }
//!
//! let schema = StateSchema::builder().replace("topic").build();
//! let graph = GraphBuilder::new(schema)
//!     .add_node("discover", Noop)
//!     .add_edge(NodeKind::Start, "discover")
//!     .add_edge("discover", NodeKind::End)
//!     .compile()
//!     .unwrap();
//! assert!(graph.contains_node(&NodeKind::Custom("discover".into())));
//! ```

use super::compilation::{self, GraphError};
use super::Graph;
use crate::runtimes::RuntimeConfig;
use crate::schema::StateSchema;
use crate::step::Step;
use crate::types::NodeKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Accepts anything node-ish in builder calls: `NodeKind` values or bare
/// names, which become `Custom` nodes.
pub trait IntoNodeKind {
    fn into_node_kind(self) -> NodeKind;
}

impl IntoNodeKind for NodeKind {
    fn into_node_kind(self) -> NodeKind {
        self
    }
}

impl IntoNodeKind for &str {
    fn into_node_kind(self) -> NodeKind {
        NodeKind::from(self)
    }
}

impl IntoNodeKind for String {
    fn into_node_kind(self) -> NodeKind {
        NodeKind::from(self.as_str())
    }
}

/// Mutable accumulation of nodes and edges, finalized by [`compile`].
///
/// Structural mistakes (duplicate names, reserved names) are recorded as
/// they happen and surfaced from `compile` so a builder chain never panics.
///
/// [`compile`]: GraphBuilder::compile
pub struct GraphBuilder {
    schema: Arc<StateSchema>,
    nodes: FxHashMap<NodeKind, Arc<dyn Step>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    runtime_config: RuntimeConfig,
    build_errors: Vec<GraphError>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            runtime_config: RuntimeConfig::default(),
            build_errors: Vec::new(),
        }
    }

    /// Register a step under a graph-unique name.
    #[must_use]
    pub fn add_node(mut self, name: impl IntoNodeKind, step: impl Step + 'static) -> Self {
        let kind = name.into_node_kind();
        if kind.is_start() || kind.is_end() {
            self.build_errors.push(GraphError::ReservedNode {
                node: kind.clone(),
            });
            return self;
        }
        if self.nodes.contains_key(&kind) {
            self.build_errors.push(GraphError::DuplicateNode {
                node: kind.clone(),
            });
            return self;
        }
        self.nodes.insert(kind, Arc::new(step));
        self
    }

    /// Add a directed edge. Both endpoints are checked at compile time, not
    /// here, so registration order does not matter.
    #[must_use]
    pub fn add_edge(mut self, from: impl IntoNodeKind, to: impl IntoNodeKind) -> Self {
        let from = from.into_node_kind();
        let to = to.into_node_kind();
        self.edges.entry(from).or_default().push(to);
        self
    }

    #[must_use]
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Validate and freeze the graph.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found: duplicate or reserved
    /// node names, edges naming unregistered nodes, edges into `Start` or
    /// out of `End`, a missing entry edge, or an unreachable node.
    pub fn compile(self) -> Result<Graph, GraphError> {
        if let Some(err) = self.build_errors.into_iter().next() {
            return Err(err);
        }
        compilation::validate(&self.nodes, &self.edges)?;
        Ok(Graph {
            schema: self.schema,
            nodes: self.nodes,
            edges: self.edges,
            runtime_config: self.runtime_config,
        })
    }
}
