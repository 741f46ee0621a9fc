//! Bulk-synchronous task-graph executor with checkpointed supersteps.
//!
//! A run executes a fixed graph of named steps in lockstep rounds: every
//! task in the current frontier runs concurrently against the same immutable
//! state snapshot, all outputs are merged at a barrier through per-field
//! reducers, the next frontier is derived (static edges, or dynamic spawn
//! fan-out overriding them), and a checkpoint is saved. Interrupt the process
//! at any point and a later [`Runner::resume`] picks up from the last
//! committed superstep.
//!
//! # Quick start
//!
//! ```rust
//! use async_trait::async_trait;
//! use rustc_hash::FxHashMap;
//! use std::sync::Arc;
//! use superstep::graphs::GraphBuilder;
//! use superstep::runtimes::{InMemoryStore, Runner};
//! use superstep::schema::StateSchema;
//! use superstep::state::StateSnapshot;
//! use superstep::step::{Step, StepContext, StepError, StepOutput};
//! use superstep::types::NodeKind;
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Step for Greet {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: StepContext,
//!     ) -> Result<StepOutput, StepError> {
//!         Ok(StepOutput::update([("greeting", serde_json::json!("hello"))]))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = StateSchema::builder().replace("greeting").build();
//! let graph = GraphBuilder::new(schema)
//!     .add_node("greet", Greet)
//!     .add_edge(NodeKind::Start, "greet")
//!     .add_edge("greet", NodeKind::End)
//!     .compile()?;
//!
//! let store = Arc::new(InMemoryStore::new(Arc::clone(graph.schema())));
//! let runner = Runner::new(graph, store);
//! let handle = runner.start("run-1", FxHashMap::default()).await?;
//! let state = handle.join().await?;
//! assert_eq!(state.value("greeting"), Some(&serde_json::json!("hello")));
//! # Ok(())
//! # }
//! ```
//!
//! [`Runner::resume`]: runtimes::Runner::resume

pub mod dispatcher;
pub mod graphs;
pub mod reducers;
pub mod runtimes;
pub mod schedulers;
pub mod schema;
pub mod state;
pub mod step;
pub mod telemetry;
pub mod types;
pub mod utils;
