//! Graph fixtures mirroring a note-writing pipeline: discover a topic list,
//! fan one worker out per topic, collect the notes.

use super::steps::{FlakyZettelWorker, SpawnStep, UpdateStep, ZettelWorker};
use serde_json::{json, Value};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use superstep::graphs::{Graph, GraphBuilder};
use superstep::schema::StateSchema;
use superstep::step::Step;
use superstep::types::NodeKind;

pub fn zettel_schema() -> StateSchema {
    StateSchema::builder()
        .replace("topic")
        .accumulate("zettels")
        .build()
}

pub fn topic_inputs(topics: &[&str]) -> Vec<Value> {
    topics.iter().map(|t| json!({ "topic": t })).collect()
}

fn zettel_graph_with_worker(topics: &[&str], worker: impl Step + 'static) -> Graph {
    GraphBuilder::new(zettel_schema())
        .add_node("discover", UpdateStep::new("topic", json!("zettelkasten")))
        .add_node("plan", SpawnStep::new("worker", topic_inputs(topics)))
        .add_node("worker", worker)
        .add_edge(NodeKind::Start, "discover")
        .add_edge("discover", "plan")
        .add_edge("plan", "worker")
        .add_edge("worker", NodeKind::End)
        .compile()
        .expect("fixture graph compiles")
}

/// Three-superstep pipeline with a reliable worker.
pub fn zettel_graph(topics: &[&str]) -> Graph {
    zettel_graph_with_worker(topics, ZettelWorker)
}

/// Same pipeline, with a worker that fails its first `failures` invocations.
/// Returns the shared failure counter for later inspection.
pub fn flaky_zettel_graph(topics: &[&str], failures: usize) -> (Graph, Arc<AtomicUsize>) {
    let remaining = Arc::new(AtomicUsize::new(failures));
    let graph = zettel_graph_with_worker(
        topics,
        FlakyZettelWorker {
            remaining_failures: Arc::clone(&remaining),
        },
    );
    (graph, remaining)
}
