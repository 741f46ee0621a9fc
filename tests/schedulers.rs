mod common;

use common::steps::{FailingStep, SlowTagStep, UpdateStep};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use superstep::graphs::{Graph, GraphBuilder};
use superstep::schedulers::{Scheduler, SchedulerError};
use superstep::schema::StateSchema;
use superstep::state::RunState;
use superstep::types::{NodeKind, Task};

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

fn fan_graph(count: usize, peak: &Arc<AtomicUsize>, in_flight: &Arc<AtomicUsize>) -> Graph {
    let mut builder = GraphBuilder::new(StateSchema::builder().accumulate("tags").build());
    for i in 0..count {
        let name = format!("n{i}");
        builder = builder
            .add_node(
                name.as_str(),
                SlowTagStep {
                    field: "tags".to_string(),
                    tag: json!(i),
                    delay: Duration::from_millis(20),
                    peak: Arc::clone(peak),
                    in_flight: Arc::clone(in_flight),
                },
            )
            .add_edge(NodeKind::Start, name.as_str())
            .add_edge(name.as_str(), NodeKind::End);
    }
    builder.compile().unwrap()
}

#[tokio::test]
async fn concurrency_never_exceeds_the_limit() {
    let peak = Arc::new(AtomicUsize::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let graph = fan_graph(8, &peak, &in_flight);
    let state = RunState::init(Arc::clone(graph.schema()), Default::default()).unwrap();

    let frontier: Vec<Task> = (0..8).map(|i| Task::shared(custom(&format!("n{i}")))).collect();
    let result = Scheduler::new(3)
        .superstep(&graph, &frontier, &state.snapshot(), 1)
        .await
        .unwrap();

    assert_eq!(result.outputs.len(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn end_tasks_are_skipped() {
    let graph = GraphBuilder::new(StateSchema::builder().replace("x").build())
        .add_node("a", UpdateStep::new("x", json!(1)))
        .add_edge(NodeKind::Start, "a")
        .add_edge("a", NodeKind::End)
        .compile()
        .unwrap();
    let state = RunState::init(Arc::clone(graph.schema()), Default::default()).unwrap();

    let frontier = vec![Task::shared(custom("a")), Task::shared(NodeKind::End)];
    let result = Scheduler::new(4)
        .superstep(&graph, &frontier, &state.snapshot(), 1)
        .await
        .unwrap();
    assert_eq!(result.outputs.len(), 1);
    assert_eq!(result.outputs[0].0.node, custom("a"));
}

#[tokio::test]
async fn first_failure_fails_the_superstep() {
    let graph = GraphBuilder::new(StateSchema::builder().replace("x").build())
        .add_node("ok", UpdateStep::new("x", json!(1)))
        .add_node("bad", FailingStep)
        .add_edge(NodeKind::Start, "ok")
        .add_edge(NodeKind::Start, "bad")
        .add_edge("ok", NodeKind::End)
        .add_edge("bad", NodeKind::End)
        .compile()
        .unwrap();
    let state = RunState::init(Arc::clone(graph.schema()), Default::default()).unwrap();

    let frontier = vec![Task::shared(custom("ok")), Task::shared(custom("bad"))];
    let err = Scheduler::new(4)
        .superstep(&graph, &frontier, &state.snapshot(), 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::TaskFailed { ref node, step: 3, .. } if *node == custom("bad")
    ));
}

#[tokio::test]
async fn unknown_frontier_node_is_an_error() {
    let graph = GraphBuilder::new(StateSchema::builder().replace("x").build())
        .add_node("a", UpdateStep::new("x", json!(1)))
        .add_edge(NodeKind::Start, "a")
        .add_edge("a", NodeKind::End)
        .compile()
        .unwrap();
    let state = RunState::init(Arc::clone(graph.schema()), Default::default()).unwrap();

    let err = Scheduler::new(1)
        .superstep(&graph, &[Task::shared(custom("ghost"))], &state.snapshot(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownNode { .. }));
}
