//! Frontier computation between supersteps.
//!
//! After a superstep's outputs are collected, the dispatcher decides what
//! runs next: nodes that returned updates route along their static edges,
//! while a spawn output *replaces* the node's static successors with the
//! spawned tasks for this transition only.
//!
//! Statically routed tasks are deduplicated (two parents converging on one
//! child schedule it once). Spawned tasks are never deduplicated; spawning
//! the same target K times runs it K times, each with its own input.

use crate::graphs::Graph;
use crate::step::StepOutput;
use crate::types::{NodeKind, Task};
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

/// A routing failure while building the next frontier. This fails the run
/// before the frontier is committed.
#[derive(Debug, Error, Diagnostic)]
pub enum DispatchError {
    #[error("node {origin} spawned unknown target `{target}`")]
    #[diagnostic(
        code(superstep::dispatch::unknown_spawn_target),
        help("spawn targets must be nodes registered on the graph")
    )]
    UnknownSpawnTarget { origin: NodeKind, target: NodeKind },

    #[error("node {origin} spawned virtual endpoint {target}")]
    #[diagnostic(
        code(superstep::dispatch::virtual_spawn_target),
        help("route to End with a static edge instead of a spawn")
    )]
    VirtualSpawnTarget { origin: NodeKind, target: NodeKind },
}

/// Compute the frontier for the next superstep from this superstep's
/// outputs, in task completion order.
pub fn next_frontier(
    graph: &Graph,
    outputs: &[(Task, StepOutput)],
) -> Result<Vec<Task>, DispatchError> {
    let mut frontier: Vec<Task> = Vec::new();
    let mut scheduled_shared: FxHashSet<NodeKind> = FxHashSet::default();

    for (task, output) in outputs {
        match output {
            StepOutput::Spawn(requests) => {
                for request in requests {
                    if request.target.is_start() || request.target.is_end() {
                        return Err(DispatchError::VirtualSpawnTarget {
                            origin: task.node.clone(),
                            target: request.target.clone(),
                        });
                    }
                    if !graph.contains_node(&request.target) {
                        return Err(DispatchError::UnknownSpawnTarget {
                            origin: task.node.clone(),
                            target: request.target.clone(),
                        });
                    }
                    frontier.push(Task::spawned(
                        request.target.clone(),
                        request.input.clone(),
                    ));
                }
                debug!(
                    origin = %task.node,
                    spawned = requests.len(),
                    "static successors overridden by spawn"
                );
            }
            StepOutput::Update(_) => {
                for successor in graph.successors(&task.node) {
                    if scheduled_shared.insert(successor.clone()) {
                        frontier.push(Task::shared(successor.clone()));
                    }
                }
            }
        }
    }
    Ok(frontier)
}

/// A frontier terminates the run when it is empty or contains nothing but
/// the virtual `End` node.
#[must_use]
pub fn is_terminal(frontier: &[Task]) -> bool {
    frontier.iter().all(|task| task.node.is_end())
}
