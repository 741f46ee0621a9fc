//! Runs one frontier to completion under a concurrency limit.
//!
//! The scheduler owns the join barrier: it launches every task in the
//! frontier, waits for all of them, and hands back their outputs in
//! completion order. It never touches state or topology; merging and
//! routing stay with the caller so a failed superstep leaves nothing
//! half-committed.

use crate::graphs::Graph;
use crate::state::StateSnapshot;
use crate::step::{StepContext, StepError, StepOutput};
use crate::types::{NodeKind, Task};
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, instrument, warn};

/// Outputs of one superstep, ordered by task completion.
#[derive(Debug, Default)]
pub struct SuperstepResult {
    pub outputs: Vec<(Task, StepOutput)>,
}

/// A superstep failure. The first failing task aborts the remaining
/// in-flight tasks and the whole superstep reports as failed.
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("task for node {node} failed at superstep {step}")]
    #[diagnostic(code(superstep::scheduler::task_failed))]
    TaskFailed {
        node: NodeKind,
        step: u64,
        #[source]
        #[diagnostic_source]
        source: StepError,
    },

    #[error("frontier references unregistered node {node}")]
    #[diagnostic(code(superstep::scheduler::unknown_node))]
    UnknownNode { node: NodeKind },

    #[error("concurrency semaphore closed while launching tasks")]
    #[diagnostic(code(superstep::scheduler::semaphore_closed))]
    SemaphoreClosed,

    #[error("task join failed")]
    #[diagnostic(code(superstep::scheduler::join))]
    Join(#[from] JoinError),
}

/// Bounded-concurrency executor for a single superstep.
#[derive(Clone, Debug)]
pub struct Scheduler {
    max_in_flight: usize,
}

impl Scheduler {
    /// `max_in_flight` is clamped to at least 1.
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Run every task in `frontier` against the same `snapshot`.
    ///
    /// Virtual `End` tasks are skipped without producing output. All other
    /// tasks run concurrently up to the configured limit; the call returns
    /// only once every launched task has completed or the first failure
    /// has aborted the rest.
    #[instrument(skip_all, fields(step = step, tasks = frontier.len()))]
    pub async fn superstep(
        &self,
        graph: &Graph,
        frontier: &[Task],
        snapshot: &StateSnapshot,
        step: u64,
    ) -> Result<SuperstepResult, SchedulerError> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set: JoinSet<(Task, Result<StepOutput, StepError>)> = JoinSet::new();

        for task in frontier {
            if task.node.is_end() {
                continue;
            }
            let step_impl = graph
                .nodes()
                .get(&task.node)
                .cloned()
                .ok_or_else(|| SchedulerError::UnknownNode {
                    node: task.node.clone(),
                })?;
            let ctx = StepContext {
                node: task.node.clone(),
                step,
                input: task.input.clone(),
            };
            let task = task.clone();
            let snapshot = snapshot.clone();
            // Launching waits for a permit, so at most `max_in_flight` tasks
            // are ever running; the permit is held for the task's lifetime.
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::SemaphoreClosed)?;
            join_set.spawn(async move {
                let _permit = permit;
                debug!(node = %ctx.node, step = ctx.step, "task started");
                let result = step_impl.run(snapshot, ctx).await;
                (task, result)
            });
        }

        let mut outputs = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            let (task, result) = joined?;
            match result {
                Ok(output) => outputs.push((task, output)),
                Err(source) => {
                    warn!(node = %task.node, step, error = %source, "task failed, aborting superstep");
                    join_set.abort_all();
                    return Err(SchedulerError::TaskFailed {
                        node: task.node,
                        step,
                        source,
                    });
                }
            }
        }
        Ok(SuperstepResult { outputs })
    }
}
