//! Run driver: the loop that turns a compiled graph plus a checkpoint store
//! into resumable runs.
//!
//! Each superstep is committed as a unit: execute the frontier, merge the
//! outputs, compute the next frontier, save the checkpoint. A failure at any
//! point leaves the previous checkpoint as the resume point, so resuming
//! after a failed or interrupted superstep re-executes exactly that
//! superstep and nothing before it.

use super::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
use super::runtime_config::RuntimeConfig;
use crate::dispatcher::{self, DispatchError};
use crate::graphs::Graph;
use crate::reducers::MergeError;
use crate::schedulers::{Scheduler, SchedulerError};
use crate::state::{RunState, StepUpdate};
use crate::step::StepOutput;
use crate::types::RunStatus;
use crate::utils::IdGenerator;
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error("no checkpoint found for run `{run_id}`")]
    #[diagnostic(
        code(superstep::run::not_found),
        help("start the run before resuming it")
    )]
    NotFound { run_id: String },

    #[error("run `{run_id}` is already being driven")]
    #[diagnostic(
        code(superstep::run::already_active),
        help("a run id admits one driver at a time; await or cancel the existing handle")
    )]
    AlreadyActive { run_id: String },

    #[error("run was cancelled")]
    #[diagnostic(code(superstep::run::cancelled))]
    Cancelled,

    #[error("run task panicked")]
    #[diagnostic(code(superstep::run::panicked))]
    Panicked,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Handle to a spawned run.
///
/// Dropping the handle does not stop the run; [`cancel`](Self::cancel) does.
/// A cancelled run keeps its last checkpoint and can be resumed.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    join: JoinHandle<Result<RunState, RunError>>,
}

impl RunHandle {
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Wait for the run to finish and return its final state.
    pub async fn join(self) -> Result<RunState, RunError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(RunError::Cancelled),
            Err(_) => Err(RunError::Panicked),
        }
    }

    /// Stop the run at the next await point. Progress up to the last saved
    /// checkpoint survives.
    pub fn cancel(&self) {
        self.join.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Shared bookkeeping for active runs.
#[derive(Default)]
struct Registry {
    active: Mutex<rustc_hash::FxHashSet<String>>,
    statuses: Mutex<FxHashMap<String, RunStatus>>,
}

impl Registry {
    fn claim(&self, run_id: &str) -> bool {
        self.active.lock().insert(run_id.to_string())
    }

    fn set_status(&self, run_id: &str, status: RunStatus) {
        self.statuses.lock().insert(run_id.to_string(), status);
    }

    fn status(&self, run_id: &str) -> Option<RunStatus> {
        self.statuses.lock().get(run_id).copied()
    }
}

/// Releases the active-run claim when the driver stops for any reason,
/// including cancellation. Unless a terminal status was recorded first, the
/// run falls back to `Created`: its checkpoint is intact and resumable.
struct ActiveGuard {
    registry: Arc<Registry>,
    run_id: String,
    terminal: Option<RunStatus>,
}

impl ActiveGuard {
    fn finish(&mut self, status: RunStatus) {
        self.terminal = Some(status);
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.run_id);
        let status = self.terminal.unwrap_or(RunStatus::Created);
        self.registry.set_status(&self.run_id, status);
    }
}

/// Drives runs of one compiled graph against one checkpoint store.
#[derive(Clone)]
pub struct Runner {
    graph: Arc<Graph>,
    store: Arc<dyn CheckpointStore>,
    scheduler: Scheduler,
    registry: Arc<Registry>,
}

impl Runner {
    #[must_use]
    pub fn new(graph: Graph, store: Arc<dyn CheckpointStore>) -> Self {
        let scheduler = Scheduler::new(graph.runtime_config().max_in_flight);
        Self {
            graph: Arc::new(graph),
            store,
            scheduler,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Override the runtime config the graph was compiled with.
    #[must_use]
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.scheduler = Scheduler::new(config.max_in_flight);
        self
    }

    /// Start (or re-attach to) the run named `run_id`.
    ///
    /// If the store already holds a checkpoint for this id, the run resumes
    /// from it and `initial` is ignored, which makes retrying a `start` call
    /// after a crash safe. Otherwise the initial state is validated against
    /// the schema and a step-0 checkpoint is written before anything runs.
    pub async fn start(
        &self,
        run_id: impl Into<String>,
        initial: FxHashMap<String, Value>,
    ) -> Result<RunHandle, RunError> {
        let run_id = run_id.into();
        let guard = self.claim(&run_id)?;

        let checkpoint = match self.store.load_latest(&run_id).await? {
            Some(existing) => {
                info!(run_id = %run_id, step = existing.step, "re-attaching to existing run");
                existing
            }
            None => {
                let state = RunState::init(Arc::clone(self.graph.schema()), initial)?;
                let checkpoint =
                    Checkpoint::new(run_id.clone(), 0, state, self.graph.entry_frontier());
                self.store.save(&checkpoint).await?;
                checkpoint
            }
        };
        Ok(self.spawn_driver(run_id, checkpoint, guard))
    }

    /// Start a run under a freshly generated id.
    pub async fn start_new(
        &self,
        initial: FxHashMap<String, Value>,
    ) -> Result<RunHandle, RunError> {
        self.start(IdGenerator::generate_run_id(), initial).await
    }

    /// Resume the run named `run_id` from its latest checkpoint.
    ///
    /// # Errors
    ///
    /// `NotFound` when the store has no checkpoint for this id.
    pub async fn resume(&self, run_id: &str) -> Result<RunHandle, RunError> {
        let guard = self.claim(run_id)?;
        let checkpoint = self
            .store
            .load_latest(run_id)
            .await?
            .ok_or_else(|| RunError::NotFound {
                run_id: run_id.to_string(),
            })?;
        info!(run_id, step = checkpoint.step, "resuming run");
        Ok(self.spawn_driver(run_id.to_string(), checkpoint, guard))
    }

    /// The last observed status of `run_id`, if this runner has driven it.
    #[must_use]
    pub fn status(&self, run_id: &str) -> Option<RunStatus> {
        self.registry.status(run_id)
    }

    fn claim(&self, run_id: &str) -> Result<ActiveGuard, RunError> {
        if !self.registry.claim(run_id) {
            return Err(RunError::AlreadyActive {
                run_id: run_id.to_string(),
            });
        }
        Ok(ActiveGuard {
            registry: Arc::clone(&self.registry),
            run_id: run_id.to_string(),
            terminal: None,
        })
    }

    fn spawn_driver(
        &self,
        run_id: String,
        checkpoint: Checkpoint,
        mut guard: ActiveGuard,
    ) -> RunHandle {
        self.registry.set_status(&run_id, RunStatus::Running);
        let graph = Arc::clone(&self.graph);
        let store = Arc::clone(&self.store);
        let scheduler = self.scheduler.clone();
        let driver_run_id = run_id.clone();
        let join = tokio::spawn(async move {
            let result = drive(&graph, &store, &scheduler, &driver_run_id, checkpoint).await;
            match &result {
                Ok(_) => guard.finish(RunStatus::Completed),
                Err(err) => {
                    error!(run_id = %driver_run_id, error = %err, "run failed");
                    guard.finish(RunStatus::Failed);
                }
            }
            result
        });
        RunHandle { run_id, join }
    }
}

/// The superstep loop. `checkpoint.frontier` is always the next work to do.
#[instrument(skip_all, fields(run_id = %run_id))]
async fn drive(
    graph: &Graph,
    store: &Arc<dyn CheckpointStore>,
    scheduler: &Scheduler,
    run_id: &str,
    mut checkpoint: Checkpoint,
) -> Result<RunState, RunError> {
    loop {
        if dispatcher::is_terminal(&checkpoint.frontier) {
            info!(run_id, step = checkpoint.step, "run complete");
            return Ok(checkpoint.state);
        }

        let step = checkpoint.step + 1;
        let snapshot = checkpoint.state.snapshot();
        let result = scheduler
            .superstep(graph, &checkpoint.frontier, &snapshot, step)
            .await?;

        let updates: Vec<StepUpdate> = result
            .outputs
            .iter()
            .filter_map(|(task, output)| match output {
                StepOutput::Update(fields) => Some(StepUpdate {
                    node: task.node.clone(),
                    fields: fields.clone(),
                }),
                StepOutput::Spawn(_) => None,
            })
            .collect();

        let state = checkpoint.state.apply(&updates)?;
        let frontier = dispatcher::next_frontier(graph, &result.outputs)?;
        debug!(
            run_id,
            step,
            merged = updates.len(),
            next = frontier.len(),
            "superstep committed"
        );

        checkpoint = Checkpoint::new(run_id.to_string(), step, state, frontier);
        store.save(&checkpoint).await?;
    }
}
