//! Reusable test steps.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use superstep::state::StateSnapshot;
use superstep::step::{SpawnRequest, Step, StepContext, StepError, StepOutput};

/// Writes a fixed value to one field.
pub struct UpdateStep {
    pub field: String,
    pub value: Value,
}

impl UpdateStep {
    pub fn new(field: &str, value: Value) -> Self {
        Self {
            field: field.to_string(),
            value,
        }
    }
}

#[async_trait]
impl Step for UpdateStep {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        Ok(StepOutput::update([(self.field.clone(), self.value.clone())]))
    }
}

/// Spawns one task per configured input.
pub struct SpawnStep {
    pub target: String,
    pub inputs: Vec<Value>,
}

impl SpawnStep {
    pub fn new(target: &str, inputs: Vec<Value>) -> Self {
        Self {
            target: target.to_string(),
            inputs,
        }
    }
}

#[async_trait]
impl Step for SpawnStep {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        Ok(StepOutput::Spawn(
            self.inputs
                .iter()
                .map(|input| SpawnRequest::new(self.target.as_str(), input.clone()))
                .collect(),
        ))
    }
}

/// Fan-out worker: requires a spawn input of the form `{"topic": ...}` and
/// appends one formatted note to the `zettels` field.
pub struct ZettelWorker;

#[async_trait]
impl Step for ZettelWorker {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        let input = ctx.require_input()?;
        let topic = input
            .get("topic")
            .and_then(Value::as_str)
            .ok_or_else(|| StepError::ValidationFailed("spawn input lacks `topic`".into()))?;
        Ok(StepOutput::update([(
            "zettels",
            json!([format!("Zettel about {topic}")]),
        )]))
    }
}

/// Always fails with a provider error.
pub struct FailingStep;

#[async_trait]
impl Step for FailingStep {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        Err(StepError::Provider {
            provider: "test".to_string(),
            message: "boom".to_string(),
        })
    }
}

/// Worker that fails its first `remaining` invocations, then behaves like
/// [`ZettelWorker`]. Invocation counting is shared across clones of the
/// counter, so a resumed run sees the step recovered.
pub struct FlakyZettelWorker {
    pub remaining_failures: Arc<AtomicUsize>,
}

#[async_trait]
impl Step for FlakyZettelWorker {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StepError::Provider {
                provider: "flaky".to_string(),
                message: "transient failure".to_string(),
            });
        }
        ZettelWorker.run(snapshot, ctx).await
    }
}

/// Sleeps briefly, then records its configured tag to an accumulate field.
/// Used to observe concurrency and completion order.
pub struct SlowTagStep {
    pub field: String,
    pub tag: Value,
    pub delay: Duration,
    pub peak: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl Step for SlowTagStep {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepOutput, StepError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(StepOutput::update([(
            self.field.clone(),
            Value::Array(vec![self.tag.clone()]),
        )]))
    }
}
