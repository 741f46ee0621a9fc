use uuid::Uuid;

/// Generates run identifiers for callers that do not bring their own.
pub struct IdGenerator;

impl IdGenerator {
    /// A fresh, collision-resistant run id of the form `run-<uuid>`.
    #[must_use]
    pub fn generate_run_id() -> String {
        format!("run-{}", Uuid::new_v4())
    }
}
