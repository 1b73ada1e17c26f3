use crate::core::{GateError, Result};
use std::sync::Arc;

/// One side-effecting action inside a savepoint. It receives the
/// caller's execution context and signals failure through `Err`.
pub type StepFn<C> = Arc<dyn Fn(&mut C) -> Result<()> + Send + Sync>;

/// A target version plus the steps that bring a component up to it from
/// the previous savepoint.
pub struct Savepoint<C> {
    pub target_version: u64,
    pub label: Option<String>,
    pub(crate) steps: Vec<StepFn<C>>,
}

impl<C> Clone for Savepoint<C> {
    fn clone(&self) -> Self {
        Self {
            target_version: self.target_version,
            label: self.label.clone(),
            steps: self.steps.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Savepoint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Savepoint")
            .field("target_version", &self.target_version)
            .field("label", &self.label)
            .field("step_count", &self.steps.len())
            .finish()
    }
}

impl<C> Savepoint<C> {
    /// Creates a savepoint with no steps. Reaching it only advances the
    /// installed version.
    pub fn new(target_version: u64) -> Self {
        Self {
            target_version,
            label: None,
            steps: Vec::new(),
        }
    }

    /// Attaches a human-readable label used in logs.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends a step. Steps run in the order they were added.
    pub fn with_step<F>(mut self, step: F) -> Self
    where
        F: Fn(&mut C) -> Result<()> + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step against `ctx`, stopping at the first failure.
    /// On failure returns the index of the failing step with its error.
    pub(crate) fn apply(&self, ctx: &mut C) -> std::result::Result<(), (usize, GateError)> {
        for (index, step) in self.steps.iter().enumerate() {
            step(ctx).map_err(|err| (index, err))?;
        }
        Ok(())
    }
}
