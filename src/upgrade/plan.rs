use super::savepoint::Savepoint;
use crate::core::{GateError, Result};

/// Ordered savepoints for a single named component.
///
/// Target versions are strictly ascending and start at 1 or higher; every
/// mutator re-checks that and leaves the plan untouched on error.
pub struct UpgradePlan<C> {
    component: String,
    savepoints: Vec<Savepoint<C>>,
}

impl<C> Clone for UpgradePlan<C> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            savepoints: self.savepoints.clone(),
        }
    }
}

impl<C> std::fmt::Debug for UpgradePlan<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradePlan")
            .field("component", &self.component)
            .field("savepoints", &self.savepoints)
            .finish()
    }
}

impl<C> UpgradePlan<C> {
    /// Creates an empty plan for `component`.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            savepoints: Vec::new(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn savepoints(&self) -> &[Savepoint<C>] {
        &self.savepoints
    }

    /// Highest target version in the plan, or 0 for an empty plan.
    pub fn max_version(&self) -> u64 {
        self.savepoints
            .last()
            .map(|savepoint| savepoint.target_version)
            .unwrap_or(0)
    }

    /// Appends a savepoint. It must target a version above every savepoint
    /// already in the plan.
    pub fn add_savepoint(&mut self, savepoint: Savepoint<C>) -> Result<()> {
        check_target(&self.component, self.max_version(), savepoint.target_version)?;
        self.savepoints.push(savepoint);
        Ok(())
    }

    /// Fluent builder method to add a savepoint.
    pub fn with_savepoint(mut self, savepoint: Savepoint<C>) -> Result<Self> {
        self.add_savepoint(savepoint)?;
        Ok(self)
    }

    /// Helper for a savepoint that only advances the version marker.
    pub fn add_noop_savepoint(&mut self, target_version: u64) -> Result<()> {
        self.add_savepoint(Savepoint::new(target_version))
    }

    /// Validates the integrity of the plan.
    ///
    /// Checks for:
    /// - a non-empty component name,
    /// - target versions >= 1,
    /// - strictly ascending targets (which also rules out duplicates).
    pub fn validate(&self) -> Result<()> {
        if self.component.trim().is_empty() {
            return Err(GateError::InvalidPlan(
                "Component name must not be empty".to_string(),
            ));
        }

        let mut previous = 0;
        for savepoint in &self.savepoints {
            check_target(&self.component, previous, savepoint.target_version)?;
            previous = savepoint.target_version;
        }
        Ok(())
    }

    /// Savepoints a pass starting at `from_version` would apply, in order.
    pub fn pending(&self, from_version: u64) -> impl Iterator<Item = &Savepoint<C>> {
        self.savepoints
            .iter()
            .filter(move |savepoint| savepoint.target_version > from_version)
    }

    /// Target versions a pass starting at `from_version` would apply.
    pub fn pending_versions(&self, from_version: u64) -> Vec<u64> {
        self.pending(from_version)
            .map(|savepoint| savepoint.target_version)
            .collect()
    }
}

fn check_target(component: &str, previous: u64, target: u64) -> Result<()> {
    if target == 0 {
        return Err(GateError::InvalidPlan(format!(
            "Savepoint target for '{}' must be >= 1",
            component
        )));
    }
    if target <= previous {
        return Err(GateError::InvalidPlan(format!(
            "Savepoint {} for '{}' must be above previous savepoint {}",
            target, component, previous
        )));
    }
    Ok(())
}
