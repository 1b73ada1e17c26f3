use super::plan::UpgradePlan;
use crate::core::{GateError, Result};
use crate::storage::VersionStore;
use tracing::{Level, event, info_span};

/// Outcome of a successful upgrade pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub component: String,
    /// Version the pass started from.
    pub from_version: u64,
    /// Installed version when the pass finished.
    pub to_version: u64,
    /// Target versions applied by this pass, in order.
    pub applied: Vec<u64>,
}

impl UpgradeReport {
    fn new(component: &str, from_version: u64) -> Self {
        Self {
            component: component.to_string(),
            from_version,
            to_version: from_version,
            applied: Vec::new(),
        }
    }

    /// True when the pass had nothing to do.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Runs a component's pending savepoints against a version store.
///
/// `Ok` means every pending savepoint was applied and recorded. `Err` with
/// [`GateError::StepFailure`] means a step failed, and
/// [`GateError::RecordFailure`] means the steps ran but the store write did
/// not. Savepoints before it stay recorded and a retry resumes from the
/// first unapplied one.
pub struct VersionGate<'a, C> {
    plan: &'a UpgradePlan<C>,
}

impl<'a, C> VersionGate<'a, C> {
    pub fn new(plan: &'a UpgradePlan<C>) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &UpgradePlan<C> {
        self.plan
    }

    /// Target versions a pass from `old_version` would apply. No side effects.
    pub fn pending(&self, old_version: u64) -> Vec<u64> {
        self.plan.pending_versions(old_version)
    }

    /// Applies every savepoint above `old_version`, recording each target
    /// version in `store` as soon as its steps complete.
    ///
    /// The store is consulted as well: if it already holds a higher version
    /// than `old_version`, the pass starts from the stored one so recorded
    /// savepoints never run twice.
    pub fn run_upgrade<S>(
        &self,
        old_version: u64,
        store: &mut S,
        ctx: &mut C,
    ) -> Result<UpgradeReport>
    where
        S: VersionStore + ?Sized,
    {
        self.plan.validate()?;
        let component = self.plan.component();

        let span = info_span!("upgrade_pass", component, old_version);
        let _guard = span.enter();

        let stored_version = store.installed_version(component)?;
        let mut last_recorded = stored_version.unwrap_or(0);
        let start = match stored_version {
            Some(stored) if stored > old_version => {
                event!(
                    Level::WARN,
                    stored,
                    old_version,
                    "caller version is behind the store, resuming from stored version"
                );
                stored
            }
            _ => old_version,
        };

        let mut report = UpgradeReport::new(component, start);
        if start >= self.plan.max_version() {
            event!(Level::DEBUG, "component already up to date");
            return Ok(report);
        }

        for savepoint in self.plan.pending(start) {
            let target_version = savepoint.target_version;
            if let Err((step, err)) = savepoint.apply(ctx) {
                event!(
                    Level::ERROR,
                    target_version,
                    step,
                    error = %err,
                    "savepoint step failed"
                );
                return Err(GateError::StepFailure {
                    component: component.to_string(),
                    target_version,
                    step,
                    last_recorded,
                    reason: err.to_string(),
                });
            }

            if let Err(err) = store.record_version(component, target_version) {
                event!(
                    Level::ERROR,
                    target_version,
                    error = %err,
                    "savepoint applied but version not recorded"
                );
                return Err(GateError::RecordFailure {
                    component: component.to_string(),
                    target_version,
                    last_recorded,
                    reason: err.to_string(),
                });
            }
            last_recorded = target_version;
            report.to_version = target_version;
            report.applied.push(target_version);
            event!(
                Level::INFO,
                target_version,
                label = savepoint.label.as_deref().unwrap_or(""),
                "savepoint reached"
            );
        }

        Ok(report)
    }
}
