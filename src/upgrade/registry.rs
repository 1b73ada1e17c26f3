use super::gate::{UpgradeReport, VersionGate};
use super::plan::UpgradePlan;
use crate::core::{GateError, Result};
use crate::storage::VersionStore;
use log::warn;
use std::collections::BTreeMap;

/// Pending work for one registered component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpgrade {
    pub component: String,
    pub installed_version: Option<u64>,
    pub pending: Vec<u64>,
}

/// Explicit component name -> plan mapping, built once at process start.
///
/// Passes over the registry visit components in name order.
pub struct UpgradeRegistry<C> {
    plans: BTreeMap<String, UpgradePlan<C>>,
}

impl<C> Default for UpgradeRegistry<C> {
    fn default() -> Self {
        Self {
            plans: BTreeMap::new(),
        }
    }
}

impl<C> UpgradeRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validated plan. A second plan for the same component is
    /// rejected.
    pub fn register(&mut self, plan: UpgradePlan<C>) -> Result<()> {
        plan.validate()?;
        if self.plans.contains_key(plan.component()) {
            return Err(GateError::DuplicateComponent(plan.component().to_string()));
        }
        self.plans.insert(plan.component().to_string(), plan);
        Ok(())
    }

    pub fn with_plan(mut self, plan: UpgradePlan<C>) -> Result<Self> {
        self.register(plan)?;
        Ok(self)
    }

    pub fn plan(&self, component: &str) -> Option<&UpgradePlan<C>> {
        self.plans.get(component)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Upgrades one component from the version recorded in `store`. A
    /// component the store has never seen starts at 0.
    pub fn run<S>(&self, component: &str, store: &mut S, ctx: &mut C) -> Result<UpgradeReport>
    where
        S: VersionStore + ?Sized,
    {
        let plan = self
            .plans
            .get(component)
            .ok_or_else(|| GateError::UnknownComponent(component.to_string()))?;
        let installed = store.installed_version(component)?.unwrap_or(0);
        VersionGate::new(plan).run_upgrade(installed, store, ctx)
    }

    /// Upgrades every registered component, stopping at the first failure.
    /// Components upgraded before the failure stay at their new versions.
    pub fn run_all<S>(&self, store: &mut S, ctx: &mut C) -> Result<Vec<UpgradeReport>>
    where
        S: VersionStore + ?Sized,
    {
        for recorded in store.components()? {
            if !self.plans.contains_key(&recorded) {
                warn!(
                    "Component '{}' has a recorded version but no registered upgrade plan",
                    recorded
                );
            }
        }

        let mut reports = Vec::with_capacity(self.plans.len());
        for component in self.plans.keys() {
            reports.push(self.run(component, store, ctx)?);
        }
        Ok(reports)
    }

    /// Lists pending savepoints per component without running anything.
    pub fn pending_all<S>(&self, store: &S) -> Result<Vec<PendingUpgrade>>
    where
        S: VersionStore + ?Sized,
    {
        self.plans
            .iter()
            .map(|(component, plan)| {
                let installed_version = store.installed_version(component)?;
                Ok(PendingUpgrade {
                    component: component.clone(),
                    installed_version,
                    pending: plan.pending_versions(installed_version.unwrap_or(0)),
                })
            })
            .collect()
    }
}
