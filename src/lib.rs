// ============================================================================
// Upgrade Gate Library
// ============================================================================

pub mod config;
pub mod core;
pub mod storage;
pub mod upgrade;

// Re-export main types for convenience
pub use config::{DurabilityMode, GateConfig};
pub use crate::core::{GateError, Result};
pub use storage::{ComponentRecord, FileVersionStore, MemoryVersionStore, VersionStore};
pub use upgrade::{
    PendingUpgrade, Savepoint, StepFn, UpgradePlan, UpgradeRegistry, UpgradeReport, VersionGate,
};

/// Runs one upgrade pass for `plan` starting at `old_version`.
///
/// Shorthand for [`VersionGate::new`] followed by
/// [`VersionGate::run_upgrade`].
///
/// # Examples
///
/// ```
/// use upgrade_gate::{MemoryVersionStore, UpgradePlan, VersionStore, run_upgrade};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut plan = UpgradePlan::<()>::new("local_helloworld");
/// plan.add_noop_savepoint(2024120100)?;
///
/// let mut store = MemoryVersionStore::new();
/// let report = run_upgrade(&plan, 2024010100, &mut store, &mut ())?;
///
/// assert_eq!(report.applied, vec![2024120100]);
/// assert_eq!(store.installed_version("local_helloworld")?, Some(2024120100));
/// # Ok(())
/// # }
/// ```
pub fn run_upgrade<C, S>(
    plan: &UpgradePlan<C>,
    old_version: u64,
    store: &mut S,
    ctx: &mut C,
) -> Result<UpgradeReport>
where
    S: VersionStore + ?Sized,
{
    VersionGate::new(plan).run_upgrade(old_version, store, ctx)
}
