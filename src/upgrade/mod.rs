//! Savepoint-based upgrade passes

pub mod gate;
pub mod plan;
pub mod registry;
pub mod savepoint;

pub use gate::{UpgradeReport, VersionGate};
pub use plan::UpgradePlan;
pub use registry::{PendingUpgrade, UpgradeRegistry};
pub use savepoint::{Savepoint, StepFn};
