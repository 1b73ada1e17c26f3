//! Persistence of installed component versions

pub mod memory;
pub mod persistence;

pub use memory::MemoryVersionStore;
pub use persistence::{ComponentRecord, FileVersionStore};

use crate::core::{GateError, Result};

/// Durable home of the InstalledVersion marker for each component.
///
/// The gate reads through [`VersionStore::installed_version`] before a pass
/// and calls [`VersionStore::record_version`] once per applied savepoint.
/// `record_version` must not return until the write is durable.
pub trait VersionStore {
    /// Last recorded version, or `None` if the component was never installed.
    fn installed_version(&self, component: &str) -> Result<Option<u64>>;

    /// Records `version` as installed. Lowering a recorded version fails
    /// with [`GateError::VersionRegression`]; re-recording the same version
    /// is accepted.
    fn record_version(&mut self, component: &str, version: u64) -> Result<()>;

    /// Names of every component with a recorded version, sorted.
    fn components(&self) -> Result<Vec<String>>;
}

pub(crate) fn check_monotonic(
    component: &str,
    recorded: Option<u64>,
    attempted: u64,
) -> Result<()> {
    match recorded {
        Some(recorded) if attempted < recorded => Err(GateError::VersionRegression {
            component: component.to_string(),
            recorded,
            attempted,
        }),
        _ => Ok(()),
    }
}
