use super::{VersionStore, check_monotonic};
use crate::core::Result;
use std::collections::HashMap;

/// In-process version store. Nothing survives the process; use it for tests
/// or when the host persists versions on its own.
#[derive(Debug, Default, Clone)]
pub struct MemoryVersionStore {
    versions: HashMap<String, u64>,
    writes: usize,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store with already installed versions.
    pub fn with_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            versions: versions
                .into_iter()
                .map(|(name, version)| (name.into(), version))
                .collect(),
            writes: 0,
        }
    }

    /// Number of successful `record_version` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl VersionStore for MemoryVersionStore {
    fn installed_version(&self, component: &str) -> Result<Option<u64>> {
        Ok(self.versions.get(component).copied())
    }

    fn record_version(&mut self, component: &str, version: u64) -> Result<()> {
        check_monotonic(component, self.versions.get(component).copied(), version)?;
        self.versions.insert(component.to_string(), version);
        self.writes += 1;
        Ok(())
    }

    fn components(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.versions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
