use crate::core::{GateError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the version state file.
pub const ENV_STATE_PATH: &str = "UPGRADE_GATE_STATE_PATH";

/// Environment variable selecting the durability mode (`sync` or `none`).
pub const ENV_DURABILITY: &str = "UPGRADE_GATE_DURABILITY";

const DEFAULT_STATE_FILE: &str = "installed_versions.json";

/// How hard the file store works to make a recorded version survive a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Flush and fsync the state file before the rename that publishes it.
    #[default]
    Sync,
    /// Write and rename without fsync. Only suitable for tests.
    None,
}

impl DurabilityMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sync" | "strict" => Ok(Self::Sync),
            "none" | "off" => Ok(Self::None),
            other => Err(GateError::ConfigError(format!(
                "Unknown durability mode '{}'",
                other
            ))),
        }
    }
}

/// File store configuration
///
/// Start from [`GateConfig::new`] or [`GateConfig::in_dir`] and chain setters.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Path of the JSON document holding installed versions
    pub state_path: PathBuf,

    /// Durability of each version write
    pub durability: DurabilityMode,
}

impl GateConfig {
    /// Create a configuration for a state file at `state_path`
    pub fn new<P: AsRef<Path>>(state_path: P) -> Self {
        Self {
            state_path: state_path.as_ref().to_path_buf(),
            durability: DurabilityMode::Sync,
        }
    }

    /// Create a configuration for the default state file inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_STATE_FILE))
    }

    /// Set the durability mode
    pub fn durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Build a configuration from `UPGRADE_GATE_STATE_PATH` and
    /// `UPGRADE_GATE_DURABILITY`. The state path is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let state_path = lookup(ENV_STATE_PATH)
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| {
                GateError::ConfigError(format!("{} must be set", ENV_STATE_PATH))
            })?;

        let mut config = Self::new(state_path.trim());
        if let Some(raw) = lookup(ENV_DURABILITY) {
            config.durability = DurabilityMode::parse(&raw)?;
        }
        Ok(config)
    }
}
