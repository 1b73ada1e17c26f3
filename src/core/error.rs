use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error(
        "Upgrade of '{component}' failed at savepoint {target_version} (step {step}), installed version stays at {last_recorded}: {reason}"
    )]
    StepFailure {
        component: String,
        target_version: u64,
        step: usize,
        last_recorded: u64,
        reason: String,
    },

    #[error(
        "Savepoint {target_version} of '{component}' ran but could not be recorded, installed version stays at {last_recorded}: {reason}"
    )]
    RecordFailure {
        component: String,
        target_version: u64,
        last_recorded: u64,
        reason: String,
    },

    #[error("Invalid upgrade plan: {0}")]
    InvalidPlan(String),

    #[error("Component '{0}' is already registered")]
    DuplicateComponent(String),

    #[error("Component '{0}' is not registered")]
    UnknownComponent(String),

    #[error(
        "Refusing to move '{component}' back from version {recorded} to {attempted}"
    )]
    VersionRegression {
        component: String,
        recorded: u64,
        attempted: u64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl GateError {
    /// Target version of the savepoint that failed, if the error came from
    /// an upgrade pass.
    pub fn failed_version(&self) -> Option<u64> {
        match self {
            Self::StepFailure { target_version, .. }
            | Self::RecordFailure { target_version, .. } => Some(*target_version),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
