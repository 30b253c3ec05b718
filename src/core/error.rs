use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrisisError {
    #[error("No passable route from {from} to {to}")]
    NotReachable {
        from: crate::core::types::GridPos,
        to: crate::core::types::GridPos,
    },

    #[error("Agent {0:?} has insufficient {1}: need {2:.1}, have {3:.1}")]
    InsufficientResource(crate::core::types::AgentId, &'static str, f32, f32),

    #[error("Invalid command target: {0}")]
    InvalidTarget(String),

    #[error("Planner timed out after {0} ms")]
    PlannerTimeout(u64),

    #[error("Malformed planner output: {0}")]
    MalformedPlannerOutput(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Scenario parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CrisisError>;
