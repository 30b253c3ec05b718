//! Planner contract and interchangeable strategies
//!
//! A strategy consumes a sensing snapshot and returns one command per live
//! agent (missing agents idle). Strategies never touch the world directly;
//! validation and application belong to the tick engine. The external
//! strategy is the only one that may block, and it is bounded by a timeout
//! with a heuristic fallback.

pub mod llm;
pub mod plan_execute;
pub mod react;
pub mod reflexion;

use std::str::FromStr;

use crate::core::config::SimulationConfig;
use crate::core::error::{CrisisError, Result};
use crate::llm::client::ProviderClient;
use crate::world::command::TickOutcome;
use crate::world::command::Command;
use crate::world::sensing::Snapshot;

pub use llm::ExternalStrategy;
pub use plan_execute::PlanExecuteStrategy;
pub use react::ReactStrategy;
pub use reflexion::ReflexionStrategy;

/// One tick's worth of planner output
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub commands: Vec<Command>,
    /// Heuristic adjustments made to dodge previously failed targets
    pub replans: u32,
    /// Malformed or timed-out external responses behind this plan
    pub invalid_json: u32,
}

impl Plan {
    pub fn from_commands(commands: Vec<Command>) -> Self {
        Self {
            commands,
            replans: 0,
            invalid_json: 0,
        }
    }
}

/// The strategy contract: sense -> decide; optionally reflect on the
/// applied outcome before the next tick.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn plan(&mut self, snapshot: &Snapshot) -> Plan;

    /// Inspect validated/applied results; default is no memory.
    fn reflect(&mut self, _outcome: &TickOutcome) {}
}

/// CLI-selectable strategy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    React,
    ReactReflexion,
    PlanExecute,
    External,
}

impl FromStr for StrategyKind {
    type Err = CrisisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "react" => Ok(StrategyKind::React),
            "react_reflexion" => Ok(StrategyKind::ReactReflexion),
            "plan_execute" => Ok(StrategyKind::PlanExecute),
            "llm" => Ok(StrategyKind::External),
            other => Err(CrisisError::InvalidScenario(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

/// Construct a strategy. The provider is only consulted by the external
/// variant; the rest are self-contained.
pub fn build_strategy(
    kind: StrategyKind,
    provider: ProviderClient,
    config: &SimulationConfig,
) -> Result<Box<dyn Strategy>> {
    Ok(match kind {
        StrategyKind::React => Box::new(ReactStrategy),
        StrategyKind::ReactReflexion => Box::new(ReflexionStrategy::new(config)),
        StrategyKind::PlanExecute => Box::new(PlanExecuteStrategy::new(config.clone())),
        StrategyKind::External => Box::new(ExternalStrategy::new(provider, config)?),
    })
}
