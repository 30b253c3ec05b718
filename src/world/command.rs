//! Commands - the planner's only lever on the world
//!
//! One command per agent per tick. The world validates each command
//! (capability, target, reachability, resources) before applying it;
//! a rejected command leaves the agent idle and is reported, never
//! silently swallowed.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, GridPos, HospitalId, SurvivorId};
use crate::world::resources::ResourceKind;

/// What an agent is told to do this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    /// Step along the cheapest route toward `target` (one cell per tick)
    MoveTo { target: GridPos },
    /// Pour water on the agent's own cell
    Extinguish,
    /// Clear rubble on the agent's own cell
    ClearRubble,
    /// Lift the survivor sharing the agent's cell
    PickUp { survivor: SurvivorId },
    /// Hand the carried survivor to the hospital on the agent's cell
    DropAtHospital,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub agent: AgentId,
    #[serde(flatten)]
    pub action: Action,
}

impl Command {
    pub fn new(agent: AgentId, action: Action) -> Self {
        Self { agent, action }
    }

    pub fn idle(agent: AgentId) -> Self {
        Self {
            agent,
            action: Action::Idle,
        }
    }
}

/// Why a command was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// No passable route to the target
    NotReachable { target: GridPos },
    /// Ledger refused the charge
    InsufficientResource { kind: ResourceKind },
    /// Target missing, terminal, or not at the agent's cell
    InvalidTarget { detail: String },
    /// A lower-id agent already claimed this survivor this tick
    DuplicateAssignment { survivor: SurvivorId },
    /// The agent's kind cannot perform this action
    NotCapable,
}

/// One dropped command, reported to the strategy for reflection
#[derive(Debug, Clone)]
pub struct CommandRejection {
    pub agent: AgentId,
    pub action: Action,
    pub reason: RejectReason,
}

/// Everything a strategy may inspect about an applied tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub tick: crate::core::types::Tick,
    pub rejections: Vec<CommandRejection>,
    /// Admissions that had to queue at a full hospital
    pub overflows: Vec<(HospitalId, SurvivorId)>,
}
