//! Response agents - trucks, medics, drones
//!
//! One tagged variant with a capability set; the world dispatches on
//! capability, never on the variant directly.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, GridPos, SurvivorId};

/// Agent variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Truck,
    Medic,
    Drone,
}

impl AgentKind {
    /// Trucks fight fires
    pub fn can_extinguish(&self) -> bool {
        matches!(self, AgentKind::Truck)
    }

    /// Medics carry one survivor at a time
    pub fn can_carry(&self) -> bool {
        matches!(self, AgentKind::Medic)
    }

    /// Drones scout; their movement draws on battery instead of fuel
    pub fn can_scout(&self) -> bool {
        matches!(self, AgentKind::Drone)
    }

    /// Trucks clear rubble to reopen roads
    pub fn can_clear_rubble(&self) -> bool {
        matches!(self, AgentKind::Truck)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Truck => "truck",
            AgentKind::Medic => "medic",
            AgentKind::Drone => "drone",
        }
    }
}

/// A mobile responder. Created at scenario load, never destroyed.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub pos: GridPos,
    /// Survivor currently carried (medics only)
    pub carrying: Option<SurvivorId>,
    /// Survivor claimed as a rescue target (medics only); revoked when the
    /// target becomes unreachable or terminal
    pub assignment: Option<SurvivorId>,
}

impl Agent {
    pub fn new(id: AgentId, kind: AgentKind, pos: GridPos) -> Self {
        Self {
            id,
            kind,
            pos,
            carrying: None,
            assignment: None,
        }
    }

    pub fn has_free_hands(&self) -> bool {
        self.carrying.is_none()
    }
}
