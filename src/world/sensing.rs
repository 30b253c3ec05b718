//! Sensing snapshot - the planner's read-only view of the world
//!
//! A compact projection, not the full internal state: positions, statuses,
//! resource levels, the fire map, and hospital load. Serializable so the
//! externally-queried strategy can ship it verbatim as prompt context.

use serde::Serialize;

use crate::core::types::{AgentId, GridPos, HospitalId, SurvivorId, Tick};
use crate::world::agents::AgentKind;
use crate::world::metrics::Metrics;
use crate::world::survivor::SurvivorStatus;

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub kind: AgentKind,
    pub pos: GridPos,
    pub fuel: f32,
    pub water: f32,
    pub battery: f32,
    pub carrying: Option<SurvivorId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivorView {
    pub id: SurvivorId,
    pub pos: GridPos,
    pub health: f32,
    pub status: SurvivorStatus,
    pub attending_medic: Option<AgentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FireView {
    pub pos: GridPos,
    pub intensity: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct HospitalView {
    pub id: HospitalId,
    pub pos: GridPos,
    pub capacity: u32,
    pub occupancy: u32,
    pub queue_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: Tick,
    pub width: i32,
    pub height: i32,
    pub depot: GridPos,
    /// All live agents, ascending id
    pub agents: Vec<AgentView>,
    /// Non-terminal survivors on the ground (waiting, assigned, or queued)
    pub survivors: Vec<SurvivorView>,
    pub fires: Vec<FireView>,
    pub rubble: Vec<GridPos>,
    pub hospitals: Vec<HospitalView>,
    pub metrics: Metrics,
}

impl Snapshot {
    pub fn agent(&self, id: AgentId) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn survivor(&self, id: SurvivorId) -> Option<&SurvivorView> {
        self.survivors.iter().find(|s| s.id == id)
    }

    pub fn hospital_at(&self, pos: GridPos) -> Option<&HospitalView> {
        self.hospitals.iter().find(|h| h.pos == pos)
    }

    pub fn fire_at(&self, pos: GridPos) -> bool {
        self.fires.iter().any(|f| f.pos == pos)
    }
}
