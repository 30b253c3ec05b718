//! Survivors and their status lifecycle
//!
//! Transitions are one-directional except Waiting <-> Assigned: an
//! assignment is revoked when the claiming medic can no longer reach the
//! survivor. Rescued and Dead are terminal.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, GridPos, SurvivorId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivorStatus {
    /// Awaiting a medic
    Waiting,
    /// Claimed by a medic en route
    Assigned,
    /// Picked up, being carried or queued at a hospital
    Enroute,
    /// Admitted to a hospital
    Rescued,
    Dead,
}

impl SurvivorStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SurvivorStatus::Rescued | SurvivorStatus::Dead)
    }

    /// The allowed transition graph
    pub fn can_transition_to(&self, next: SurvivorStatus) -> bool {
        use SurvivorStatus::*;
        matches!(
            (self, next),
            (Waiting, Assigned)
                | (Assigned, Waiting)
                | (Waiting, Enroute)
                | (Assigned, Enroute)
                | (Enroute, Rescued)
                | (Waiting, Dead)
                | (Assigned, Dead)
                | (Enroute, Dead)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Survivor {
    pub id: SurvivorId,
    pub pos: GridPos,
    pub health: f32,
    pub status: SurvivorStatus,
    pub spawn_tick: Tick,
    /// Set once on pickup; pickup tick <= admission tick always
    pub pickup_tick: Option<Tick>,
    /// Claiming or carrying medic
    pub attending_medic: Option<AgentId>,
    /// True while physically carried (no health decay in transit)
    pub carried: bool,
}

impl Survivor {
    pub fn new(id: SurvivorId, pos: GridPos, health: f32, spawn_tick: Tick) -> Self {
        Self {
            id,
            pos,
            health,
            status: SurvivorStatus::Waiting,
            spawn_tick,
            pickup_tick: None,
            attending_medic: None,
            carried: false,
        }
    }

    fn transition(&mut self, next: SurvivorStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal survivor transition {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
    }

    /// Claim by a medic. Only valid while waiting.
    pub fn assign(&mut self, medic: AgentId) {
        self.transition(SurvivorStatus::Assigned);
        self.attending_medic = Some(medic);
    }

    /// Revoke a claim (target unreachable); back to waiting.
    pub fn unassign(&mut self) {
        self.transition(SurvivorStatus::Waiting);
        self.attending_medic = None;
    }

    pub fn pick_up(&mut self, medic: AgentId, tick: Tick) {
        self.transition(SurvivorStatus::Enroute);
        self.attending_medic = Some(medic);
        self.pickup_tick = Some(tick);
        self.carried = true;
    }

    /// Dropped into a hospital queue; still enroute, decaying again
    pub fn set_down(&mut self, pos: GridPos) {
        self.carried = false;
        self.attending_medic = None;
        self.pos = pos;
    }

    pub fn rescue(&mut self) {
        self.transition(SurvivorStatus::Rescued);
        self.carried = false;
        self.attending_medic = None;
    }

    pub fn kill(&mut self) {
        self.transition(SurvivorStatus::Dead);
        self.carried = false;
        self.attending_medic = None;
    }

    /// Decays while on the ground (waiting, assigned, or queued); carried
    /// survivors are stabilized by the medic
    pub fn decays(&self) -> bool {
        !self.status.is_terminal() && !self.carried
    }
}
