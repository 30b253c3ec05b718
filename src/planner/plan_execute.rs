//! Plan-Execute - receding-horizon lookahead
//!
//! For each agent, candidate objectives are rolled forward tick by tick
//! for `lookahead_depth` ticks against a lightweight model of the
//! dynamics and the ledger: one step of travel per tick paid from a
//! copied tank, survivor health decaying while the medic is en route,
//! fire intensity growing until the truck arrives. Candidates the tank
//! cannot pay for are discarded. The end state is scored with the
//! episode score weights and only the first action of the best candidate
//! is committed; the whole exercise repeats next tick.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;

use crate::core::config::SimulationConfig;
use crate::core::types::{GridPos, SurvivorId};
use crate::planner::{Plan, Strategy};
use crate::world::command::{Action, Command};
use crate::world::sensing::{AgentView, FireView, HospitalView, Snapshot, SurvivorView};
use crate::world::survivor::SurvivorStatus;

pub struct PlanExecuteStrategy {
    config: SimulationConfig,
}

impl PlanExecuteStrategy {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Strategy for PlanExecuteStrategy {
    fn name(&self) -> &'static str {
        "plan_execute"
    }

    fn plan(&mut self, snapshot: &Snapshot) -> Plan {
        let mut commands = Vec::new();
        let mut claimed: BTreeSet<SurvivorId> = BTreeSet::new();

        for agent in &snapshot.agents {
            let action = if agent.kind.can_carry() {
                self.medic_action(agent, snapshot, &mut claimed)
            } else if agent.kind.can_extinguish() {
                self.truck_action(agent, snapshot)
            } else {
                self.drone_action(agent, snapshot)
            };
            commands.push(Command::new(agent.id, action));
        }

        Plan::from_commands(commands)
    }
}

/// A rolled-out candidate objective; first tick's action plus the score
/// of the projected end state
struct Candidate {
    action: Action,
    score: f64,
    /// survivor claimed by committing to this candidate, if any
    claims: Option<SurvivorId>,
}

impl PlanExecuteStrategy {
    fn best(&self, candidates: Vec<Candidate>) -> Option<Candidate> {
        candidates
            .into_iter()
            .max_by_key(|c| OrderedFloat(c.score))
    }

    fn nearest_hospital_dist(&self, pos: GridPos, snapshot: &Snapshot) -> f64 {
        snapshot
            .hospitals
            .iter()
            .map(|h| pos.manhattan(&h.pos))
            .min()
            .unwrap_or(0) as f64
    }

    /// Objectives farther than the horizon still compare; the payoff is
    /// discounted by the ticks left past the end of the rollout.
    fn progress(&self, ticks_left: f64) -> f64 {
        let horizon = self.config.lookahead_depth as f64;
        horizon / (horizon + ticks_left)
    }

    /// Roll a rescue forward: one step per tick paid in fuel while the
    /// survivor keeps decaying on the ground.
    fn rollout_rescue(
        &self,
        agent: &AgentView,
        survivor: &SurvivorView,
        snapshot: &Snapshot,
    ) -> Option<Candidate> {
        let mut fuel = agent.fuel;
        let mut dist = agent.pos.manhattan(&survivor.pos);
        let mut health = survivor.health as f64;
        let mut energy = 0.0;

        let mut decay = self.config.health_decay_rate as f64;
        let exposed = snapshot.fire_at(survivor.pos)
            || survivor.pos.orthogonal().iter().any(|&p| snapshot.fire_at(p));
        if exposed {
            decay += self.config.fire_proximity_penalty as f64;
        }

        for _ in 0..self.config.lookahead_depth {
            if dist == 0 {
                break; // picked up, stabilized
            }
            if fuel < self.config.move_cost {
                return None;
            }
            fuel -= self.config.move_cost;
            energy += self.config.move_cost as f64;
            dist -= 1;
            health -= decay;
        }

        // project the rest of the approach past the horizon
        let health_at_pickup = health - decay * dist as f64;
        let value = if health_at_pickup > 0.0 {
            self.config.score.rescued
        } else {
            // likely a death either way; nearly worthless target
            self.config.score.rescued * 0.05
        };
        let delivery = self.nearest_hospital_dist(survivor.pos, snapshot);
        let remaining = dist as f64 + delivery;
        let projected_energy = energy + remaining * self.config.move_cost as f64;
        let action = if survivor.pos == agent.pos {
            Action::PickUp {
                survivor: survivor.id,
            }
        } else {
            Action::MoveTo {
                target: survivor.pos,
            }
        };
        Some(Candidate {
            action,
            score: value * self.progress(remaining)
                + self.config.score.energy_used * projected_energy,
            claims: Some(survivor.id),
        })
    }

    /// Roll a delivery forward; the patient is carried and stable, only
    /// travel and queue risk matter.
    fn rollout_delivery(&self, agent: &AgentView, hospital: &HospitalView) -> Option<Candidate> {
        let mut fuel = agent.fuel;
        let mut dist = agent.pos.manhattan(&hospital.pos);
        let mut energy = 0.0;

        for _ in 0..self.config.lookahead_depth {
            if dist == 0 {
                break;
            }
            if fuel < self.config.move_cost {
                return None;
            }
            fuel -= self.config.move_cost;
            energy += self.config.move_cost as f64;
            dist -= 1;
        }

        let mut value = self.config.score.rescued;
        if hospital.occupancy >= hospital.capacity {
            // queueing risks an overflow event and a delayed bed
            value = value * 0.8 + self.config.score.hospital_overflow_events;
        }
        let remaining = dist as f64;
        let projected_energy = energy + remaining * self.config.move_cost as f64;
        let action = if hospital.pos == agent.pos {
            Action::DropAtHospital
        } else {
            Action::MoveTo {
                target: hospital.pos,
            }
        };
        Some(Candidate {
            action,
            score: value * self.progress(remaining)
                + self.config.score.energy_used * projected_energy,
            claims: None,
        })
    }

    /// Roll a firefight forward: travel ticks first (the fire keeps
    /// growing in expectation), then one extinguish action per tick, each
    /// paid in water.
    fn rollout_fire(&self, agent: &AgentView, fire: &FireView) -> Option<Candidate> {
        let mut fuel = agent.fuel;
        let mut water = agent.water;
        let mut dist = agent.pos.manhattan(&fire.pos);
        let mut intensity = fire.intensity as f64;
        let mut energy = 0.0;
        let mut extinguished = false;

        for _ in 0..self.config.lookahead_depth {
            if dist > 0 {
                if fuel < self.config.move_cost {
                    return None;
                }
                fuel -= self.config.move_cost;
                energy += self.config.move_cost as f64;
                dist -= 1;
                intensity = (intensity + self.config.fire_growth_chance)
                    .min(self.config.max_fire_intensity as f64);
            } else {
                if water < self.config.extinguish_cost {
                    return None;
                }
                water -= self.config.extinguish_cost;
                intensity -= self.config.extinguish_power as f64;
                if intensity <= 0.0 {
                    extinguished = true;
                    break;
                }
            }
        }

        // hotter fires threaten more of the grid, so they pay more
        let threat = self.config.score.fires_extinguished * f64::from(fire.intensity.max(1));
        let progress = if extinguished {
            1.0
        } else {
            let extinguish_ticks =
                (intensity / self.config.extinguish_power as f64).ceil().max(0.0);
            self.progress(dist as f64 + extinguish_ticks)
        };
        let projected_energy = energy + dist as f64 * self.config.move_cost as f64;
        let action = if agent.pos == fire.pos {
            Action::Extinguish
        } else {
            Action::MoveTo { target: fire.pos }
        };
        Some(Candidate {
            action,
            score: threat * progress + self.config.score.energy_used * projected_energy,
            claims: None,
        })
    }

    fn rollout_rubble(&self, agent: &AgentView, pos: GridPos) -> Option<Candidate> {
        let mut fuel = agent.fuel;
        let mut dist = agent.pos.manhattan(&pos);
        let mut energy = 0.0;
        let mut cleared = false;

        for _ in 0..self.config.lookahead_depth {
            if dist > 0 {
                if fuel < self.config.move_cost {
                    return None;
                }
                fuel -= self.config.move_cost;
                energy += self.config.move_cost as f64;
                dist -= 1;
            } else {
                if fuel < self.config.clear_rubble_cost {
                    return None;
                }
                cleared = true;
                break;
            }
        }

        let progress = if cleared {
            1.0
        } else {
            self.progress(dist as f64 + 1.0)
        };
        let projected_energy = energy + dist as f64 * self.config.move_cost as f64;
        let action = if agent.pos == pos {
            Action::ClearRubble
        } else {
            Action::MoveTo { target: pos }
        };
        Some(Candidate {
            action,
            score: self.config.score.roads_cleared * progress
                + self.config.score.energy_used * projected_energy,
            claims: None,
        })
    }

    fn medic_action(
        &self,
        agent: &AgentView,
        snapshot: &Snapshot,
        claimed: &mut BTreeSet<SurvivorId>,
    ) -> Action {
        if agent.carrying.is_some() {
            let candidates: Vec<Candidate> = snapshot
                .hospitals
                .iter()
                .filter_map(|h| self.rollout_delivery(agent, h))
                .collect();
            return self.best(candidates).map(|c| c.action).unwrap_or(Action::Idle);
        }

        let mut candidates: Vec<Candidate> = snapshot
            .survivors
            .iter()
            .filter(|s| s.status == SurvivorStatus::Waiting && !claimed.contains(&s.id))
            .filter_map(|s| self.rollout_rescue(agent, s, snapshot))
            .collect();

        candidates.sort_by_key(|c| OrderedFloat(-c.score));
        candidates.truncate(self.config.lookahead_candidates);

        match self.best(candidates) {
            Some(c) => {
                if let Some(sid) = c.claims {
                    claimed.insert(sid);
                }
                c.action
            }
            None => Action::Idle,
        }
    }

    fn truck_action(&self, agent: &AgentView, snapshot: &Snapshot) -> Action {
        let mut candidates: Vec<Candidate> = snapshot
            .fires
            .iter()
            .filter_map(|f| self.rollout_fire(agent, f))
            .collect();
        candidates.extend(
            snapshot
                .rubble
                .iter()
                .filter_map(|&pos| self.rollout_rubble(agent, pos)),
        );

        candidates.sort_by_key(|c| OrderedFloat(-c.score));
        candidates.truncate(self.config.lookahead_candidates);
        self.best(candidates).map(|c| c.action).unwrap_or(Action::Idle)
    }

    fn drone_action(&self, agent: &AgentView, snapshot: &Snapshot) -> Action {
        // scouting has no score weight; shadow the hottest fire cheaply
        if agent.battery < self.config.move_cost {
            return Action::Idle;
        }
        let fire = snapshot
            .fires
            .iter()
            .max_by_key(|f| (f.intensity, std::cmp::Reverse(agent.pos.manhattan(&f.pos)), f.pos));
        match fire {
            Some(f) if f.pos != agent.pos => Action::MoveTo { target: f.pos },
            _ => Action::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentId, HospitalId};
    use crate::world::agents::AgentKind;
    use crate::world::metrics::Metrics;

    fn snapshot() -> Snapshot {
        Snapshot {
            tick: 1,
            width: 12,
            height: 12,
            depot: GridPos::new(0, 0),
            agents: vec![],
            survivors: vec![],
            fires: vec![],
            rubble: vec![],
            hospitals: vec![HospitalView {
                id: HospitalId(0),
                pos: GridPos::new(11, 11),
                capacity: 3,
                occupancy: 0,
                queue_len: 0,
            }],
            metrics: Metrics::default(),
        }
    }

    fn agent(id: u32, kind: AgentKind, pos: GridPos) -> AgentView {
        AgentView {
            id: AgentId(id),
            kind,
            pos,
            fuel: 100.0,
            water: 100.0,
            battery: 100.0,
            carrying: None,
        }
    }

    fn survivor(id: u32, pos: GridPos, health: f32) -> SurvivorView {
        SurvivorView {
            id: SurvivorId(id),
            pos,
            health,
            status: SurvivorStatus::Waiting,
            attending_medic: None,
        }
    }

    #[test]
    fn medic_prefers_savable_survivor_over_doomed_nearer_one() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Medic, GridPos::new(0, 0)));
        // nearer but will be dead long before pickup
        snap.survivors.push(survivor(0, GridPos::new(3, 0), 2.0));
        snap.survivors.push(survivor(1, GridPos::new(5, 0), 90.0));
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        let plan = strategy.plan(&snap);
        assert_eq!(
            plan.commands[0].action,
            Action::MoveTo {
                target: GridPos::new(5, 0)
            }
        );
    }

    #[test]
    fn truck_weighs_intensity_against_distance() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(0, 0)));
        snap.fires.push(FireView {
            pos: GridPos::new(1, 0),
            intensity: 1,
        });
        snap.fires.push(FireView {
            pos: GridPos::new(2, 0),
            intensity: 3,
        });
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        let plan = strategy.plan(&snap);
        // the 3-intensity fire outranks the 1-intensity one a cell closer
        assert_eq!(
            plan.commands[0].action,
            Action::MoveTo {
                target: GridPos::new(2, 0)
            }
        );
    }

    #[test]
    fn lookahead_depth_changes_commitment() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(0, 0)));
        snap.fires.push(FireView {
            pos: GridPos::new(1, 0),
            intensity: 1,
        });
        snap.fires.push(FireView {
            pos: GridPos::new(8, 0),
            intensity: 3,
        });

        // shallow horizon: the hot fire cannot be finished in time, the
        // small one next door can
        let mut shallow = PlanExecuteStrategy::new(SimulationConfig {
            lookahead_depth: 3,
            ..Default::default()
        });
        assert_eq!(
            shallow.plan(&snap).commands[0].action,
            Action::MoveTo {
                target: GridPos::new(1, 0)
            }
        );

        // deep horizon: the rollout reaches and extinguishes the hot fire,
        // whose larger payoff wins
        let mut deep = PlanExecuteStrategy::new(SimulationConfig {
            lookahead_depth: 30,
            ..Default::default()
        });
        assert_eq!(
            deep.plan(&snap).commands[0].action,
            Action::MoveTo {
                target: GridPos::new(8, 0)
            }
        );
    }

    #[test]
    fn drained_tank_rules_out_candidate() {
        let mut snap = snapshot();
        let mut truck = agent(0, AgentKind::Truck, GridPos::new(0, 0));
        truck.water = 5.0;
        snap.agents.push(truck);
        snap.fires.push(FireView {
            pos: GridPos::new(1, 0),
            intensity: 2,
        });
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        // the rollout hits the extinguish tick and cannot pay for it
        assert_eq!(strategy.plan(&snap).commands[0].action, Action::Idle);
    }

    #[test]
    fn medic_with_dry_tank_idles() {
        let mut snap = snapshot();
        let mut medic = agent(0, AgentKind::Medic, GridPos::new(0, 0));
        medic.fuel = 0.0;
        snap.agents.push(medic);
        snap.survivors.push(survivor(0, GridPos::new(2, 0), 90.0));
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        assert_eq!(strategy.plan(&snap).commands[0].action, Action::Idle);
    }

    #[test]
    fn commits_terminal_action_when_on_target() {
        let mut snap = snapshot();
        let mut medic = agent(0, AgentKind::Medic, GridPos::new(11, 11));
        medic.carrying = Some(SurvivorId(7));
        snap.agents.push(medic);
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        let plan = strategy.plan(&snap);
        assert_eq!(plan.commands[0].action, Action::DropAtHospital);
    }

    #[test]
    fn every_agent_commanded() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(0, 0)));
        snap.agents.push(agent(1, AgentKind::Medic, GridPos::new(0, 0)));
        snap.agents.push(agent(2, AgentKind::Drone, GridPos::new(0, 0)));
        let mut strategy = PlanExecuteStrategy::new(SimulationConfig::default());
        let plan = strategy.plan(&snap);
        assert_eq!(plan.commands.len(), 3);
    }
}
