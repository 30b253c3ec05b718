//! World/Tick engine - owns all simulation state
//!
//! Per tick, in fixed order: dynamics advance (fire, health, hospitals),
//! the world emits a sensing snapshot, the planner returns commands, and
//! commands are validated and applied in ascending agent id. A tick either
//! fully commits or the episode fails; no partial state escapes.

pub mod agents;
pub mod command;
pub mod hospital;
pub mod metrics;
pub mod resources;
pub mod sensing;
pub mod survivor;

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{CrisisError, Result};
use crate::core::types::{AgentId, GridPos, HospitalId, SurvivorId, Tick};
use crate::grid::{dynamics, pathfinding, Grid, Terrain};
use crate::planner::Plan;
use crate::scenario::Scenario;

pub use agents::{Agent, AgentKind};
pub use command::{Action, Command, CommandRejection, RejectReason, TickOutcome};
pub use hospital::{AdmitOutcome, Hospital};
pub use metrics::Metrics;
pub use resources::{ResourceKind, ResourceLedger};
pub use sensing::{AgentView, FireView, HospitalView, Snapshot, SurvivorView};
pub use survivor::{Survivor, SurvivorStatus};

pub struct World {
    config: SimulationConfig,
    grid: Grid,
    agents: BTreeMap<AgentId, Agent>,
    survivors: BTreeMap<SurvivorId, Survivor>,
    hospitals: BTreeMap<HospitalId, Hospital>,
    ledger: ResourceLedger,
    depot: GridPos,
    rng: ChaCha8Rng,
    tick: Tick,
    metrics: Metrics,
}

impl World {
    /// Build an episode world from a validated scenario.
    pub fn from_scenario(
        scenario: &Scenario,
        config: SimulationConfig,
        seed: u64,
    ) -> Result<Self> {
        scenario.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = Grid::new(scenario.width, scenario.height);

        for &(x, y) in &scenario.blocked {
            grid.cell_mut(GridPos::new(x, y)).unwrap().terrain = Terrain::Blocked;
        }
        for &(x, y) in &scenario.rubble {
            grid.cell_mut(GridPos::new(x, y)).unwrap().rubble = true;
        }
        for &(x, y) in &scenario.initial_fires {
            grid.cell_mut(GridPos::new(x, y)).unwrap().fire = 1;
        }

        let depot = scenario.depot_pos();
        grid.cell_mut(depot).unwrap().fireproof = true;

        let mut hospitals = BTreeMap::new();
        for (i, spec) in scenario.hospitals.iter().enumerate() {
            let id = HospitalId(i as u32);
            let pos = GridPos::new(spec.pos.0, spec.pos.1);
            grid.cell_mut(pos).unwrap().fireproof = true;
            hospitals.insert(id, Hospital::new(id, pos, spec.capacity));
        }

        // Explicitly placed survivors first, then randomly placed ones on
        // free ground (not fire, rubble, blocked, hospital, or depot)
        let mut survivors = BTreeMap::new();
        let mut next_id = 0u32;
        for &(x, y) in &scenario.survivor_positions {
            let id = SurvivorId(next_id);
            next_id += 1;
            survivors.insert(
                id,
                Survivor::new(id, GridPos::new(x, y), config.survivor_initial_health, 0),
            );
        }
        for _ in 0..scenario.survivors {
            let pos = random_free_cell(&grid, &hospitals, depot, &mut rng)?;
            let id = SurvivorId(next_id);
            next_id += 1;
            survivors.insert(id, Survivor::new(id, pos, config.survivor_initial_health, 0));
        }

        // Responders spawn at the depot: trucks, then medics, then drones
        let mut agents = BTreeMap::new();
        let mut ledger = ResourceLedger::default();
        let mut next_agent = 0u32;
        let roster = [
            (AgentKind::Truck, scenario.roster.trucks),
            (AgentKind::Medic, scenario.roster.medics),
            (AgentKind::Drone, scenario.roster.drones),
        ];
        for (kind, count) in roster {
            for _ in 0..count {
                let id = AgentId(next_agent);
                next_agent += 1;
                agents.insert(id, Agent::new(id, kind, depot));
                ledger.register(id, &config);
            }
        }

        let metrics = Metrics {
            total_survivors: survivors.len() as u32,
            ..Default::default()
        };

        Ok(Self {
            config,
            grid,
            agents,
            survivors,
            hospitals,
            ledger,
            depot,
            rng,
            tick: 0,
            metrics,
        })
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn survivor(&self, id: SurvivorId) -> Option<&Survivor> {
        self.survivors.get(&id)
    }

    pub fn hospital(&self, id: HospitalId) -> Option<&Hospital> {
        self.hospitals.get(&id)
    }

    /// All survivors terminal and all fires out
    pub fn is_settled(&self) -> bool {
        self.survivors.values().all(|s| s.status.is_terminal())
            && self.grid.active_fire_count() == 0
    }

    /// Advance world dynamics by one tick: fire spread, health decay,
    /// hospital discharge and queue promotion. RNG is consumed in a fixed
    /// order (fires row-major, survivors then hospitals ascending id) so
    /// identical seeds replay identically.
    pub fn advance(&mut self) -> Result<()> {
        self.tick += 1;

        dynamics::spread_fires(&mut self.grid, &mut self.rng, &self.config);

        // Health decay; deaths cascade into queues and assignments
        let survivor_ids: Vec<SurvivorId> = self.survivors.keys().copied().collect();
        for id in survivor_ids {
            let (decays, pos) = {
                let s = &self.survivors[&id];
                (s.decays(), s.pos)
            };
            if !decays {
                continue;
            }
            let mut decay = self.config.health_decay_rate;
            if self.grid.fire_adjacent(pos) {
                decay += self.config.fire_proximity_penalty;
            }
            let survivor = self.survivors.get_mut(&id).unwrap();
            survivor.health = (survivor.health - decay).max(0.0);
            if survivor.health <= 0.0 {
                survivor.kill();
                self.metrics.deaths += 1;
                tracing::debug!(tick = self.tick, survivor = id.0, "survivor died");
                for hospital in self.hospitals.values_mut() {
                    hospital.purge(id);
                }
                for agent in self.agents.values_mut() {
                    if agent.assignment == Some(id) {
                        agent.assignment = None;
                    }
                }
            }
        }

        // Hospitals: stochastic discharge frees beds, then queued survivors
        // are promoted in severity order
        let hospital_ids: Vec<HospitalId> = self.hospitals.keys().copied().collect();
        for hid in hospital_ids {
            let service = {
                let h = &self.hospitals[&hid];
                h.occupancy > 0 && self.rng.gen_bool(self.config.hospital_service_rate)
            };
            if service {
                self.hospitals.get_mut(&hid).unwrap().discharge();
            }
            while let Some(sid) = self.hospitals.get_mut(&hid).unwrap().promote() {
                let tick = self.tick;
                let survivor = self.survivors.get_mut(&sid).ok_or_else(|| {
                    CrisisError::InvariantViolation(format!("queued survivor {:?} missing", sid))
                })?;
                let pickup = survivor.pickup_tick.ok_or_else(|| {
                    CrisisError::InvariantViolation(format!(
                        "survivor {:?} promoted without a pickup tick",
                        sid
                    ))
                })?;
                survivor.rescue();
                self.metrics.record_rescue(pickup, tick);
                tracing::debug!(tick, survivor = sid.0, hospital = hid.0, "promoted from queue");
            }
        }

        Ok(())
    }

    /// Read-only projection for the planner.
    pub fn sense(&self) -> Snapshot {
        let agents = self
            .agents
            .values()
            .map(|a| {
                let tank = self.ledger.tank(a.id).copied().unwrap_or(resources::Tank {
                    fuel: 0.0,
                    water: 0.0,
                    battery: 0.0,
                });
                AgentView {
                    id: a.id,
                    kind: a.kind,
                    pos: a.pos,
                    fuel: tank.fuel,
                    water: tank.water,
                    battery: tank.battery,
                    carrying: a.carrying,
                }
            })
            .collect();

        // Grounded survivors only; carried ones travel with their medic
        let survivors = self
            .survivors
            .values()
            .filter(|s| !s.status.is_terminal() && !s.carried)
            .map(|s| SurvivorView {
                id: s.id,
                pos: s.pos,
                health: s.health,
                status: s.status,
                attending_medic: s.attending_medic,
            })
            .collect();

        let fires = self
            .grid
            .burning_cells()
            .into_iter()
            .map(|(pos, intensity)| FireView { pos, intensity })
            .collect();

        let mut rubble = Vec::new();
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let pos = GridPos::new(x, y);
                if self.grid.cell(pos).map(|c| c.rubble).unwrap_or(false) {
                    rubble.push(pos);
                }
            }
        }

        let hospitals = self
            .hospitals
            .values()
            .map(|h| HospitalView {
                id: h.id,
                pos: h.pos,
                capacity: h.capacity,
                occupancy: h.occupancy,
                queue_len: h.queue_len(),
            })
            .collect();

        Snapshot {
            tick: self.tick,
            width: self.grid.width(),
            height: self.grid.height(),
            depot: self.depot,
            agents,
            survivors,
            fires,
            rubble,
            hospitals,
            metrics: self.metrics.clone(),
        }
    }

    /// Validate and apply one plan. Commands run in ascending agent id;
    /// the first command per agent wins and missing agents idle. Rejected
    /// commands increment `command_failures` and leave the agent idle.
    pub fn apply_plan(&mut self, plan: Plan) -> Result<TickOutcome> {
        let mut outcome = TickOutcome {
            tick: self.tick,
            ..Default::default()
        };

        self.metrics.tool_calls += plan.commands.len() as u32;
        self.metrics.replans += plan.replans;
        self.metrics.invalid_json += plan.invalid_json;

        let mut actions: BTreeMap<AgentId, Action> = BTreeMap::new();
        for cmd in plan.commands {
            if !self.agents.contains_key(&cmd.agent) {
                self.metrics.command_failures += 1;
                outcome.rejections.push(CommandRejection {
                    agent: cmd.agent,
                    action: cmd.action,
                    reason: RejectReason::InvalidTarget {
                        detail: format!("unknown agent {:?}", cmd.agent),
                    },
                });
                continue;
            }
            actions.entry(cmd.agent).or_insert(cmd.action);
        }

        // Survivors claimed within this tick; a later agent id targeting the
        // same survivor is rejected, not silently overwritten
        let mut claimed: BTreeSet<SurvivorId> = BTreeSet::new();

        for (agent_id, action) in actions {
            if let Err(reason) = self.apply_action(agent_id, action, &mut claimed, &mut outcome) {
                tracing::debug!(
                    tick = self.tick,
                    agent = agent_id.0,
                    ?action,
                    ?reason,
                    "command rejected"
                );
                self.metrics.command_failures += 1;
                outcome.rejections.push(CommandRejection {
                    agent: agent_id,
                    action,
                    reason,
                });
            }
        }

        // Depot replenishment after movement settles
        let at_depot: Vec<AgentId> = self
            .agents
            .values()
            .filter(|a| a.pos == self.depot)
            .map(|a| a.id)
            .collect();
        for id in at_depot {
            self.ledger.replenish(id, &self.config);
        }

        Ok(outcome)
    }

    fn apply_action(
        &mut self,
        agent_id: AgentId,
        action: Action,
        claimed: &mut BTreeSet<SurvivorId>,
        outcome: &mut TickOutcome,
    ) -> std::result::Result<(), RejectReason> {
        match action {
            Action::Idle => Ok(()),
            Action::MoveTo { target } => self.apply_move(agent_id, target, claimed),
            Action::Extinguish => self.apply_extinguish(agent_id),
            Action::ClearRubble => self.apply_clear_rubble(agent_id),
            Action::PickUp { survivor } => self.apply_pickup(agent_id, survivor, claimed),
            Action::DropAtHospital => self.apply_drop(agent_id, outcome),
        }
    }

    fn apply_move(
        &mut self,
        agent_id: AgentId,
        target: GridPos,
        claimed: &mut BTreeSet<SurvivorId>,
    ) -> std::result::Result<(), RejectReason> {
        if !self.grid.is_passable(target) {
            return Err(RejectReason::InvalidTarget {
                detail: format!("target {} is blocked or out of bounds", target),
            });
        }

        let (kind, pos, free_hands) = {
            let a = &self.agents[&agent_id];
            (a.kind, a.pos, a.has_free_hands())
        };

        // A medic moving onto a waiting survivor's cell claims that rescue.
        // Conflicting claims resolve by application order: first id wins.
        let mut claim: Option<SurvivorId> = None;
        if kind.can_carry() && free_hands {
            let ground_target = self
                .survivors
                .values()
                .find(|s| {
                    s.pos == target
                        && matches!(
                            s.status,
                            SurvivorStatus::Waiting | SurvivorStatus::Assigned
                        )
                })
                .map(|s| (s.id, s.status, s.attending_medic));
            if let Some((sid, status, attending)) = ground_target {
                let claimed_by_other = claimed.contains(&sid)
                    || (status == SurvivorStatus::Assigned && attending != Some(agent_id));
                if claimed_by_other {
                    return Err(RejectReason::DuplicateAssignment { survivor: sid });
                }
                claim = Some(sid);
            }
        }

        let path = match pathfinding::path(&self.grid, pos, target, &self.config) {
            Ok(p) => p,
            Err(_) => {
                // Revoke a stale claim so another medic may take it later
                let assignment = self.agents[&agent_id].assignment;
                if let Some(sid) = assignment {
                    if let Some(s) = self.survivors.get_mut(&sid) {
                        if s.status == SurvivorStatus::Assigned {
                            s.unassign();
                        }
                    }
                    self.agents.get_mut(&agent_id).unwrap().assignment = None;
                }
                return Err(RejectReason::NotReachable { target });
            }
        };

        if let Some(sid) = claim {
            claimed.insert(sid);
            if let Some(s) = self.survivors.get_mut(&sid) {
                if s.status == SurvivorStatus::Waiting {
                    s.assign(agent_id);
                }
            }
            self.agents.get_mut(&agent_id).unwrap().assignment = Some(sid);
        }

        let Some(next) = path.first_step() else {
            return Ok(()); // already at target
        };

        let resource = if kind.can_scout() {
            ResourceKind::Battery
        } else {
            ResourceKind::Fuel
        };
        self.ledger
            .charge(agent_id, resource, self.config.move_cost)
            .map_err(|_| RejectReason::InsufficientResource { kind: resource })?;
        self.metrics.energy_used += self.config.move_cost as f64;

        let carrying = {
            let agent = self.agents.get_mut(&agent_id).unwrap();
            agent.pos = next;
            agent.carrying
        };
        if let Some(sid) = carrying {
            if let Some(s) = self.survivors.get_mut(&sid) {
                s.pos = next;
            }
        }
        Ok(())
    }

    fn apply_extinguish(&mut self, agent_id: AgentId) -> std::result::Result<(), RejectReason> {
        let (kind, pos) = {
            let a = &self.agents[&agent_id];
            (a.kind, a.pos)
        };
        if !kind.can_extinguish() {
            return Err(RejectReason::NotCapable);
        }
        if !self.grid.is_burning(pos) {
            return Err(RejectReason::InvalidTarget {
                detail: format!("no fire at {}", pos),
            });
        }
        self.ledger
            .charge(agent_id, ResourceKind::Water, self.config.extinguish_cost)
            .map_err(|_| RejectReason::InsufficientResource {
                kind: ResourceKind::Water,
            })?;

        let cell = self.grid.cell_mut(pos).unwrap();
        cell.fire = cell.fire.saturating_sub(self.config.extinguish_power);
        if cell.fire == 0 {
            self.metrics.fires_extinguished += 1;
            tracing::debug!(tick = self.tick, agent = agent_id.0, %pos, "fire extinguished");
        }
        Ok(())
    }

    fn apply_clear_rubble(&mut self, agent_id: AgentId) -> std::result::Result<(), RejectReason> {
        let (kind, pos) = {
            let a = &self.agents[&agent_id];
            (a.kind, a.pos)
        };
        if !kind.can_clear_rubble() {
            return Err(RejectReason::NotCapable);
        }
        if !self.grid.cell(pos).map(|c| c.rubble).unwrap_or(false) {
            return Err(RejectReason::InvalidTarget {
                detail: format!("no rubble at {}", pos),
            });
        }
        self.ledger
            .charge(agent_id, ResourceKind::Fuel, self.config.clear_rubble_cost)
            .map_err(|_| RejectReason::InsufficientResource {
                kind: ResourceKind::Fuel,
            })?;
        self.grid.cell_mut(pos).unwrap().rubble = false;
        self.metrics.roads_cleared += 1;
        Ok(())
    }

    fn apply_pickup(
        &mut self,
        agent_id: AgentId,
        survivor_id: SurvivorId,
        claimed: &mut BTreeSet<SurvivorId>,
    ) -> std::result::Result<(), RejectReason> {
        let (kind, pos, free_hands) = {
            let a = &self.agents[&agent_id];
            (a.kind, a.pos, a.has_free_hands())
        };
        if !kind.can_carry() {
            return Err(RejectReason::NotCapable);
        }
        if !free_hands {
            return Err(RejectReason::InvalidTarget {
                detail: "already carrying a survivor".into(),
            });
        }

        let Some(survivor) = self.survivors.get(&survivor_id) else {
            return Err(RejectReason::InvalidTarget {
                detail: format!("unknown survivor {:?}", survivor_id),
            });
        };
        if survivor.status.is_terminal() || survivor.carried {
            return Err(RejectReason::InvalidTarget {
                detail: format!("survivor {:?} is no longer rescuable", survivor_id),
            });
        }
        if survivor.pos != pos {
            return Err(RejectReason::InvalidTarget {
                detail: format!("survivor {:?} is not at {}", survivor_id, pos),
            });
        }
        let claimed_by_other = claimed.contains(&survivor_id)
            || (survivor.status == SurvivorStatus::Assigned
                && survivor.attending_medic != Some(agent_id));
        if claimed_by_other {
            return Err(RejectReason::DuplicateAssignment {
                survivor: survivor_id,
            });
        }

        claimed.insert(survivor_id);
        let tick = self.tick;
        self.survivors
            .get_mut(&survivor_id)
            .unwrap()
            .pick_up(agent_id, tick);
        let agent = self.agents.get_mut(&agent_id).unwrap();
        agent.carrying = Some(survivor_id);
        agent.assignment = None;
        tracing::debug!(tick, agent = agent_id.0, survivor = survivor_id.0, "picked up");
        Ok(())
    }

    fn apply_drop(
        &mut self,
        agent_id: AgentId,
        outcome: &mut TickOutcome,
    ) -> std::result::Result<(), RejectReason> {
        let (kind, pos, carrying) = {
            let a = &self.agents[&agent_id];
            (a.kind, a.pos, a.carrying)
        };
        if !kind.can_carry() {
            return Err(RejectReason::NotCapable);
        }
        let Some(survivor_id) = carrying else {
            return Err(RejectReason::InvalidTarget {
                detail: "not carrying a survivor".into(),
            });
        };
        let Some(hospital_id) = self
            .hospitals
            .values()
            .find(|h| h.pos == pos)
            .map(|h| h.id)
        else {
            return Err(RejectReason::InvalidTarget {
                detail: format!("no hospital at {}", pos),
            });
        };

        let health = self.survivors[&survivor_id].health;
        let tick = self.tick;
        let hospital = self.hospitals.get_mut(&hospital_id).unwrap();
        let hospital_pos = hospital.pos;
        match hospital.admit(survivor_id, health, tick) {
            AdmitOutcome::Admitted => {
                let survivor = self.survivors.get_mut(&survivor_id).unwrap();
                let pickup = survivor.pickup_tick.unwrap_or(tick);
                survivor.set_down(hospital_pos);
                survivor.rescue();
                self.metrics.record_rescue(pickup, tick);
                tracing::debug!(
                    tick,
                    agent = agent_id.0,
                    survivor = survivor_id.0,
                    hospital = hospital_id.0,
                    "admitted"
                );
            }
            AdmitOutcome::Queued => {
                self.survivors
                    .get_mut(&survivor_id)
                    .unwrap()
                    .set_down(hospital_pos);
                self.metrics.hospital_overflow_events += 1;
                outcome.overflows.push((hospital_id, survivor_id));
                tracing::debug!(
                    tick,
                    survivor = survivor_id.0,
                    hospital = hospital_id.0,
                    "hospital full, queued"
                );
            }
        }
        self.agents.get_mut(&agent_id).unwrap().carrying = None;
        Ok(())
    }
}

/// Random passable cell holding nothing of interest
fn random_free_cell(
    grid: &Grid,
    hospitals: &BTreeMap<HospitalId, Hospital>,
    depot: GridPos,
    rng: &mut ChaCha8Rng,
) -> Result<GridPos> {
    for _ in 0..10_000 {
        let pos = GridPos::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
        let Some(cell) = grid.cell(pos) else { continue };
        if cell.terrain != Terrain::Passable || cell.fire > 0 || cell.rubble {
            continue;
        }
        if pos == depot || hospitals.values().any(|h| h.pos == pos) {
            continue;
        }
        return Ok(pos);
    }
    Err(CrisisError::InvalidScenario(
        "no free cell available for survivor placement".into(),
    ))
}
