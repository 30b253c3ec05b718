//! ReAct heuristic - stateless greedy assignment
//!
//! Medics chase the nearest unclaimed waiting survivor and ferry their
//! patient to the nearest hospital with a free bed; trucks work the nearest
//! fire and clear rubble when the fires are out; drones shadow the biggest
//! fire as scouts. Distances are Manhattan; the world's own pathfinder
//! settles actual routes and reachability.

use crate::planner::reflexion::{AvoidTarget, CritiqueMemory};
use crate::planner::{Plan, Strategy};
use crate::world::command::{Action, Command};
use crate::world::sensing::{AgentView, Snapshot};
use crate::world::survivor::SurvivorStatus;
use std::collections::BTreeSet;

use crate::core::types::SurvivorId;

pub struct ReactStrategy;

impl Strategy for ReactStrategy {
    fn name(&self) -> &'static str {
        "react"
    }

    fn plan(&mut self, snapshot: &Snapshot) -> Plan {
        let (commands, _) = react_commands(snapshot, None);
        Plan::from_commands(commands)
    }
}

/// Shared heuristic core. With a critique memory, previously failed
/// targets are skipped and each skip is counted as one replan.
pub(crate) fn react_commands(
    snapshot: &Snapshot,
    memory: Option<&CritiqueMemory>,
) -> (Vec<Command>, u32) {
    let mut commands = Vec::new();
    let mut replans = 0u32;
    // survivors claimed this tick so two medics never chase the same one
    let mut claimed: BTreeSet<SurvivorId> = BTreeSet::new();

    for agent in &snapshot.agents {
        let action = if agent.kind.can_carry() {
            medic_action(agent, snapshot, memory, &mut claimed, &mut replans)
        } else if agent.kind.can_extinguish() {
            truck_action(agent, snapshot, memory, &mut replans)
        } else {
            drone_action(agent, snapshot)
        };
        commands.push(Command::new(agent.id, action));
    }

    (commands, replans)
}

fn avoided(memory: Option<&CritiqueMemory>, agent: &AgentView, target: AvoidTarget) -> bool {
    memory.map(|m| m.is_avoided(agent.id, target)).unwrap_or(false)
}

fn medic_action(
    agent: &AgentView,
    snapshot: &Snapshot,
    memory: Option<&CritiqueMemory>,
    claimed: &mut BTreeSet<SurvivorId>,
    replans: &mut u32,
) -> Action {
    if agent.carrying.is_some() {
        // Deliver: nearest hospital, preferring ones with a free bed
        let viable = |free_only: bool| {
            snapshot
                .hospitals
                .iter()
                .filter(|h| !free_only || h.occupancy < h.capacity)
                .filter(|h| !avoided(memory, agent, AvoidTarget::Hospital(h.id)))
                .min_by_key(|h| (agent.pos.manhattan(&h.pos), h.id))
        };
        let hospital = viable(true).or_else(|| {
            // every hospital full or avoided; take the nearest regardless
            snapshot
                .hospitals
                .iter()
                .min_by_key(|h| (agent.pos.manhattan(&h.pos), h.id))
        });
        let Some(hospital) = hospital else {
            return Action::Idle;
        };
        if hospital.pos == agent.pos {
            return Action::DropAtHospital;
        }
        return Action::MoveTo {
            target: hospital.pos,
        };
    }

    // Rescue: nearest rescuable survivor not already claimed
    let mut skipped_avoided = false;
    let candidate = snapshot
        .survivors
        .iter()
        .filter(|s| match s.status {
            SurvivorStatus::Waiting => true,
            SurvivorStatus::Assigned => s.attending_medic == Some(agent.id),
            _ => false,
        })
        .filter(|s| !claimed.contains(&s.id))
        .filter(|s| {
            if avoided(memory, agent, AvoidTarget::Cell(s.pos)) {
                skipped_avoided = true;
                false
            } else {
                true
            }
        })
        .min_by_key(|s| (agent.pos.manhattan(&s.pos), s.id));

    let Some(survivor) = candidate else {
        return Action::Idle;
    };
    if skipped_avoided {
        *replans += 1;
    }
    claimed.insert(survivor.id);
    if survivor.pos == agent.pos {
        Action::PickUp {
            survivor: survivor.id,
        }
    } else {
        Action::MoveTo {
            target: survivor.pos,
        }
    }
}

fn truck_action(
    agent: &AgentView,
    snapshot: &Snapshot,
    memory: Option<&CritiqueMemory>,
    replans: &mut u32,
) -> Action {
    if snapshot.fire_at(agent.pos) {
        return Action::Extinguish;
    }

    let mut skipped_avoided = false;
    let fire = snapshot
        .fires
        .iter()
        .filter(|f| {
            if avoided(memory, agent, AvoidTarget::Cell(f.pos)) {
                skipped_avoided = true;
                false
            } else {
                true
            }
        })
        .min_by_key(|f| (agent.pos.manhattan(&f.pos), f.pos));
    if let Some(fire) = fire {
        if skipped_avoided {
            *replans += 1;
        }
        return Action::MoveTo { target: fire.pos };
    }

    // No fires left: reopen roads
    if snapshot.rubble.contains(&agent.pos) {
        return Action::ClearRubble;
    }
    let rubble = snapshot
        .rubble
        .iter()
        .filter(|&&pos| !avoided(memory, agent, AvoidTarget::Cell(pos)))
        .min_by_key(|&&pos| (agent.pos.manhattan(&pos), pos));
    match rubble {
        Some(&pos) => Action::MoveTo { target: pos },
        None => Action::Idle,
    }
}

fn drone_action(agent: &AgentView, snapshot: &Snapshot) -> Action {
    // Scout the hottest fire; with no fires, shadow the nearest survivor
    let fire = snapshot
        .fires
        .iter()
        .max_by_key(|f| (f.intensity, std::cmp::Reverse(agent.pos.manhattan(&f.pos)), f.pos));
    if let Some(fire) = fire {
        if fire.pos != agent.pos {
            return Action::MoveTo { target: fire.pos };
        }
        return Action::Idle;
    }
    let survivor = snapshot
        .survivors
        .iter()
        .filter(|s| s.status == SurvivorStatus::Waiting)
        .min_by_key(|s| (agent.pos.manhattan(&s.pos), s.id));
    match survivor {
        Some(s) if s.pos != agent.pos => Action::MoveTo { target: s.pos },
        _ => Action::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentId, GridPos, HospitalId, SurvivorId};
    use crate::world::agents::AgentKind;
    use crate::world::metrics::Metrics;
    use crate::world::sensing::{AgentView, FireView, HospitalView, SurvivorView};

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

    fn snapshot() -> Snapshot {
        Snapshot {
            tick: 1,
            width: 10,
            height: 10,
            depot: GridPos::new(0, 0),
            agents: vec![],
            survivors: vec![],
            fires: vec![],
            rubble: vec![],
            hospitals: vec![HospitalView {
                id: HospitalId(0),
                pos: GridPos::new(9, 9),
                capacity: 2,
                occupancy: 0,
                queue_len: 0,
            }],
            metrics: Metrics::default(),
        }
    }

    #[test]
    fn medic_targets_nearest_survivor() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Medic, GridPos::new(0, 0)));
        snap.survivors = vec![
            SurvivorView {
                id: SurvivorId(0),
                pos: GridPos::new(7, 7),
                health: 90.0,
                status: SurvivorStatus::Waiting,
                attending_medic: None,
            },
            SurvivorView {
                id: SurvivorId(1),
                pos: GridPos::new(2, 1),
                health: 90.0,
                status: SurvivorStatus::Waiting,
                attending_medic: None,
            },
        ];
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(
            commands[0].action,
            Action::MoveTo {
                target: GridPos::new(2, 1)
            }
        );
    }

    #[test]
    fn medic_picks_up_when_colocated() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Medic, GridPos::new(3, 3)));
        snap.survivors = vec![SurvivorView {
            id: SurvivorId(4),
            pos: GridPos::new(3, 3),
            health: 50.0,
            status: SurvivorStatus::Waiting,
            attending_medic: None,
        }];
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(
            commands[0].action,
            Action::PickUp {
                survivor: SurvivorId(4)
            }
        );
    }

    #[test]
    fn carrying_medic_heads_for_hospital() {
        let mut snap = snapshot();
        let mut medic = agent(0, AgentKind::Medic, GridPos::new(5, 5));
        medic.carrying = Some(SurvivorId(0));
        snap.agents.push(medic);
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(
            commands[0].action,
            Action::MoveTo {
                target: GridPos::new(9, 9)
            }
        );
    }

    #[test]
    fn two_medics_split_survivors() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Medic, GridPos::new(0, 0)));
        snap.agents.push(agent(1, AgentKind::Medic, GridPos::new(0, 1)));
        snap.survivors = vec![
            SurvivorView {
                id: SurvivorId(0),
                pos: GridPos::new(1, 0),
                health: 90.0,
                status: SurvivorStatus::Waiting,
                attending_medic: None,
            },
            SurvivorView {
                id: SurvivorId(1),
                pos: GridPos::new(1, 1),
                health: 90.0,
                status: SurvivorStatus::Waiting,
                attending_medic: None,
            },
        ];
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(
            commands[0].action,
            Action::MoveTo {
                target: GridPos::new(1, 0)
            }
        );
        assert_eq!(
            commands[1].action,
            Action::MoveTo {
                target: GridPos::new(1, 1)
            }
        );
    }

    #[test]
    fn truck_extinguishes_in_place_then_chases_fires() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(2, 2)));
        snap.fires = vec![FireView {
            pos: GridPos::new(2, 2),
            intensity: 2,
        }];
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(commands[0].action, Action::Extinguish);

        snap.fires[0].pos = GridPos::new(6, 2);
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(
            commands[0].action,
            Action::MoveTo {
                target: GridPos::new(6, 2)
            }
        );
    }

    #[test]
    fn idle_truck_clears_rubble() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(4, 4)));
        snap.rubble = vec![GridPos::new(4, 4)];
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(commands[0].action, Action::ClearRubble);
    }

    #[test]
    fn every_agent_gets_a_command() {
        let mut snap = snapshot();
        snap.agents.push(agent(0, AgentKind::Truck, GridPos::new(0, 0)));
        snap.agents.push(agent(1, AgentKind::Medic, GridPos::new(0, 0)));
        snap.agents.push(agent(2, AgentKind::Drone, GridPos::new(0, 0)));
        let (commands, _) = react_commands(&snap, None);
        assert_eq!(commands.len(), 3);
    }
}
