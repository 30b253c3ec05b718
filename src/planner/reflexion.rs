//! ReAct with reflexion - learn from last tick's failures
//!
//! After commands are validated and applied, each rejection becomes a
//! short critique ("cell (3,4) unreachable, avoid") held for a fixed
//! window of ticks. The next react pass consults the memory and biases
//! away from the failed target; every biased choice counts as a replan.

use std::collections::{BTreeMap, VecDeque};

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, GridPos, HospitalId, Tick};
use crate::planner::react::react_commands;
use crate::planner::{Plan, Strategy};
use crate::world::command::{Action, RejectReason, TickOutcome};
use crate::world::sensing::Snapshot;

/// What a critique tells an agent to stay away from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AvoidTarget {
    Cell(GridPos),
    Hospital(HospitalId),
}

const MAX_NOTES: usize = 5;

/// Per-strategy memory of recent failures
#[derive(Debug, Default)]
pub struct CritiqueMemory {
    /// (agent, target) -> tick at which the entry expires
    avoid: BTreeMap<(AgentId, AvoidTarget), Tick>,
    /// Hospital overflows affect every agent
    hospital_avoid: BTreeMap<HospitalId, Tick>,
    /// Human-readable critiques, newest last, capped at MAX_NOTES
    notes: VecDeque<String>,
}

impl CritiqueMemory {
    pub fn is_avoided(&self, agent: AgentId, target: AvoidTarget) -> bool {
        if let AvoidTarget::Hospital(id) = target {
            if self.hospital_avoid.contains_key(&id) {
                return true;
            }
        }
        self.avoid.contains_key(&(agent, target))
    }

    pub fn record_overflow(&mut self, hospital: HospitalId, until: Tick, note: String) {
        self.hospital_avoid.insert(hospital, until);
        self.push_note(note);
    }

    pub fn record(&mut self, agent: AgentId, target: AvoidTarget, until: Tick, note: String) {
        self.avoid.insert((agent, target), until);
        self.push_note(note);
    }

    fn push_note(&mut self, note: String) {
        if self.notes.len() == MAX_NOTES {
            self.notes.pop_front();
        }
        self.notes.push_back(note);
    }

    /// Drop critiques whose window has passed
    pub fn prune(&mut self, tick: Tick) {
        self.avoid.retain(|_, &mut until| until > tick);
        self.hospital_avoid.retain(|_, &mut until| until > tick);
    }

    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.avoid.is_empty() && self.hospital_avoid.is_empty()
    }
}

pub struct ReflexionStrategy {
    memory: CritiqueMemory,
    window: u64,
}

impl ReflexionStrategy {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            memory: CritiqueMemory::default(),
            window: config.reflexion_window,
        }
    }

    pub fn memory(&self) -> &CritiqueMemory {
        &self.memory
    }
}

impl Strategy for ReflexionStrategy {
    fn name(&self) -> &'static str {
        "react_reflexion"
    }

    fn plan(&mut self, snapshot: &Snapshot) -> Plan {
        self.memory.prune(snapshot.tick);
        let (commands, replans) = react_commands(snapshot, Some(&self.memory));
        Plan {
            commands,
            replans,
            invalid_json: 0,
        }
    }

    fn reflect(&mut self, outcome: &TickOutcome) {
        let until = outcome.tick + self.window;

        for rejection in &outcome.rejections {
            match &rejection.reason {
                RejectReason::NotReachable { target } => {
                    self.memory.record(
                        rejection.agent,
                        AvoidTarget::Cell(*target),
                        until,
                        format!("cell {} unreachable for agent {}, avoid", target, rejection.agent.0),
                    );
                }
                RejectReason::DuplicateAssignment { survivor } => {
                    // another medic owns this rescue; back off if we know
                    // where it was aimed
                    if let Action::MoveTo { target } = rejection.action {
                        self.memory.record(
                            rejection.agent,
                            AvoidTarget::Cell(target),
                            until,
                            format!("survivor {} already claimed, avoid", survivor.0),
                        );
                    }
                }
                RejectReason::InsufficientResource { kind } => {
                    // a distant target we cannot afford; steer elsewhere
                    if let Action::MoveTo { target } = rejection.action {
                        self.memory.record(
                            rejection.agent,
                            AvoidTarget::Cell(target),
                            until,
                            format!("agent {} out of {}, drop target {}", rejection.agent.0, kind.as_str(), target),
                        );
                    }
                }
                RejectReason::InvalidTarget { .. } | RejectReason::NotCapable => {}
            }
        }

        for (hospital, survivor) in &outcome.overflows {
            self.memory.record_overflow(
                *hospital,
                until,
                format!("hospital {} overflowed on survivor {}", hospital.0, survivor.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::command::CommandRejection;

    #[test]
    fn memory_expires_after_window() {
        let mut memory = CritiqueMemory::default();
        let agent = AgentId(0);
        let target = AvoidTarget::Cell(GridPos::new(3, 4));
        memory.record(agent, target, 10, "test".into());
        assert!(memory.is_avoided(agent, target));
        memory.prune(9);
        assert!(memory.is_avoided(agent, target));
        memory.prune(10);
        assert!(!memory.is_avoided(agent, target));
    }

    #[test]
    fn notes_are_capped() {
        let mut memory = CritiqueMemory::default();
        for i in 0..10 {
            memory.record(
                AgentId(0),
                AvoidTarget::Cell(GridPos::new(i, 0)),
                100,
                format!("note {i}"),
            );
        }
        assert_eq!(memory.notes().count(), MAX_NOTES);
        assert_eq!(memory.notes().last(), Some("note 9"));
    }

    #[test]
    fn unreachable_rejection_becomes_avoid_entry() {
        let config = SimulationConfig::default();
        let mut strategy = ReflexionStrategy::new(&config);
        let target = GridPos::new(7, 7);
        let outcome = TickOutcome {
            tick: 3,
            rejections: vec![CommandRejection {
                agent: AgentId(1),
                action: Action::MoveTo { target },
                reason: RejectReason::NotReachable { target },
            }],
            overflows: vec![],
        };
        strategy.reflect(&outcome);
        assert!(strategy.memory().is_avoided(AgentId(1), AvoidTarget::Cell(target)));
        // window: expires after tick 3 + reflexion_window
        strategy.memory.prune(3 + config.reflexion_window);
        assert!(!strategy.memory().is_avoided(AgentId(1), AvoidTarget::Cell(target)));
    }
}
