//! Externally-queried strategy
//!
//! Serializes the sensing snapshot into a structured prompt, queries the
//! text-generation provider synchronously under a timeout, and parses the
//! reply against a strict command schema. Anything malformed, and anything
//! slower than the timeout, counts one invalid_json and falls back to the
//! react heuristic so the tick loop never stalls.

use std::time::Duration;

use serde::Deserialize;

use crate::core::config::SimulationConfig;
use crate::core::error::{CrisisError, Result};
use crate::llm::client::ProviderClient;
use crate::planner::{Plan, Strategy};
use crate::world::command::{Action, Command};
use crate::world::sensing::Snapshot;

use crate::core::types::{AgentId, GridPos, SurvivorId};

const SYSTEM_PROMPT: &str = "You are a rigorous crisis dispatch planner. \
You command trucks (extinguish fires, clear rubble), medics (pick up \
survivors, deliver them to hospitals) and drones (scout). Respond with \
JSON only, no prose.";

pub struct ExternalStrategy {
    client: ProviderClient,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
    fallback: crate::planner::ReactStrategy,
}

impl ExternalStrategy {
    pub fn new(client: ProviderClient, config: &SimulationConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            timeout: Duration::from_millis(config.planner_timeout_ms),
            fallback: crate::planner::ReactStrategy,
        })
    }

    fn query(&self, snapshot: &Snapshot) -> Result<Vec<Command>> {
        let user = build_prompt(snapshot)?;
        let timeout_ms = self.timeout.as_millis() as u64;
        let text = self
            .runtime
            .block_on(async {
                tokio::time::timeout(self.timeout, self.client.complete(SYSTEM_PROMPT, &user))
                    .await
            })
            .map_err(|_| CrisisError::PlannerTimeout(timeout_ms))??;
        parse_commands(&text, snapshot)
    }
}

impl Strategy for ExternalStrategy {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn plan(&mut self, snapshot: &Snapshot) -> Plan {
        match self.query(snapshot) {
            Ok(commands) => Plan::from_commands(commands),
            Err(e) => {
                tracing::warn!(tick = snapshot.tick, error = %e, "external planner failed, falling back to react");
                let mut plan = self.fallback.plan(snapshot);
                plan.invalid_json += 1;
                plan
            }
        }
    }
}

/// Prompt = serialized snapshot + output schema instructions
fn build_prompt(snapshot: &Snapshot) -> Result<String> {
    let state = serde_json::to_string(snapshot)?;
    Ok(format!(
        "World state:\n{state}\n\n\
         Reply with exactly this JSON shape:\n\
         {{\"commands\": [{{\"agent_id\": <number>, \"action\": \"<move_to|extinguish|clear_rubble|pick_up|drop_at_hospital|idle>\", \
         \"target\": [x, y], \"survivor_id\": <number>}}]}}\n\
         Rules: one command per agent; \"target\" only for move_to; \
         \"survivor_id\" only for pick_up; omit fields you do not use."
    ))
}

// Strict reply schema. Anything that does not deserialize, references an
// unknown agent, or omits a required field is MalformedPlannerOutput.
#[derive(Debug, Deserialize)]
struct LlmPlan {
    commands: Vec<LlmCommand>,
}

#[derive(Debug, Deserialize)]
struct LlmCommand {
    agent_id: u32,
    action: LlmAction,
    #[serde(default)]
    target: Option<[i32; 2]>,
    #[serde(default)]
    survivor_id: Option<u32>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum LlmAction {
    MoveTo,
    Extinguish,
    ClearRubble,
    PickUp,
    DropAtHospital,
    Idle,
}

/// Parse the provider's text into validated commands. Every live agent in
/// the snapshot ends up with a command; agents the reply skipped idle.
pub(crate) fn parse_commands(text: &str, snapshot: &Snapshot) -> Result<Vec<Command>> {
    let json = extract_json(text).ok_or_else(|| {
        CrisisError::MalformedPlannerOutput("no JSON object in response".into())
    })?;
    let parsed: LlmPlan = serde_json::from_str(json)
        .map_err(|e| CrisisError::MalformedPlannerOutput(e.to_string()))?;

    let mut commands = Vec::new();
    for cmd in parsed.commands {
        let agent = AgentId(cmd.agent_id);
        if snapshot.agent(agent).is_none() {
            return Err(CrisisError::MalformedPlannerOutput(format!(
                "unknown agent id {}",
                cmd.agent_id
            )));
        }
        let action = match cmd.action {
            LlmAction::MoveTo => {
                let [x, y] = cmd.target.ok_or_else(|| {
                    CrisisError::MalformedPlannerOutput("move_to without target".into())
                })?;
                Action::MoveTo {
                    target: GridPos::new(x, y),
                }
            }
            LlmAction::PickUp => {
                let sid = cmd.survivor_id.ok_or_else(|| {
                    CrisisError::MalformedPlannerOutput("pick_up without survivor_id".into())
                })?;
                Action::PickUp {
                    survivor: SurvivorId(sid),
                }
            }
            LlmAction::Extinguish => Action::Extinguish,
            LlmAction::ClearRubble => Action::ClearRubble,
            LlmAction::DropAtHospital => Action::DropAtHospital,
            LlmAction::Idle => Action::Idle,
        };
        commands.push(Command::new(agent, action));
    }

    // contract: a command for every live agent
    for view in &snapshot.agents {
        if !commands.iter().any(|c| c.agent == view.id) {
            commands.push(Command::idle(view.id));
        }
    }

    Ok(commands)
}

/// Tolerate prose and markdown fences around the JSON body
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HospitalId;
    use crate::world::agents::AgentKind;
    use crate::world::metrics::Metrics;
    use crate::world::sensing::{AgentView, HospitalView};

    fn snapshot() -> Snapshot {
        Snapshot {
            tick: 1,
            width: 5,
            height: 5,
            depot: GridPos::new(0, 0),
            agents: vec![
                AgentView {
                    id: AgentId(0),
                    kind: AgentKind::Truck,
                    pos: GridPos::new(0, 0),
                    fuel: 100.0,
                    water: 100.0,
                    battery: 100.0,
                    carrying: None,
                },
                AgentView {
                    id: AgentId(1),
                    kind: AgentKind::Medic,
                    pos: GridPos::new(1, 1),
                    fuel: 100.0,
                    water: 100.0,
                    battery: 100.0,
                    carrying: None,
                },
            ],
            survivors: vec![],
            fires: vec![],
            rubble: vec![],
            hospitals: vec![HospitalView {
                id: HospitalId(0),
                pos: GridPos::new(4, 4),
                capacity: 1,
                occupancy: 0,
                queue_len: 0,
            }],
            metrics: Metrics::default(),
        }
    }

    #[test]
    fn parses_well_formed_reply() {
        let text = r#"Here is the plan:
        ```json
        {"commands": [
            {"agent_id": 0, "action": "move_to", "target": [2, 3]},
            {"agent_id": 1, "action": "idle"}
        ]}
        ```"#;
        let commands = parse_commands(text, &snapshot()).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0].action,
            Action::MoveTo {
                target: GridPos::new(2, 3)
            }
        );
        assert_eq!(commands[1].action, Action::Idle);
    }

    #[test]
    fn fills_idle_for_missing_agents() {
        let text = r#"{"commands": [{"agent_id": 0, "action": "extinguish"}]}"#;
        let commands = parse_commands(text, &snapshot()).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].agent, AgentId(1));
        assert_eq!(commands[1].action, Action::Idle);
    }

    #[test]
    fn rejects_mock_sentinel() {
        let text = r#"{"commands": "USE_FALLBACK_HEURISTIC"}"#;
        assert!(matches!(
            parse_commands(text, &snapshot()),
            Err(CrisisError::MalformedPlannerOutput(_))
        ));
    }

    #[test]
    fn rejects_unknown_agent() {
        let text = r#"{"commands": [{"agent_id": 9, "action": "idle"}]}"#;
        assert!(parse_commands(text, &snapshot()).is_err());
    }

    #[test]
    fn rejects_move_without_target() {
        let text = r#"{"commands": [{"agent_id": 0, "action": "move_to"}]}"#;
        assert!(parse_commands(text, &snapshot()).is_err());
    }

    #[test]
    fn rejects_prose_only_reply() {
        assert!(parse_commands("I cannot help with that.", &snapshot()).is_err());
    }

    #[test]
    fn mock_provider_falls_back_to_react() {
        let config = SimulationConfig::default();
        let mut strategy = ExternalStrategy::new(ProviderClient::Mock, &config).unwrap();
        let plan = strategy.plan(&snapshot());
        assert_eq!(plan.invalid_json, 1);
        // fallback still commands every agent
        assert_eq!(plan.commands.len(), 2);
    }
}
