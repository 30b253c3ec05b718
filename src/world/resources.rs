//! Resource ledger - per-agent consumable accounting
//!
//! Every executed command pays a cost here before it takes effect. A
//! charge that would go negative is rejected and leaves the balance
//! untouched; the world turns that into a command rejection, never a
//! silent clamp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{CrisisError, Result};
use crate::core::types::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Fuel,
    Water,
    Battery,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Fuel => "fuel",
            ResourceKind::Water => "water",
            ResourceKind::Battery => "battery",
        }
    }
}

/// One agent's consumable levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tank {
    pub fuel: f32,
    pub water: f32,
    pub battery: f32,
}

impl Tank {
    fn full(config: &SimulationConfig) -> Self {
        Self {
            fuel: config.tank_fuel,
            water: config.tank_water,
            battery: config.tank_battery,
        }
    }

    fn level(&self, kind: ResourceKind) -> f32 {
        match kind {
            ResourceKind::Fuel => self.fuel,
            ResourceKind::Water => self.water,
            ResourceKind::Battery => self.battery,
        }
    }

    fn level_mut(&mut self, kind: ResourceKind) -> &mut f32 {
        match kind {
            ResourceKind::Fuel => &mut self.fuel,
            ResourceKind::Water => &mut self.water,
            ResourceKind::Battery => &mut self.battery,
        }
    }
}

/// Ledger over all agents. Deterministic iteration (BTreeMap).
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    tanks: BTreeMap<AgentId, Tank>,
}

impl ResourceLedger {
    pub fn register(&mut self, agent: AgentId, config: &SimulationConfig) {
        self.tanks.insert(agent, Tank::full(config));
    }

    pub fn tank(&self, agent: AgentId) -> Option<&Tank> {
        self.tanks.get(&agent)
    }

    pub fn level(&self, agent: AgentId, kind: ResourceKind) -> f32 {
        self.tanks.get(&agent).map(|t| t.level(kind)).unwrap_or(0.0)
    }

    /// Deduct `amount` of `kind`, failing without side effects when the
    /// balance would go negative.
    pub fn charge(&mut self, agent: AgentId, kind: ResourceKind, amount: f32) -> Result<()> {
        let tank = self
            .tanks
            .get_mut(&agent)
            .ok_or_else(|| CrisisError::InvalidTarget(format!("unknown agent {:?}", agent)))?;
        let level = tank.level_mut(kind);
        if *level < amount {
            return Err(CrisisError::InsufficientResource(
                agent,
                kind.as_str(),
                amount,
                *level,
            ));
        }
        *level -= amount;
        Ok(())
    }

    /// Refill everything; applied when an agent ends its tick on the depot.
    pub fn replenish(&mut self, agent: AgentId, config: &SimulationConfig) {
        if let Some(tank) = self.tanks.get_mut(&agent) {
            *tank = Tank::full(config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> (ResourceLedger, SimulationConfig) {
        let config = SimulationConfig::default();
        let mut ledger = ResourceLedger::default();
        ledger.register(AgentId(0), &config);
        (ledger, config)
    }

    #[test]
    fn charge_and_replenish() {
        let (mut ledger, config) = ledger();
        ledger.charge(AgentId(0), ResourceKind::Water, 30.0).unwrap();
        assert_eq!(ledger.level(AgentId(0), ResourceKind::Water), 70.0);
        ledger.replenish(AgentId(0), &config);
        assert_eq!(ledger.level(AgentId(0), ResourceKind::Water), config.tank_water);
    }

    #[test]
    fn rejected_charge_leaves_balance_unchanged() {
        let (mut ledger, _config) = ledger();
        let before = ledger.level(AgentId(0), ResourceKind::Fuel);
        let err = ledger.charge(AgentId(0), ResourceKind::Fuel, before + 1.0);
        assert!(matches!(err, Err(CrisisError::InsufficientResource(..))));
        assert_eq!(ledger.level(AgentId(0), ResourceKind::Fuel), before);
    }

    #[test]
    fn unknown_agent_is_invalid_target() {
        let (mut ledger, _config) = ledger();
        let err = ledger.charge(AgentId(99), ResourceKind::Fuel, 1.0);
        assert!(matches!(err, Err(CrisisError::InvalidTarget(_))));
    }
}
