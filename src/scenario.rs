//! Scenario description and loader
//!
//! A scenario fixes the disaster layout: grid dimensions, fires, rubble,
//! hospitals, depot, and the responder roster. Scenarios are TOML on disk;
//! the interactive front end and its YAML maps are external to this crate.
//!
//! Structural problems (out-of-bounds placement, zero-capacity hospital,
//! no hospital at all) are fatal: they return `InvalidScenario` before an
//! episode starts.

use serde::Deserialize;
use std::path::Path;

use crate::core::error::{CrisisError, Result};
use crate::core::types::GridPos;

/// Hospital placement and capacity
#[derive(Debug, Clone, Deserialize)]
pub struct HospitalSpec {
    pub pos: (i32, i32),
    pub capacity: u32,
}

/// Responder roster; defaults to one of each kind at the depot
#[derive(Debug, Clone, Deserialize)]
pub struct RosterSpec {
    #[serde(default = "one")]
    pub trucks: u32,
    #[serde(default = "one")]
    pub medics: u32,
    #[serde(default = "one")]
    pub drones: u32,
}

fn one() -> u32 {
    1
}

impl Default for RosterSpec {
    fn default() -> Self {
        Self {
            trucks: 1,
            medics: 1,
            drones: 1,
        }
    }
}

/// Complete episode scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub width: i32,
    pub height: i32,
    /// Depot cell; responders spawn here and replenish here
    pub depot: (i32, i32),
    pub hospitals: Vec<HospitalSpec>,
    #[serde(default)]
    pub initial_fires: Vec<(i32, i32)>,
    #[serde(default)]
    pub rubble: Vec<(i32, i32)>,
    #[serde(default)]
    pub blocked: Vec<(i32, i32)>,
    /// Survivors placed at seeded-random free cells
    #[serde(default)]
    pub survivors: u32,
    /// Survivors at fixed positions, in addition to the random ones
    #[serde(default)]
    pub survivor_positions: Vec<(i32, i32)>,
    #[serde(default)]
    pub roster: RosterSpec,
}

impl Scenario {
    /// Load and validate a scenario from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = toml::from_str(&content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(CrisisError::InvalidScenario(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.hospitals.is_empty() {
            return Err(CrisisError::InvalidScenario(
                "at least one hospital is required".into(),
            ));
        }
        for h in &self.hospitals {
            if h.capacity == 0 {
                return Err(CrisisError::InvalidScenario(format!(
                    "hospital at {:?} has zero capacity",
                    h.pos
                )));
            }
            self.check_bounds(h.pos, "hospital")?;
        }
        self.check_bounds(self.depot, "depot")?;
        for &pos in &self.initial_fires {
            self.check_bounds(pos, "fire")?;
        }
        for &pos in &self.rubble {
            self.check_bounds(pos, "rubble")?;
        }
        for &pos in &self.blocked {
            self.check_bounds(pos, "blocked cell")?;
        }
        for &pos in &self.survivor_positions {
            self.check_bounds(pos, "survivor")?;
        }
        Ok(())
    }

    fn check_bounds(&self, pos: (i32, i32), what: &str) -> Result<()> {
        let (x, y) = pos;
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Err(CrisisError::InvalidScenario(format!(
                "{} at ({},{}) is outside the {}x{} grid",
                what, x, y, self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn depot_pos(&self) -> GridPos {
        GridPos::new(self.depot.0, self.depot.1)
    }
}
