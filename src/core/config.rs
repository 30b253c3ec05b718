//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the simulation systems
///
/// Changing these values changes episode pacing and the balance between
/// fire pressure and triage pressure.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // === FIRE DYNAMICS ===
    /// Probability per tick that a burning cell ignites each passable
    /// Moore neighbour.
    ///
    /// At the default (0.02), a lone fire grows slowly enough for a single
    /// truck to contain it; clusters of fires outpace one truck.
    pub fire_spread_chance: f64,

    /// Probability per tick that an already-burning cell intensifies by one.
    pub fire_growth_chance: f64,

    /// Upper bound on cell fire intensity.
    ///
    /// Intensity also scales the water needed to fully extinguish a cell.
    pub max_fire_intensity: u8,

    /// Intensity removed by one truck extinguish action.
    pub extinguish_power: u8,

    // === SURVIVOR HEALTH ===
    /// Health lost per tick by every non-terminal, non-rescued survivor.
    ///
    /// At 1.0 against 100 starting health, an unattended survivor survives
    /// 100 ticks on safe ground.
    pub health_decay_rate: f32,

    /// Extra health lost per tick when on or orthogonally adjacent to fire.
    pub fire_proximity_penalty: f32,

    /// Starting health for survivors placed by count rather than explicitly.
    pub survivor_initial_health: f32,

    // === MOVEMENT COSTS ===
    /// Pathfinding cost added for stepping onto a rubble cell.
    pub rubble_step_penalty: f32,

    /// Pathfinding cost added for stepping onto a fire-adjacent cell.
    pub fire_adjacent_step_penalty: f32,

    // === RESOURCE COSTS ===
    /// Fuel (truck/medic) or battery (drone) charged per movement step.
    pub move_cost: f32,

    /// Water charged per extinguish action.
    pub extinguish_cost: f32,

    /// Fuel charged per rubble-clearing action.
    pub clear_rubble_cost: f32,

    /// Full tank levels restored at the depot.
    pub tank_fuel: f32,
    pub tank_water: f32,
    pub tank_battery: f32,

    // === HOSPITAL ===
    /// Probability per tick that a hospital discharges one occupant,
    /// freeing a bed for queue promotion.
    pub hospital_service_rate: f64,

    // === PLANNING ===
    /// Ticks a reflexion critique stays active before the target may be
    /// retried.
    pub reflexion_window: u64,

    /// Lookahead depth (ticks) for the receding-horizon strategy.
    pub lookahead_depth: u32,

    /// Candidate targets per agent considered by the lookahead strategy.
    pub lookahead_candidates: usize,

    /// Wall-clock bound on one external planner query (milliseconds).
    pub planner_timeout_ms: u64,

    // === EPISODE ===
    /// When true the episode stops as soon as every survivor is terminal
    /// and every fire is out; otherwise it always runs the full budget.
    pub stop_when_settled: bool,

    /// Weights for the episode score.
    pub score: ScoreWeights,
}

/// Weighted episode score: the evaluation harness ranks strategies by
/// `score()` over batches of seeds.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub rescued: f64,
    pub deaths: f64,
    pub fires_extinguished: f64,
    pub roads_cleared: f64,
    pub energy_used: f64,
    pub hospital_overflow_events: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rescued: 3.0,
            deaths: -2.0,
            fires_extinguished: 1.0,
            roads_cleared: 0.5,
            energy_used: -0.1,
            hospital_overflow_events: -0.05,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fire_spread_chance: 0.02,
            fire_growth_chance: 0.05,
            max_fire_intensity: 3,
            extinguish_power: 2,
            health_decay_rate: 1.0,
            fire_proximity_penalty: 2.0,
            survivor_initial_health: 100.0,
            rubble_step_penalty: 3.0,
            fire_adjacent_step_penalty: 2.0,
            move_cost: 1.0,
            extinguish_cost: 10.0,
            clear_rubble_cost: 5.0,
            tank_fuel: 100.0,
            tank_water: 100.0,
            tank_battery: 100.0,
            hospital_service_rate: 0.3,
            reflexion_window: 5,
            lookahead_depth: 3,
            lookahead_candidates: 3,
            planner_timeout_ms: 10_000,
            stop_when_settled: true,
            score: ScoreWeights::default(),
        }
    }
}
