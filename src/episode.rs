//! Episode runner - one seeded world, one strategy, one metrics record
//!
//! Episodes are fully independent units of work: each owns its RNG stream
//! and world instance, so batch evaluation can run many in parallel with
//! no shared state.

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::planner::Strategy;
use crate::scenario::Scenario;
use crate::world::{Metrics, World};

/// One record per episode, consumed by the evaluation harness
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub strategy: &'static str,
    pub seed: u64,
    pub ticks_run: u64,
    pub metrics: Metrics,
    pub avg_rescue_time: f64,
    pub score: f64,
}

/// Run a full episode: tick until the budget runs out or, when configured,
/// until every survivor is terminal and every fire is out.
pub fn run_episode(
    scenario: &Scenario,
    strategy: &mut dyn Strategy,
    config: &SimulationConfig,
    seed: u64,
    tick_budget: u64,
) -> Result<EpisodeReport> {
    let mut world = World::from_scenario(scenario, config.clone(), seed)?;
    tracing::info!(
        strategy = strategy.name(),
        seed,
        tick_budget,
        survivors = world.metrics().total_survivors,
        "episode start"
    );

    let mut ticks_run = 0;
    for _ in 0..tick_budget {
        world.advance()?;
        let snapshot = world.sense();
        let plan = strategy.plan(&snapshot);
        let outcome = world.apply_plan(plan)?;
        strategy.reflect(&outcome);
        ticks_run = world.tick();

        if config.stop_when_settled && world.is_settled() {
            tracing::debug!(tick = ticks_run, "episode settled early");
            break;
        }
    }

    let metrics = world.metrics().clone();
    let report = EpisodeReport {
        strategy: strategy.name(),
        seed,
        ticks_run,
        avg_rescue_time: metrics.avg_rescue_time(),
        score: metrics.score(&config.score),
        metrics,
    };
    tracing::info!(
        rescued = report.metrics.rescued,
        deaths = report.metrics.deaths,
        score = report.score,
        ticks = report.ticks_run,
        "episode complete"
    );
    Ok(report)
}
