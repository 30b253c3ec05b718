//! Reflexion strategy integration: failed targets are remembered and
//! routed around instead of retried every tick.

use crisis_sim::core::config::SimulationConfig;
use crisis_sim::episode::run_episode;
use crisis_sim::planner::{ReflexionStrategy, Strategy};
use crisis_sim::scenario::{HospitalSpec, RosterSpec, Scenario};
use crisis_sim::world::World;

/// Survivor at (2,0) is fully walled in; survivor at (0,3) is open.
fn walled_scenario() -> Scenario {
    Scenario {
        width: 6,
        height: 6,
        depot: (0, 0),
        hospitals: vec![HospitalSpec {
            pos: (5, 5),
            capacity: 2,
        }],
        initial_fires: vec![],
        rubble: vec![],
        blocked: vec![(1, 0), (3, 0), (2, 1)],
        survivors: 0,
        survivor_positions: vec![(2, 0), (0, 3)],
        roster: RosterSpec {
            trucks: 0,
            medics: 1,
            drones: 0,
        },
    }
}

#[test]
fn test_unreachable_target_is_avoided() {
    let scenario = walled_scenario();
    let config = SimulationConfig::default();
    let mut strategy = ReflexionStrategy::new(&config);

    let report = run_episode(&scenario, &mut strategy, &config, 5, 150)
        .expect("episode should run");

    // The open survivor is rescued; the walled one cannot be reached.
    assert_eq!(report.metrics.rescued, 1);
    assert_eq!(report.metrics.deaths, 1);
    // First attempt on the walled cell fails and is remembered.
    assert!(report.metrics.command_failures >= 1);
    assert!(report.metrics.replans >= 1);
}

#[test]
fn test_avoidance_changes_next_plan() {
    let scenario = walled_scenario();
    let config = SimulationConfig::default();
    let mut world = World::from_scenario(&scenario, config.clone(), 5).expect("world");
    let mut strategy = ReflexionStrategy::new(&config);

    // Tick 1: the medic targets the nearer, walled survivor and fails.
    world.advance().expect("advance");
    let plan = strategy.plan(&world.sense());
    let outcome = world.apply_plan(plan).expect("apply");
    strategy.reflect(&outcome);
    assert!(!outcome.rejections.is_empty());

    // Tick 2: the failed cell is skipped and the plan counts a replan.
    world.advance().expect("advance");
    let plan = strategy.plan(&world.sense());
    assert!(plan.replans >= 1);
}
