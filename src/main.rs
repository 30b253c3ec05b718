//! Crisis Sim - Entry Point
//!
//! Runs a single disaster-response episode on a TOML scenario and prints
//! the final metrics record as JSON.

use clap::Parser;

use crisis_sim::core::config::SimulationConfig;
use crisis_sim::core::error::Result;
use crisis_sim::episode::run_episode;
use crisis_sim::llm::ProviderClient;
use crisis_sim::planner::{build_strategy, StrategyKind};
use crisis_sim::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "crisis-sim", about = "Disaster-response grid simulation")]
struct Args {
    /// Path to a TOML scenario file
    #[arg(long)]
    scenario: String,

    /// Planner strategy: react, react_reflexion, plan_execute, llm
    #[arg(long, default_value = "react")]
    strategy: StrategyKind,

    /// Backend for the llm strategy: mock, anthropic, openai
    #[arg(long, default_value = "mock")]
    provider: String,

    /// RNG seed for fire spread, hospital service, and survivor placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum number of ticks before the episode is cut off
    #[arg(long, default_value_t = 200)]
    ticks: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crisis_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let config = SimulationConfig::default();
    let client = ProviderClient::from_name(&args.provider)?;
    let mut strategy = build_strategy(args.strategy, client, &config)?;

    let report = run_episode(&scenario, strategy.as_mut(), &config, args.seed, args.ticks)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
