//! Crisis Sim - Disaster-Response Grid Simulation

pub mod core;
pub mod episode;
pub mod grid;
pub mod llm;
pub mod planner;
pub mod scenario;
pub mod world;
