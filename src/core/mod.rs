pub mod config;
pub mod error;
pub mod types;

pub use config::{ScoreWeights, SimulationConfig};
pub use error::{CrisisError, Result};
