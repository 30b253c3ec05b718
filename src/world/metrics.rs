//! Episode metrics
//!
//! Owned by the world, written exactly once per event, read-only
//! everywhere else. The evaluation harness consumes one serialized record
//! per episode.

use serde::Serialize;

use crate::core::config::ScoreWeights;
use crate::core::types::Tick;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub rescued: u32,
    pub deaths: u32,
    pub fires_extinguished: u32,
    pub roads_cleared: u32,
    pub energy_used: f64,
    /// Commands submitted by planners
    pub tool_calls: u32,
    /// Commands rejected during validation
    pub command_failures: u32,
    /// Malformed or timed-out external planner responses
    pub invalid_json: u32,
    /// Reflexion adjustments away from previously failed targets
    pub replans: u32,
    pub hospital_overflow_events: u32,
    pub total_survivors: u32,
    /// Sum of (admission tick - pickup tick) over rescued survivors
    pub rescue_time_total: u64,
}

impl Metrics {
    pub fn record_rescue(&mut self, pickup: Tick, admission: Tick) {
        debug_assert!(pickup <= admission, "pickup after admission");
        self.rescued += 1;
        self.rescue_time_total += admission - pickup;
    }

    pub fn avg_rescue_time(&self) -> f64 {
        if self.rescued == 0 {
            0.0
        } else {
            self.rescue_time_total as f64 / self.rescued as f64
        }
    }

    /// Weighted episode score used to rank strategies
    pub fn score(&self, weights: &ScoreWeights) -> f64 {
        weights.rescued * self.rescued as f64
            + weights.deaths * self.deaths as f64
            + weights.fires_extinguished * self.fires_extinguished as f64
            + weights.roads_cleared * self.roads_cleared as f64
            + weights.energy_used * self.energy_used
            + weights.hospital_overflow_events * self.hospital_overflow_events as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_weighting() {
        let metrics = Metrics {
            rescued: 4,
            deaths: 1,
            fires_extinguished: 2,
            roads_cleared: 2,
            energy_used: 10.0,
            hospital_overflow_events: 2,
            ..Default::default()
        };
        let score = metrics.score(&ScoreWeights::default());
        // 12 - 2 + 2 + 1 - 1 - 0.1
        assert!((score - 11.9).abs() < 1e-9);
    }

    #[test]
    fn avg_rescue_time() {
        let mut metrics = Metrics::default();
        assert_eq!(metrics.avg_rescue_time(), 0.0);
        metrics.record_rescue(2, 6);
        metrics.record_rescue(3, 5);
        assert_eq!(metrics.avg_rescue_time(), 3.0);
    }
}
