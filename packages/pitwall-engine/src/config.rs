//! config.rs — Simulation tuning knobs and per-event race parameters

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Monte-Carlo tuning for one evaluation call. One instance per scenario;
/// disruption scenarios derive a scaled/shifted copy from the base config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_simulations: u32,
    pub pit_loss_seconds: f64,
    pub safety_car_probability: f64,
    pub weather_uncertainty_seconds: f64,
    pub traffic_uncertainty_seconds: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_simulations: 3000,
            pit_loss_seconds: 21.5,
            safety_car_probability: 0.18,
            weather_uncertainty_seconds: 0.35,
            traffic_uncertainty_seconds: 0.4,
        }
    }
}

/// Environmental inputs for one event, supplied by the data collaborators
/// (pace model prediction, session degradation slopes, CV/weather indices).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceParameters {
    /// Predicted clean-air lap time, seconds.
    pub base_lap_time: f64,
    /// Compound name → seconds of lap-time loss per lap of tire age.
    pub degradation: HashMap<String, f64>,
    pub fuel_load_proxy: f64,
    pub traffic_index: f64,
    pub rain_index: f64,
}

impl RaceParameters {
    pub fn degradation_for(&self, compound: &str) -> f64 {
        self.degradation.get(compound).copied().unwrap_or(0.1)
    }
}
