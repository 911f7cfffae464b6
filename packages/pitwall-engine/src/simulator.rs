//! simulator.rs — Stochastic lap-by-lap race simulation
//!
//! Prices one strategy under one set of environmental parameters:
//! lap time = base + fuel burn-off + linear tire wear + traffic + weather
//! + combined uncertainty noise, with pit loss (safety-car discounted)
//! added on pit laps. One trial returns one total race time; the points
//! conversion synthesizes a nine-car rival field around the team's time.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::candidates::StrategyCandidate;
use crate::config::{RaceParameters, SimulationConfig};

/// Top-10 points table; positions beyond 10th score zero.
pub const POINTS_TABLE: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

/// A trial counts as a win when it reaches the top points value.
pub const WIN_POINTS: f64 = 25.0;

/// Typical field spread: rival finish-time offsets from the team, seconds.
const RIVAL_OFFSETS: [f64; 9] = [0.0, 4.0, 8.2, 12.0, 15.5, 19.8, 23.5, 27.0, 31.2];

/// Physical floor on a single lap's contribution, seconds.
const MIN_LAP_SECONDS: f64 = 40.0;

/// Noise distributions shared across all trials of one evaluation call.
/// Construction clamps the standard deviations at zero so degenerate
/// configs degrade to noiseless draws instead of failing.
pub(crate) struct LapNoise {
    traffic: Normal<f64>,
    weather: Normal<f64>,
    uncertainty: Normal<f64>,
    rival: Normal<f64>,
}

impl LapNoise {
    pub(crate) fn new(cfg: &SimulationConfig) -> Self {
        let sigma = (cfg.weather_uncertainty_seconds + cfg.traffic_uncertainty_seconds).max(0.0);
        Self {
            traffic: Normal::new(0.1, 0.08).unwrap(),
            weather: Normal::new(0.25, 0.12).unwrap(),
            uncertainty: Normal::new(0.0, sigma).unwrap(),
            rival: Normal::new(0.0, 2.8).unwrap(),
        }
    }
}

/// Active compound for a lap, from the strategy's stint boundaries.
/// Past the final pit lap the last compound stays on for the rest of the
/// race; a zero-stop plan runs its only compound throughout.
pub(crate) fn compound_for_lap(strategy: &StrategyCandidate, lap: u32) -> &str {
    let crossed = strategy.pit_laps.iter().filter(|&&pit| lap > pit).count();
    let idx = crossed.min(strategy.compounds.len() - 1);
    &strategy.compounds[idx]
}

/// Simulate one full race for one strategy; returns total race time in
/// seconds. Consumes the shared generator stream in lap order.
pub(crate) fn simulate_single_race(
    strategy: &StrategyCandidate,
    total_laps: u32,
    params: &RaceParameters,
    cfg: &SimulationConfig,
    noise: &LapNoise,
    rng: &mut impl Rng,
) -> f64 {
    let mut race_time = 0.0;
    let mut stint_age = 0u32;

    let fuel_effect =
        (params.fuel_load_proxy / (total_laps as f64 * 0.06).max(1.0)).clamp(0.05, 0.3);

    for lap in 1..=total_laps {
        if strategy.pit_laps.contains(&lap) {
            let mut pit_loss = cfg.pit_loss_seconds;
            // A safety car during the stop cheapens the pit loss
            if rng.gen::<f64>() < cfg.safety_car_probability {
                pit_loss *= rng.gen_range(0.55..0.75);
            }
            race_time += pit_loss;
            stint_age = 0;
        }

        let compound = compound_for_lap(strategy, lap);
        let deg = params.degradation_for(compound);

        let fuel_term = -fuel_effect * (lap as f64 / total_laps as f64) * 5.0;
        let tire_term = deg * stint_age as f64;
        let traffic_term = params.traffic_index * noise.traffic.sample(rng);
        let weather_term = params.rain_index * noise.weather.sample(rng);
        let noise_term = noise.uncertainty.sample(rng);

        let lap_time =
            params.base_lap_time + fuel_term + tire_term + traffic_term + weather_term + noise_term;
        race_time += lap_time.max(MIN_LAP_SECONDS);
        stint_age += 1;
    }

    race_time
}

/// Convert one trial's race time to championship points by synthesizing a
/// rival field around it at the fixed offsets plus finish-time noise.
pub(crate) fn simulated_points(team_race_time: f64, noise: &LapNoise, rng: &mut impl Rng) -> f64 {
    let beaten_by = RIVAL_OFFSETS
        .iter()
        .filter(|&&offset| team_race_time + offset + noise.rival.sample(rng) < team_race_time)
        .count();
    let position = 1 + beaten_by;
    POINTS_TABLE.get(position - 1).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn params() -> RaceParameters {
        RaceParameters {
            base_lap_time: 90.5,
            degradation: HashMap::from([
                ("SOFT".to_string(), 0.18),
                ("MEDIUM".to_string(), 0.12),
                ("HARD".to_string(), 0.08),
            ]),
            fuel_load_proxy: 0.9,
            traffic_index: 0.5,
            rain_index: 0.1,
        }
    }

    fn one_stop() -> StrategyCandidate {
        StrategyCandidate {
            name: "ONE_STOP_SOFT_HARD_L29".to_string(),
            compounds: vec!["SOFT".to_string(), "HARD".to_string()],
            pit_laps: vec![29],
        }
    }

    #[test]
    fn stint_lookup_handles_every_lap_of_a_zero_stop_plan() {
        let full_race = StrategyCandidate {
            name: "FULL_MEDIUM".to_string(),
            compounds: vec!["MEDIUM".to_string()],
            pit_laps: vec![],
        };
        for lap in 1..=58 {
            assert_eq!(compound_for_lap(&full_race, lap), "MEDIUM");
        }
    }

    #[test]
    fn stint_lookup_switches_after_the_pit_lap() {
        let s = one_stop();
        assert_eq!(compound_for_lap(&s, 1), "SOFT");
        assert_eq!(compound_for_lap(&s, 29), "SOFT");
        assert_eq!(compound_for_lap(&s, 30), "HARD");
        assert_eq!(compound_for_lap(&s, 58), "HARD");
    }

    #[test]
    fn race_time_respects_the_lap_floor() {
        let cfg = SimulationConfig::default();
        let noise = LapNoise::new(&cfg);
        let mut rng = StdRng::seed_from_u64(7);
        let t = simulate_single_race(&one_stop(), 58, &params(), &cfg, &noise, &mut rng);
        assert!(t >= 58.0 * 40.0);
        assert!(t.is_finite());
    }

    #[test]
    fn points_come_from_the_top10_table() {
        let cfg = SimulationConfig::default();
        let noise = LapNoise::new(&cfg);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let pts = simulated_points(5300.0, &noise, &mut rng);
            assert!(POINTS_TABLE.contains(&pts) || pts == 0.0);
        }
    }
}
