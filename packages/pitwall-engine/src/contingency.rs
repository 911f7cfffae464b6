//! contingency.rs — Disruption scenarios and multi-scenario re-simulation
//!
//! A fixed catalog of five race-day scenarios: baseline plus four named
//! disruptions, each a bundle of deltas applied to the base lap time,
//! degradation, environmental indices and simulation config. Every
//! scenario re-runs the evaluator and the per-scenario tables are merged
//! into one wide row per strategy.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::candidates::StrategyCandidate;
use crate::config::{RaceParameters, SimulationConfig};
use crate::evaluator::{evaluate_strategies, EvaluationRow};

pub const SCENARIO_COUNT: usize = 5;

/// Disruption scenarios are stride-offset from the base seed so each
/// scenario consumes an independent deterministic stream.
const SCENARIO_SEED_STRIDE: u64 = 97;

/// Minimum trial count for a disruption scenario's coarse estimate.
const MIN_SCENARIO_TRIALS: u32 = 80;

/// The closed scenario catalog. Scenario semantics are part of the domain
/// model, so this is an enum rather than an extensible registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Baseline,
    WeatherChange,
    EngineConservation,
    DriverErrorRecovery,
    RaceChaos,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; SCENARIO_COUNT] = [
        ScenarioKind::Baseline,
        ScenarioKind::WeatherChange,
        ScenarioKind::EngineConservation,
        ScenarioKind::DriverErrorRecovery,
        ScenarioKind::RaceChaos,
    ];

    pub const DISRUPTIONS: [ScenarioKind; 4] = [
        ScenarioKind::WeatherChange,
        ScenarioKind::EngineConservation,
        ScenarioKind::DriverErrorRecovery,
        ScenarioKind::RaceChaos,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScenarioKind::Baseline => "baseline",
            ScenarioKind::WeatherChange => "weather_change",
            ScenarioKind::EngineConservation => "engine_conservation",
            ScenarioKind::DriverErrorRecovery => "driver_error_recovery",
            ScenarioKind::RaceChaos => "race_chaos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::Baseline => "Baseline",
            ScenarioKind::WeatherChange => "Weather Change",
            ScenarioKind::EngineConservation => "Engine Concern",
            ScenarioKind::DriverErrorRecovery => "Driver Error Recovery",
            ScenarioKind::RaceChaos => "Race Chaos",
        }
    }

    /// Pit-wall wording for "switch to the fallback because of this".
    /// The baseline carries no trigger.
    pub fn trigger_reason(self) -> Option<&'static str> {
        match self {
            ScenarioKind::Baseline => None,
            ScenarioKind::WeatherChange => Some("Weather change or sudden rain"),
            ScenarioKind::EngineConservation => Some("Engine reliability concern"),
            ScenarioKind::DriverErrorRecovery => Some("Driver error recovery"),
            ScenarioKind::RaceChaos => Some("Safety car or race chaos"),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn deltas(self) -> ScenarioDeltas {
        match self {
            ScenarioKind::Baseline => ScenarioDeltas::default(),
            ScenarioKind::WeatherChange => ScenarioDeltas {
                deg_multiplier: 1.15,
                traffic_delta: 0.1,
                rain_delta: 0.35,
                weather_uncertainty_scale: 1.35,
                ..ScenarioDeltas::default()
            },
            ScenarioKind::EngineConservation => ScenarioDeltas {
                base_lap_delta: 0.45,
                fuel_delta: 0.12,
                pit_loss_delta: 1.1,
                safety_car_delta: 0.04,
                ..ScenarioDeltas::default()
            },
            ScenarioKind::DriverErrorRecovery => ScenarioDeltas {
                base_lap_delta: 0.22,
                traffic_delta: 0.24,
                safety_car_delta: 0.06,
                traffic_uncertainty_scale: 1.3,
                ..ScenarioDeltas::default()
            },
            ScenarioKind::RaceChaos => ScenarioDeltas {
                traffic_delta: 0.18,
                rain_delta: 0.14,
                safety_car_delta: 0.16,
                weather_uncertainty_scale: 1.2,
                traffic_uncertainty_scale: 1.25,
                ..ScenarioDeltas::default()
            },
        }
    }
}

/// Additive/multiplicative perturbations one scenario applies to the
/// baseline parameters.
#[derive(Debug, Clone, Copy)]
struct ScenarioDeltas {
    base_lap_delta: f64,
    deg_multiplier: f64,
    fuel_delta: f64,
    traffic_delta: f64,
    rain_delta: f64,
    pit_loss_delta: f64,
    safety_car_delta: f64,
    weather_uncertainty_scale: f64,
    traffic_uncertainty_scale: f64,
}

impl Default for ScenarioDeltas {
    fn default() -> Self {
        Self {
            base_lap_delta: 0.0,
            deg_multiplier: 1.0,
            fuel_delta: 0.0,
            traffic_delta: 0.0,
            rain_delta: 0.0,
            pit_loss_delta: 0.0,
            safety_car_delta: 0.0,
            weather_uncertainty_scale: 1.0,
            traffic_uncertainty_scale: 1.0,
        }
    }
}

/// The slice of an evaluation row a scenario contributes to the wide table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioStats {
    pub expected_race_time: f64,
    pub win_probability: f64,
    pub strategy_score: f64,
    pub robustness_window: f64,
}

impl From<&EvaluationRow> for ScenarioStats {
    fn from(row: &EvaluationRow) -> Self {
        Self {
            expected_race_time: row.expected_race_time,
            win_probability: row.win_probability,
            strategy_score: row.strategy_score,
            robustness_window: row.robustness_window,
        }
    }
}

/// One strategy's baseline plus per-disruption statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyRow {
    pub strategy: String,
    pub stops: usize,
    pub compounds: Vec<String>,
    pub pit_laps: Vec<u32>,
    #[serde(serialize_with = "serialize_scenarios")]
    pub scenarios: [ScenarioStats; SCENARIO_COUNT],
    pub top3_scenario_hits: u32,
}

impl ContingencyRow {
    pub fn stats(&self, kind: ScenarioKind) -> &ScenarioStats {
        &self.scenarios[kind.index()]
    }

    pub fn baseline(&self) -> &ScenarioStats {
        self.stats(ScenarioKind::Baseline)
    }

    /// The disruption scenario this strategy holds up best under.
    pub fn best_disruption(&self) -> ScenarioKind {
        let mut best = ScenarioKind::DISRUPTIONS[0];
        for kind in ScenarioKind::DISRUPTIONS {
            if self.stats(kind).strategy_score > self.stats(best).strategy_score {
                best = kind;
            }
        }
        best
    }
}

fn serialize_scenarios<S: Serializer>(
    scenarios: &[ScenarioStats; SCENARIO_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(SCENARIO_COUNT))?;
    for kind in ScenarioKind::ALL {
        map.serialize_entry(kind.key(), &scenarios[kind.index()])?;
    }
    map.end()
}

/// Scenario-adjusted copies of the environmental parameters and config.
/// Degradation, indices and pit loss are floored at physical minimums; the
/// safety-car probability stays within [0, 0.95].
fn scenario_inputs(
    params: &RaceParameters,
    cfg: &SimulationConfig,
    kind: ScenarioKind,
    n_simulations: u32,
) -> (RaceParameters, SimulationConfig) {
    let d = kind.deltas();

    let degradation: HashMap<String, f64> = params
        .degradation
        .iter()
        .map(|(k, &v)| (k.clone(), (v * d.deg_multiplier).max(0.0)))
        .collect();

    let scenario_params = RaceParameters {
        base_lap_time: params.base_lap_time + d.base_lap_delta,
        degradation,
        fuel_load_proxy: (params.fuel_load_proxy + d.fuel_delta).max(0.0),
        traffic_index: (params.traffic_index + d.traffic_delta).max(0.0),
        rain_index: (params.rain_index + d.rain_delta).max(0.0),
    };

    let scenario_cfg = SimulationConfig {
        n_simulations,
        pit_loss_seconds: (cfg.pit_loss_seconds + d.pit_loss_delta).max(5.0),
        safety_car_probability: (cfg.safety_car_probability + d.safety_car_delta)
            .clamp(0.0, 0.95),
        weather_uncertainty_seconds: (cfg.weather_uncertainty_seconds
            * d.weather_uncertainty_scale)
            .max(0.01),
        traffic_uncertainty_seconds: (cfg.traffic_uncertainty_seconds
            * d.traffic_uncertainty_scale)
            .max(0.01),
    };

    (scenario_params, scenario_cfg)
}

/// Re-run the evaluator once per scenario and merge the per-scenario
/// tables into one wide row per strategy (hash intersection on the
/// strategy name, which encodes the full identity).
///
/// Disruption scenarios only need a coarse estimate, so they run at 20% of
/// the baseline trial count, floored at 80 and capped at the baseline
/// count. An empty merge is returned as-is and logged; selection treats it
/// as a hard failure downstream.
pub fn evaluate_with_contingencies(
    candidates: &[StrategyCandidate],
    total_laps: u32,
    params: &RaceParameters,
    cfg: &SimulationConfig,
    seed: u64,
) -> Vec<ContingencyRow> {
    let coarse_trials = ((cfg.n_simulations as f64 * 0.2) as u32)
        .max(MIN_SCENARIO_TRIALS)
        .min(cfg.n_simulations);

    let mut tables: Vec<Vec<EvaluationRow>> = Vec::with_capacity(SCENARIO_COUNT);
    for (i, kind) in ScenarioKind::ALL.into_iter().enumerate() {
        let trials = if kind == ScenarioKind::Baseline {
            cfg.n_simulations
        } else {
            coarse_trials
        };
        let (scenario_params, scenario_cfg) = scenario_inputs(params, cfg, kind, trials);
        let table = evaluate_strategies(
            candidates,
            total_laps,
            &scenario_params,
            &scenario_cfg,
            seed + i as u64 * SCENARIO_SEED_STRIDE,
        );
        debug!("scenario {} evaluated: {} rows", kind.key(), table.len());
        tables.push(table);
    }

    // Inner join: a strategy survives only if every scenario priced it
    let lookups: Vec<HashMap<&str, &EvaluationRow>> = tables
        .iter()
        .map(|t| t.iter().map(|row| (row.strategy.as_str(), row)).collect())
        .collect();

    let mut merged: Vec<ContingencyRow> = Vec::new();
    for base_row in &tables[0] {
        let per_scenario: Option<Vec<&EvaluationRow>> = lookups
            .iter()
            .map(|lookup| lookup.get(base_row.strategy.as_str()).copied())
            .collect();
        let Some(per_scenario) = per_scenario else {
            continue;
        };

        let mut scenarios = [ScenarioStats {
            expected_race_time: 0.0,
            win_probability: 0.0,
            strategy_score: 0.0,
            robustness_window: 0.0,
        }; SCENARIO_COUNT];
        for (slot, row) in scenarios.iter_mut().zip(&per_scenario) {
            *slot = ScenarioStats::from(*row);
        }

        merged.push(ContingencyRow {
            strategy: base_row.strategy.clone(),
            stops: base_row.stops,
            compounds: base_row.compounds.clone(),
            pit_laps: base_row.pit_laps.clone(),
            scenarios,
            top3_scenario_hits: 0,
        });
    }

    if merged.is_empty() {
        warn!(
            "contingency merge produced no rows ({} candidates in)",
            candidates.len()
        );
        return merged;
    }

    // Top-3 membership per scenario, summed across the catalog
    for kind in ScenarioKind::ALL {
        let mut order: Vec<usize> = (0..merged.len()).collect();
        order.sort_by(|&a, &b| {
            merged[b]
                .stats(kind)
                .strategy_score
                .total_cmp(&merged[a].stats(kind).strategy_score)
        });
        for &idx in order.iter().take(3) {
            merged[idx].top3_scenario_hits += 1;
        }
    }

    merged.sort_by(|a, b| {
        b.baseline()
            .strategy_score
            .total_cmp(&a.baseline().strategy_score)
            .then(
                a.baseline()
                    .expected_race_time
                    .total_cmp(&b.baseline().expected_race_time),
            )
    });
    merged
}
