//! pitwall-engine — race strategy simulation and contingency ranking
//!
//! Given a race distance, a predicted base lap time and per-event
//! degradation/fuel/traffic/rain indices, the engine:
//!   1. enumerates candidate pit plans (candidates)
//!   2. prices each plan with a stochastic lap-by-lap simulator (simulator,
//!      evaluator)
//!   3. re-prices every plan under four named disruption scenarios and
//!      merges the results into one wide table (contingency)
//!   4. fits a learned re-ranking over the scenario statistics (ranker)
//!   5. selects a primary plan plus two scenario-aware fallbacks
//!      (selection)
//!
//! Pure in-memory computation; every call takes its own seed, so per-event
//! evaluations are independent and reproducible.

pub mod candidates;
pub mod config;
pub mod contingency;
pub mod error;
pub mod evaluator;
mod gbm;
pub mod ranker;
pub mod selection;
mod simulator;

pub use candidates::{generate_candidates, StrategyCandidate};
pub use config::{RaceParameters, SimulationConfig};
pub use contingency::{evaluate_with_contingencies, ContingencyRow, ScenarioKind, ScenarioStats};
pub use error::EngineError;
pub use evaluator::{evaluate_strategies, EvaluationRow};
pub use ranker::{ContingencyRankResult, ContingencyRanker, RankMetrics, RankedRow};
pub use selection::{
    plan_text, select_recommendation, FallbackPick, RaceRecommendation, StrategyPick,
};

/// Everything one event evaluation produces: the learned ranking (for
/// reporting) plus the final plan selection.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    pub recommendation: RaceRecommendation,
    pub ranked: Vec<RankedRow>,
    pub metrics: RankMetrics,
}

/// Run the full chain for one event. Seed offsets for multiple events are
/// the caller's concern (e.g. `base_seed + event_index` keeps a season run
/// reproducible).
pub fn recommend_event(
    total_laps: u32,
    compounds: &[String],
    params: &RaceParameters,
    cfg: &SimulationConfig,
    seed: u64,
) -> Result<EventOutcome, EngineError> {
    let candidates = generate_candidates(total_laps, compounds);
    let table = evaluate_with_contingencies(&candidates, total_laps, params, cfg, seed);
    let rank_result = ContingencyRanker::new(seed).rank(&table);
    let recommendation = select_recommendation(&table, &rank_result.ranked)?;
    Ok(EventOutcome {
        recommendation,
        ranked: rank_result.ranked,
        metrics: rank_result.metrics,
    })
}
