//! ranker.rs — Learned contingency re-ranking
//!
//! The baseline sort alone would always surface the single most aggressive
//! baseline-optimal plan as a "fallback". This step maps each strategy's
//! baseline + scenario statistics to one composite rank score so fallbacks
//! are plans that stay good when disruptions are considered.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::contingency::{ContingencyRow, ScenarioKind};
use crate::gbm::GradientBoostedTrees;

/// Below this many deduplicated strategies there is not enough data to
/// generalize; the raw composite target is used directly.
const MIN_ROWS_FOR_MODEL: usize = 12;

const N_TREES: usize = 200;
const LEARNING_RATE: f64 = 0.05;
const MAX_DEPTH: usize = 3;
const HELD_OUT_FRACTION: f64 = 0.25;

const COMPOUND_FEATURES: [&str; 3] = ["SOFT", "MEDIUM", "HARD"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    #[serde(flatten)]
    pub row: ContingencyRow,
    pub contingency_rank_score: f64,
}

/// Diagnostic metrics from the fitting step. `mae` is 0.0 by convention
/// when no held-out evaluation occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankMetrics {
    pub mae: f64,
}

#[derive(Debug, Clone)]
pub struct ContingencyRankResult {
    pub ranked: Vec<RankedRow>,
    pub metrics: RankMetrics,
}

pub struct ContingencyRanker {
    random_state: u64,
}

impl ContingencyRanker {
    pub fn new(random_state: u64) -> Self {
        Self { random_state }
    }

    /// Score and re-sort a contingency table. Rows are deduplicated by
    /// strategy name (first occurrence wins) before anything else.
    pub fn rank(&self, table: &[ContingencyRow]) -> ContingencyRankResult {
        let mut seen: HashSet<&str> = HashSet::new();
        let work: Vec<&ContingencyRow> = table
            .iter()
            .filter(|row| seen.insert(row.strategy.as_str()))
            .collect();

        let features: Vec<Vec<f64>> = work.iter().map(|row| feature_vector(row)).collect();
        let targets: Vec<f64> = work.iter().map(|row| composite_target(row)).collect();

        let mut metrics = RankMetrics { mae: 0.0 };
        let scores: Vec<f64> = if work.len() >= MIN_ROWS_FOR_MODEL {
            let (train_idx, test_idx) = held_out_split(work.len(), self.random_state);
            let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| features[i].clone()).collect();
            let train_y: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();

            let model =
                GradientBoostedTrees::fit(&train_x, &train_y, N_TREES, LEARNING_RATE, MAX_DEPTH);

            metrics.mae = test_idx
                .iter()
                .map(|&i| (model.predict(&features[i]) - targets[i]).abs())
                .sum::<f64>()
                / test_idx.len() as f64;
            debug!(
                "contingency ranker fitted on {}/{} rows, held-out mae {:.4}",
                train_idx.len(),
                work.len(),
                metrics.mae
            );

            features.iter().map(|f| model.predict(f)).collect()
        } else {
            debug!(
                "only {} strategies; using the raw composite target",
                work.len()
            );
            targets.clone()
        };

        let mut ranked: Vec<RankedRow> = work
            .into_iter()
            .zip(scores)
            .map(|(row, score)| RankedRow {
                row: row.clone(),
                contingency_rank_score: score,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.contingency_rank_score
                .total_cmp(&a.contingency_rank_score)
                .then(
                    b.row
                        .baseline()
                        .strategy_score
                        .total_cmp(&a.row.baseline().strategy_score),
                )
        });

        ContingencyRankResult { ranked, metrics }
    }
}

/// Deterministic seeded shuffle split; the held-out share is rounded up so
/// at least one row is always evaluated.
fn held_out_split(n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = ((n as f64 * HELD_OUT_FRACTION).ceil() as usize).max(1);
    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    (train, test)
}

fn disruption_mean(row: &ContingencyRow, pick: impl Fn(&ContingencyRow, ScenarioKind) -> f64) -> f64 {
    ScenarioKind::DISRUPTIONS
        .iter()
        .map(|&kind| pick(row, kind))
        .sum::<f64>()
        / ScenarioKind::DISRUPTIONS.len() as f64
}

/// 17 numeric features: stops, the baseline statistics, the four scenario
/// scores and win probabilities, the top-3 hit count, and the compound
/// usage counts.
fn feature_vector(row: &ContingencyRow) -> Vec<f64> {
    let baseline = row.baseline();
    let mut v = vec![
        row.stops as f64,
        baseline.expected_race_time,
        baseline.win_probability,
        baseline.strategy_score,
        baseline.robustness_window,
    ];
    for kind in ScenarioKind::DISRUPTIONS {
        v.push(row.stats(kind).strategy_score);
    }
    for kind in ScenarioKind::DISRUPTIONS {
        v.push(row.stats(kind).win_probability);
    }
    v.push(row.top3_scenario_hits as f64);
    for compound in COMPOUND_FEATURES {
        v.push(row.compounds.iter().filter(|c| c.as_str() == compound).count() as f64);
    }
    v
}

/// Scenario-aware supervisory signal: mean disruption score, sweetened by
/// disruption win rate and top-3 presence, penalized by disruption spread.
fn composite_target(row: &ContingencyRow) -> f64 {
    let score_mean = disruption_mean(row, |r, k| r.stats(k).strategy_score);
    let win_mean = disruption_mean(row, |r, k| r.stats(k).win_probability);
    let robustness_mean = disruption_mean(row, |r, k| r.stats(k).robustness_window);
    score_mean + 0.2 * win_mean + 0.06 * row.top3_scenario_hits as f64
        - 0.01 * robustness_mean
}
