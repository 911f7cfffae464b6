//! selection.rs — Primary plan and fallback selection
//!
//! Primary = best by baseline strategy score (tie-break on lower expected
//! race time). The two fallbacks come from the learned contingency
//! ranking, must be distinct from the primary and each other, and each
//! names the disruption scenario that most favors it as its trigger.

use serde::Serialize;

use crate::contingency::ContingencyRow;
use crate::error::EngineError;
use crate::ranker::RankedRow;

/// Human-readable pit-wall plan string.
pub fn plan_text(compounds: &[String], pit_laps: &[u32]) -> String {
    let Some(first) = compounds.first() else {
        return "No strategy data".to_string();
    };
    if pit_laps.is_empty() {
        return format!("Start on {first} and run full race (0 planned stops)");
    }

    let mut steps = vec![format!("Start on {first}")];
    for (i, pit) in pit_laps.iter().enumerate() {
        let next = &compounds[(i + 1).min(compounds.len() - 1)];
        steps.push(format!("Pit on lap {pit} -> {next}"));
    }
    steps.join("; ")
}

/// One selected plan with its baseline outcome statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyPick {
    pub strategy: String,
    pub stops: usize,
    pub compounds: Vec<String>,
    pub pit_laps: Vec<u32>,
    pub start_compound: String,
    pub first_pit_lap: Option<u32>,
    pub plan: String,
    pub expected_race_time: f64,
    pub win_probability: f64,
    pub strategy_score: f64,
    pub robustness_window: f64,
}

impl StrategyPick {
    fn from_row(row: &ContingencyRow) -> Self {
        let baseline = row.baseline();
        Self {
            strategy: row.strategy.clone(),
            stops: row.stops,
            compounds: row.compounds.clone(),
            pit_laps: row.pit_laps.clone(),
            start_compound: row.compounds.first().cloned().unwrap_or_default(),
            first_pit_lap: row.pit_laps.first().copied(),
            plan: plan_text(&row.compounds, &row.pit_laps),
            expected_race_time: baseline.expected_race_time,
            win_probability: baseline.win_probability,
            strategy_score: baseline.strategy_score,
            robustness_window: baseline.robustness_window,
        }
    }
}

/// A fallback plan plus the disruption that would make the pit wall
/// switch to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackPick {
    #[serde(flatten)]
    pub pick: StrategyPick,
    pub trigger: String,
}

/// Final per-event selection: one primary plan and up to two fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceRecommendation {
    pub primary: StrategyPick,
    pub fallbacks: Vec<FallbackPick>,
}

/// Pick the primary and fallback plans from a contingency table and its
/// learned ranking. When the ranking yields fewer than two distinct
/// alternatives the remainder is filled from baseline order.
pub fn select_recommendation(
    table: &[ContingencyRow],
    ranked: &[RankedRow],
) -> Result<RaceRecommendation, EngineError> {
    let mut baseline_order: Vec<&ContingencyRow> = table.iter().collect();
    baseline_order.sort_by(|a, b| {
        b.baseline()
            .strategy_score
            .total_cmp(&a.baseline().strategy_score)
            .then(
                a.baseline()
                    .expected_race_time
                    .total_cmp(&b.baseline().expected_race_time),
            )
    });

    let primary_row = *baseline_order
        .first()
        .ok_or(EngineError::EmptyContingencyTable)?;

    let mut fallback_rows: Vec<&ContingencyRow> = Vec::with_capacity(2);
    let taken = |name: &str, chosen: &[&ContingencyRow]| {
        name == primary_row.strategy || chosen.iter().any(|c| c.strategy == name)
    };

    for ranked_row in ranked {
        if fallback_rows.len() == 2 {
            break;
        }
        if !taken(&ranked_row.row.strategy, &fallback_rows) {
            fallback_rows.push(&ranked_row.row);
        }
    }
    // Ranker yielded fewer than two distinct alternatives: fill from
    // baseline order
    for &row in &baseline_order {
        if fallback_rows.len() == 2 {
            break;
        }
        if !taken(&row.strategy, &fallback_rows) {
            fallback_rows.push(row);
        }
    }

    let fallbacks = fallback_rows
        .into_iter()
        .map(|row| FallbackPick {
            pick: StrategyPick::from_row(row),
            trigger: row
                .best_disruption()
                .trigger_reason()
                .unwrap_or("")
                .to_string(),
        })
        .collect();

    Ok(RaceRecommendation {
        primary: StrategyPick::from_row(primary_row),
        fallbacks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contingency::{ScenarioKind, ScenarioStats, SCENARIO_COUNT};
    use crate::ranker::ContingencyRanker;

    fn row(name: &str, baseline_score: f64, chaos_score: f64) -> ContingencyRow {
        let stats = |score: f64| ScenarioStats {
            expected_race_time: 5200.0 - score,
            win_probability: 0.3,
            strategy_score: score,
            robustness_window: 12.0,
        };
        let mut scenarios = [stats(baseline_score - 1.0); SCENARIO_COUNT];
        scenarios[ScenarioKind::Baseline.index()] = stats(baseline_score);
        scenarios[ScenarioKind::RaceChaos.index()] = stats(chaos_score);
        ContingencyRow {
            strategy: name.to_string(),
            stops: 1,
            compounds: vec!["SOFT".to_string(), "HARD".to_string()],
            pit_laps: vec![22],
            scenarios,
            top3_scenario_hits: 1,
        }
    }

    #[test]
    fn zero_stop_plan_renders_the_full_race_text() {
        let text = plan_text(&["MEDIUM".to_string()], &[]);
        assert_eq!(text, "Start on MEDIUM and run full race (0 planned stops)");
    }

    #[test]
    fn multi_stop_plan_renders_each_pit_step() {
        let compounds = vec!["SOFT".to_string(), "MEDIUM".to_string(), "HARD".to_string()];
        let text = plan_text(&compounds, &[18, 40]);
        assert_eq!(
            text,
            "Start on SOFT; Pit on lap 18 -> MEDIUM; Pit on lap 40 -> HARD"
        );
    }

    #[test]
    fn primary_is_baseline_best_and_fallbacks_are_distinct() {
        let table = vec![
            row("A", 21.0, 18.0),
            row("B", 20.5, 19.5),
            row("C", 20.0, 19.0),
            row("D", 19.0, 21.5),
        ];
        let ranked = ContingencyRanker::new(5).rank(&table).ranked;
        let rec = select_recommendation(&table, &ranked).unwrap();

        assert_eq!(rec.primary.strategy, "A");
        assert_eq!(rec.fallbacks.len(), 2);
        let names: Vec<&str> = rec
            .fallbacks
            .iter()
            .map(|f| f.pick.strategy.as_str())
            .collect();
        assert!(!names.contains(&"A"));
        assert_ne!(names[0], names[1]);
        for fallback in &rec.fallbacks {
            assert!(!fallback.trigger.is_empty());
        }
    }

    #[test]
    fn fallback_trigger_names_the_most_favorable_disruption() {
        let table = vec![row("A", 21.0, 18.0), row("B", 20.0, 25.0)];
        let ranked = ContingencyRanker::new(5).rank(&table).ranked;
        let rec = select_recommendation(&table, &ranked).unwrap();

        let b = rec
            .fallbacks
            .iter()
            .find(|f| f.pick.strategy == "B")
            .unwrap();
        assert_eq!(b.trigger, "Safety car or race chaos");
    }

    #[test]
    fn empty_table_is_a_hard_failure() {
        let err = select_recommendation(&[], &[]).unwrap_err();
        assert_eq!(err, EngineError::EmptyContingencyTable);
    }

    #[test]
    fn single_row_table_yields_a_primary_and_no_fallbacks() {
        let table = vec![row("A", 21.0, 18.0)];
        let ranked = ContingencyRanker::new(5).rank(&table).ranked;
        let rec = select_recommendation(&table, &ranked).unwrap();
        assert_eq!(rec.primary.strategy, "A");
        assert!(rec.fallbacks.is_empty());
    }
}
