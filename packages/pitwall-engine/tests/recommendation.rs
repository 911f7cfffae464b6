//! End-to-end engine flow: candidate enumeration through plan selection.

use std::collections::HashMap;

use pitwall_engine::{recommend_event, RaceParameters, SimulationConfig};

fn params() -> RaceParameters {
    RaceParameters {
        base_lap_time: 90.5,
        degradation: HashMap::from([
            ("SOFT".to_string(), 0.18),
            ("MEDIUM".to_string(), 0.12),
            ("HARD".to_string(), 0.08),
        ]),
        fuel_load_proxy: 0.95,
        traffic_index: 0.5,
        rain_index: 0.05,
    }
}

fn cfg() -> SimulationConfig {
    SimulationConfig {
        n_simulations: 60,
        ..SimulationConfig::default()
    }
}

fn compounds() -> Vec<String> {
    vec!["SOFT".to_string(), "MEDIUM".to_string(), "HARD".to_string()]
}

#[test]
fn full_event_evaluation_selects_a_primary_and_two_fallbacks() {
    let outcome = recommend_event(30, &compounds(), &params(), &cfg(), 42).unwrap();

    // 18 one-stop + 24 two-stop candidates survive every scenario
    assert_eq!(outcome.ranked.len(), 42);
    assert!(outcome.metrics.mae >= 0.0);

    let rec = &outcome.recommendation;
    assert!(rec.primary.plan.starts_with("Start on "));
    assert_eq!(rec.fallbacks.len(), 2);

    let mut names = vec![rec.primary.strategy.as_str()];
    for fallback in &rec.fallbacks {
        assert!(!names.contains(&fallback.pick.strategy.as_str()));
        names.push(&fallback.pick.strategy);
        assert!(!fallback.trigger.is_empty());
        assert!(fallback.pick.plan.contains("Pit on lap "));
        assert!(fallback.pick.first_pit_lap.is_some());
    }

    // Primary carries baseline statistics in plausible ranges
    assert!(rec.primary.expected_race_time > 30.0 * 40.0);
    assert!((0.0..=1.0).contains(&rec.primary.win_probability));
    assert!(rec.primary.robustness_window >= 0.0);
}

#[test]
fn same_seed_reproduces_the_same_recommendation() {
    let a = recommend_event(30, &compounds(), &params(), &cfg(), 7).unwrap();
    let b = recommend_event(30, &compounds(), &params(), &cfg(), 7).unwrap();
    assert_eq!(a.recommendation, b.recommendation);
    assert_eq!(a.ranked, b.ranked);
}

#[test]
fn empty_compound_list_is_a_hard_selection_failure() {
    let err = recommend_event(58, &[], &params(), &cfg(), 1).unwrap_err();
    assert_eq!(
        err,
        pitwall_engine::EngineError::EmptyContingencyTable
    );
}

#[test]
fn recommendation_serializes_with_scenario_keyed_tables() {
    let outcome = recommend_event(20, &compounds(), &params(), &cfg(), 3).unwrap();
    let json = serde_json::to_value(&outcome.ranked).unwrap();
    let first = &json[0];
    assert!(first["scenarios"]["baseline"]["strategy_score"].is_number());
    assert!(first["scenarios"]["race_chaos"]["win_probability"].is_number());
    assert!(first["contingency_rank_score"].is_number());
}
