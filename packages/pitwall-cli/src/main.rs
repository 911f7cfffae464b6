//! main.rs — Pitwall strategy advisor entry point
//!
//! Loads one event's parameters from config.toml, runs the full engine
//! chain (candidate enumeration → contingency simulation → learned
//! ranking → plan selection) and prints the recommendation, optionally
//! with the full ranked table, as JSON.

use std::collections::HashMap;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::info;

use pitwall_engine::{recommend_event, RaceParameters, SimulationConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pitwall", about = "Race-day tire/pit strategy advisor")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Random seed for the simulation streams
    #[arg(long, default_value = "42")]
    seed: u64,
    /// Override the trial count from the config
    #[arg(long)]
    simulations: Option<u32>,
    /// Also print the full ranked contingency table
    #[arg(long)]
    table: bool,
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FullConfig {
    event: EventConfig,
    #[serde(default)]
    degradation: HashMap<String, f64>,
    #[serde(default)]
    simulation: SimulationConfig,
    #[serde(default)]
    strategy: StrategyConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EventConfig {
    name: String,
    total_laps: u32,
    base_lap_time: f64,
    fuel_load_proxy: f64,
    traffic_index: f64,
    rain_index: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            name: "Round_01".to_string(),
            total_laps: 58,
            base_lap_time: 90.5,
            fuel_load_proxy: 0.95,
            traffic_index: 0.5,
            rain_index: 0.05,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StrategyConfig {
    compounds: Vec<String>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            compounds: vec!["SOFT".to_string(), "MEDIUM".to_string(), "HARD".to_string()],
        }
    }
}

fn default_degradation() -> HashMap<String, f64> {
    HashMap::from([
        ("SOFT".to_string(), 0.16),
        ("MEDIUM".to_string(), 0.11),
        ("HARD".to_string(), 0.08),
    ])
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitwall=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let mut cfg: FullConfig =
        toml::from_str(&config_str).with_context(|| format!("invalid config {}", args.config))?;

    if cfg.degradation.is_empty() {
        cfg.degradation = default_degradation();
    }
    if let Some(n) = args.simulations {
        cfg.simulation.n_simulations = n;
    }

    info!(
        "🏁 {} — {} laps, base lap {:.3}s, {} trials, seed {}",
        cfg.event.name,
        cfg.event.total_laps,
        cfg.event.base_lap_time,
        cfg.simulation.n_simulations,
        args.seed
    );

    let params = RaceParameters {
        base_lap_time: cfg.event.base_lap_time,
        degradation: cfg.degradation,
        fuel_load_proxy: cfg.event.fuel_load_proxy,
        traffic_index: cfg.event.traffic_index,
        rain_index: cfg.event.rain_index,
    };

    let outcome = recommend_event(
        cfg.event.total_laps,
        &cfg.strategy.compounds,
        &params,
        &cfg.simulation,
        args.seed,
    )
    .with_context(|| format!("no strategy available for {}", cfg.event.name))?;

    let rec = &outcome.recommendation;
    info!(
        "🥇 {} — {} (score {:.3}, win {:.1}%)",
        rec.primary.strategy,
        rec.primary.plan,
        rec.primary.strategy_score,
        rec.primary.win_probability * 100.0
    );
    for (i, fallback) in rec.fallbacks.iter().enumerate() {
        info!(
            "🔁 fallback {} — {} | trigger: {}",
            i + 2,
            fallback.pick.plan,
            fallback.trigger
        );
    }
    info!(
        "📊 {} strategies ranked, held-out mae {:.4}",
        outcome.ranked.len(),
        outcome.metrics.mae
    );

    println!("{}", serde_json::to_string_pretty(&outcome.recommendation)?);
    if args.table {
        println!("{}", serde_json::to_string_pretty(&outcome.ranked)?);
    }

    Ok(())
}
