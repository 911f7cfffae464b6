//! candidates.rs — Candidate pit-plan enumeration
//!
//! Enumerates every tire/pit plan the simulator will be asked to price:
//! one-stop plans over ordered distinct compound pairs at three fixed
//! pit-lap fractions, and two-stop plans over ordered compound triples
//! that use at least two distinct compounds.

use serde::Serialize;

/// Pit-lap fractions of race distance for one-stop plans.
const ONE_STOP_FRACTIONS: [f64; 3] = [0.38, 0.50, 0.62];

/// Pit-lap fractions for two-stop plans.
const TWO_STOP_FRACTIONS: [f64; 2] = [0.32, 0.67];

/// One complete tire/pit plan: compound per stint plus the laps to pit on.
///
/// Invariant: `compounds.len() == pit_laps.len() + 1`, pit laps strictly
/// increasing within `[1, total_laps - 1]`. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyCandidate {
    pub name: String,
    pub compounds: Vec<String>,
    pub pit_laps: Vec<u32>,
}

impl StrategyCandidate {
    pub fn stops(&self) -> usize {
        self.pit_laps.len()
    }
}

/// Uppercase and de-duplicate the usable compound list, preserving order.
fn normalize_compounds(compounds: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(compounds.len());
    for c in compounds {
        let upper = c.trim().to_uppercase();
        if upper.is_empty() || out.contains(&upper) {
            continue;
        }
        out.push(upper);
    }
    out
}

/// Enumerate every unique candidate plan for a race of `total_laps`.
///
/// Deterministic in its inputs; an empty compound list or a race too short
/// to fit a pit window yields an empty set rather than an error (callers
/// must tolerate sparse data).
pub fn generate_candidates(total_laps: u32, compounds: &[String]) -> Vec<StrategyCandidate> {
    let unique = normalize_compounds(compounds);
    if unique.is_empty() || total_laps < 4 {
        return Vec::new();
    }

    let mut out: Vec<StrategyCandidate> = Vec::new();

    // One-stop options
    for c1 in &unique {
        for c2 in &unique {
            if c1 == c2 {
                continue;
            }
            for frac in ONE_STOP_FRACTIONS {
                let pit = (total_laps as f64 * frac) as u32;
                out.push(StrategyCandidate {
                    name: format!("ONE_STOP_{c1}_{c2}_L{pit}"),
                    compounds: vec![c1.clone(), c2.clone()],
                    pit_laps: vec![pit],
                });
            }
        }
    }

    // Two-stop options: a repeat compound is fine as long as the triple
    // is not all one compound.
    for c1 in &unique {
        for c2 in &unique {
            for c3 in &unique {
                if c1 == c2 && c2 == c3 {
                    continue;
                }
                let pit1 = (total_laps as f64 * TWO_STOP_FRACTIONS[0]) as u32;
                let pit2 = (total_laps as f64 * TWO_STOP_FRACTIONS[1]) as u32;
                out.push(StrategyCandidate {
                    name: format!("TWO_STOP_{c1}_{c2}_{c3}_L{pit1}_{pit2}"),
                    compounds: vec![c1.clone(), c2.clone(), c3.clone()],
                    pit_laps: vec![pit1, pit2],
                });
            }
        }
    }

    // De-dup by name, first occurrence wins
    let mut seen = std::collections::HashSet::new();
    out.retain(|c| seen.insert(c.name.clone()));
    out
}
