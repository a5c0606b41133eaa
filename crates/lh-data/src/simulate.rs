//! Synthetic survey extracts from a known triple-difference process.
//!
//! Used by `lanham simulate`, the integration tests and the benches. Each
//! state gets a fixed spending level; within a state, every
//! `treated × post` cell holds `n_per_cell` respondents. Weekly hours of
//! employed respondents follow
//!
//! ```text
//! hours = 38 + u_state + 0.05·(age − 40) − post + 0.5·treated·post
//!         + effect·treated·post·spending + ε,   ε ~ N(0, noise_sd²)
//! ```
//!
//! rounded and clipped to `[1, 98]`; non-employed respondents report 0.
//! Employment is Bernoulli with a linear probability carrying
//! `effect / 100` on the triple interaction. A share of hours cells is
//! written as the `"N/A"` sentinel and a share of rows gets race code 2.

use lh_core::{Error, Result};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::pipeline::ColumnMap;
use crate::table::{Column, Table};

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of states (at least 2).
    pub n_states: usize,
    /// Respondents per state × treated × post cell.
    pub n_per_cell: usize,
    /// True triple-interaction coefficient on hours.
    pub effect: f64,
    /// Standard deviation of the hours noise.
    pub noise_sd: f64,
    /// Share of rows whose hours are reported as `"N/A"`.
    pub na_hours_share: f64,
    /// Share of rows with race code 2.
    pub other_race_share: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_states: 8,
            n_per_cell: 250,
            effect: 2.0,
            noise_sd: 6.0,
            na_hours_share: 0.02,
            other_race_share: 0.1,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.n_states < 2 {
            return Err(Error::Validation(format!("n_states must be >= 2, got {}", self.n_states)));
        }
        if self.n_per_cell == 0 {
            return Err(Error::Validation("n_per_cell must be > 0".into()));
        }
        for (name, share) in
            [("na_hours_share", self.na_hours_share), ("other_race_share", self.other_race_share)]
        {
            if !(0.0..=1.0).contains(&share) {
                return Err(Error::Validation(format!("{} must be in [0, 1], got {}", name, share)));
            }
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(Error::Validation(format!("noise_sd must be finite and >= 0, got {}", self.noise_sd)));
        }
        Ok(())
    }
}

/// Spending level of state `k`: evenly spread over `[0.5, 4.5]`.
pub fn state_spending(k: usize, n_states: usize) -> f64 {
    0.5 + 4.0 * k as f64 / (n_states - 1).max(1) as f64
}

/// Generate a synthetic extract with the source columns named by `columns`.
///
/// The hours column is text (so it can carry `"N/A"`); every other column is
/// numeric. Deterministic given `config.seed`.
pub fn generate(config: &SimulationConfig, columns: &ColumnMap) -> Result<Table> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let eps = Normal::new(0.0, config.noise_sd).map_err(|e| Error::Computation(e.to_string()))?;
    let state_shock = Normal::new(0.0, 2.0).map_err(|e| Error::Computation(e.to_string()))?;

    let n = config.n_states * 4 * config.n_per_cell;
    let mut race = Vec::with_capacity(n);
    let mut hours = Vec::with_capacity(n);
    let mut state = Vec::with_capacity(n);
    let mut age = Vec::with_capacity(n);
    let mut emp = Vec::with_capacity(n);
    let mut treated = Vec::with_capacity(n);
    let mut post = Vec::with_capacity(n);
    let mut spending = Vec::with_capacity(n);

    for k in 0..config.n_states {
        let s = state_spending(k, config.n_states);
        let u_hours: f64 = state_shock.sample(&mut rng);
        let u_emp = u_hours / 100.0;
        for t in [0.0, 1.0] {
            for p in [0.0, 1.0] {
                for _ in 0..config.n_per_cell {
                    let a = f64::from(rng.gen_range(25u32..=64));
                    let triple = t * p * s;

                    let p_emp = (0.35 + u_emp + 0.002 * (a - 40.0) + 0.03 * p + 0.01 * t * p
                        + config.effect / 100.0 * triple)
                        .clamp(0.02, 0.98);
                    let employed = rng.gen::<f64>() < p_emp;

                    let h = if employed {
                        let mean = 38.0 + u_hours + 0.05 * (a - 40.0) - p + 0.5 * t * p
                            + config.effect * triple;
                        (mean + eps.sample(&mut rng)).round().clamp(1.0, 98.0)
                    } else {
                        0.0
                    };
                    let h_cell = if rng.gen::<f64>() < config.na_hours_share {
                        "N/A".to_string()
                    } else {
                        format!("{}", h)
                    };
                    let r = if rng.gen::<f64>() < config.other_race_share { 2.0 } else { 1.0 };

                    race.push(Some(r));
                    hours.push(Some(h_cell));
                    state.push(Some((k + 1) as f64));
                    age.push(Some(a));
                    emp.push(Some(if employed { 1.0 } else { 0.0 }));
                    treated.push(Some(t));
                    post.push(Some(p));
                    spending.push(Some(s));
                }
            }
        }
    }

    tracing::debug!(rows = n, states = config.n_states, effect = config.effect, "synthetic extract generated");
    Table::from_columns(vec![
        (columns.race.clone(), Column::Numeric(race)),
        (columns.hours.clone(), Column::Text(hours)),
        (columns.state.clone(), Column::Numeric(state)),
        (columns.age.clone(), Column::Numeric(age)),
        (columns.employed.clone(), Column::Numeric(emp)),
        (columns.treated.clone(), Column::Numeric(treated)),
        (columns.post.clone(), Column::Numeric(post)),
        (columns.spending.clone(), Column::Numeric(spending)),
    ])
}
