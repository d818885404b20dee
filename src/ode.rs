//! Deterministic mean-field model.
//!
//! Integrates the coupled F/P system with the adaptive solver, both as
//! fixed-grid time series for a few segregation costs and as equilibrium
//! sweeps over the (cost, transfer rate) plane.

use crate::config::Params;
use crate::model::{Trajectory, linspace};
use crate::solver::{self, Tolerances};
use anyhow::{Context, Result};
use serde::Serialize;

/// Segregation costs covered by the headline time series.
const S_VALUES: [f64; 3] = [0.0, 0.2, 0.6];

/// Initial subpopulation fractions of the deterministic model.
const INIT_F: f64 = 0.99;
const INIT_P: f64 = 0.01;

/// Output samples of a time-series run.
const OUTPUT_SAMPLES: usize = 500;

/// Sweep grid resolution and axis ranges.
const SWEEP_POINTS: usize = 20;
const BETA_MAX: f64 = 0.05;
const COST_MAX: f64 = 0.2;

/// Time derivative of the (F, P) state.
///
/// Growth terms are not floored at zero: above the carrying capacity both
/// subpopulations decline, which is the intended density dependence.
fn vector_field(p: &Params, state: &[f64; 2]) -> [f64; 2] {
    let [f, pl] = *state;
    let n = f + pl;
    let crowding = 1.0 - n / p.k;
    let w_f = p.r * (1.0 - p.s) * crowding;
    let w_p = p.r * (1.0 - p.c) * crowding;

    [
        w_f * f - p.mu * f + p.delta * pl - p.beta * f * pl,
        w_p * pl - p.mu * pl - p.delta * pl + p.beta * f * pl,
    ]
}

/// One deterministic trajectory at a fixed segregation cost.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub s: f64,
    pub trajectory: Trajectory,
}

/// Equilibrium sweep over the (cost, transfer rate) plane.
///
/// `heatmap[i][j]` is the equilibrium plasmid fraction at `cost_values[i]`
/// and `beta_values[j]`; cells are in `[0, 1]` or NaN where the population
/// is extinct or the integration failed. `bifurcation` is the 1-D curve
/// over the transfer rate at the base plasmid cost.
#[derive(Debug, Clone, Serialize)]
pub struct BetaSweep {
    pub beta_values: Vec<f64>,
    pub cost_values: Vec<f64>,
    pub heatmap: Vec<Vec<f64>>,
    pub bifurcation: Vec<BifurcationPoint>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BifurcationPoint {
    pub beta: f64,
    pub plasmid_fraction: f64,
}

/// Integrate the mean-field model over `[0, tmax]` for each headline
/// segregation cost, sampled at 500 evenly spaced output times.
pub fn run_time_series(params: &Params, tmax: f64) -> Result<Vec<TimeSeries>> {
    let t_eval = linspace(0.0, tmax, OUTPUT_SAMPLES);

    S_VALUES
        .iter()
        .map(|&s| {
            let cell = params.with_s(s);
            let solution = solver::integrate_at(
                |_t, y| vector_field(&cell, y),
                [INIT_F, INIT_P],
                &t_eval,
                Tolerances::default(),
            )
            .with_context(|| format!("failed to integrate time series at s = {s}"))?;

            let mut trajectory = Trajectory::with_capacity(solution.times.len());
            for (t, state) in solution.times.iter().zip(&solution.states) {
                trajectory.push(*t, state[0], state[1]);
            }
            Ok(TimeSeries { s, trajectory })
        })
        .collect()
}

/// Sweep the equilibrium plasmid fraction over a 20x20 (cost, beta) grid and
/// over the transfer rate alone at the base cost.
///
/// Every cell integrates to `tmax` with default step selection and keeps the
/// final state only. A cell whose integration fails is recorded as NaN and
/// the sweep continues.
pub fn run_beta_sweep(params: &Params, tmax: f64) -> BetaSweep {
    let beta_values = linspace(0.0, BETA_MAX, SWEEP_POINTS);
    let cost_values = linspace(0.0, COST_MAX, SWEEP_POINTS);

    let heatmap = cost_values
        .iter()
        .map(|&cost| {
            beta_values
                .iter()
                .map(|&beta| equilibrium_fraction(&params.with_cost(cost).with_beta(beta), tmax))
                .collect()
        })
        .collect();

    let bifurcation = beta_values
        .iter()
        .map(|&beta| BifurcationPoint {
            beta,
            plasmid_fraction: equilibrium_fraction(&params.with_beta(beta), tmax),
        })
        .collect();

    BetaSweep {
        beta_values,
        cost_values,
        heatmap,
        bifurcation,
    }
}

/// Final-state plasmid fraction `P / (F + P)` of one sweep cell.
fn equilibrium_fraction(cell: &Params, tmax: f64) -> f64 {
    let solution = match solver::integrate(
        |_t, y| vector_field(cell, y),
        [INIT_F, INIT_P],
        tmax,
        Tolerances::default(),
    ) {
        Ok(solution) => solution,
        Err(error) => {
            log::warn!(
                "sweep cell failed at c = {}, beta = {}: {error:#}",
                cell.c,
                cell.beta
            );
            return f64::NAN;
        }
    };

    plasmid_fraction(solution.final_state())
}

fn plasmid_fraction([f, p]: [f64; 2]) -> f64 {
    let n = f + p;
    if n > 0.0 { (p / n).clamp(0.0, 1.0) } else { f64::NAN }
}
