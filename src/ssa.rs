//! Stochastic discrete-event model.
//!
//! Direct-method Gillespie simulation of the F/P birth, death, loss, and
//! transfer events, plus the replicate batches the aggregator consumes.

use crate::config::Params;
use crate::model::{Trajectory, linspace};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Exp, Uniform};
use rayon::prelude::*;
use serde::Serialize;

/// Segregation costs covered by the replicate batches.
const S_VALUES: [f64; 3] = [0.0, 0.2, 0.6];

/// Initial subpopulation fractions of the stochastic model.
const INIT_F: f64 = 0.9;
const INIT_P: f64 = 0.1;

/// Shared resampling grid size.
const GRID_SAMPLES: usize = 500;

/// The stochastic engine runs on absolute counts; the raw carrying capacity
/// is scaled up by this factor before fractions are converted, so population
/// sizes are large enough for meaningful dynamics.
const CAPACITY_SCALE: f64 = 1000.0;

/// Event channels in their fixed selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    GrowthF,
    GrowthP,
    DeathF,
    DeathP,
    Loss,
    Transfer,
}

const CHANNELS: [Channel; 6] = [
    Channel::GrowthF,
    Channel::GrowthP,
    Channel::DeathF,
    Channel::DeathP,
    Channel::Loss,
    Channel::Transfer,
];

impl Channel {
    fn apply(self, f: &mut u64, p: &mut u64) {
        match self {
            Channel::GrowthF => *f += 1,
            Channel::GrowthP => *p += 1,
            Channel::DeathF => *f = f.saturating_sub(1),
            Channel::DeathP => *p = p.saturating_sub(1),
            Channel::Loss => {
                *p = p.saturating_sub(1);
                *f += 1;
            }
            Channel::Transfer => {
                *f = f.saturating_sub(1);
                *p += 1;
            }
        }
    }
}

/// Per-channel propensities at the current counts.
///
/// Growth propensities are floored at zero above the carrying capacity; the
/// remaining channels are non-negative by construction.
fn propensities(p: &Params, f: u64, pl: u64) -> [f64; 6] {
    let (f, pl) = (f as f64, pl as f64);
    let crowding = 1.0 - (f + pl) / p.k;
    let w_f = (p.r * (1.0 - p.s) * crowding).max(0.0);
    let w_p = (p.r * (1.0 - p.c) * crowding).max(0.0);

    [
        w_f * f,
        w_p * pl,
        p.mu * f,
        p.mu * pl,
        p.delta * pl,
        p.beta / p.k * f * pl,
    ]
}

/// Locate `draw` in the cumulative sum of the channel rates.
///
/// `draw` is uniform in `[0, a0)`; the strict comparison sends a draw that
/// lands exactly on a boundary to the next channel, so ties follow the fixed
/// channel order.
fn select_channel(rates: &[f64; 6], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (idx, rate) in rates.iter().enumerate() {
        cumulative += rate;
        if draw < cumulative {
            return idx;
        }
    }
    rates.len() - 1
}

/// One Gillespie trajectory on the already-scaled parameter record.
///
/// Records every event; terminates when simulated time passes `tmax`, the
/// population is extinct, or no channel can fire (`a0 <= 0`, an absorbing
/// state rather than an error).
pub fn gillespie_run(params: &Params, tmax: f64, rng: &mut ChaCha12Rng) -> Result<Trajectory> {
    let mut f = (INIT_F * params.k) as u64;
    let mut p = (INIT_P * params.k) as u64;
    let mut t = 0.0;

    let mut trajectory = Trajectory::with_capacity(1024);
    trajectory.push(t, f as f64, p as f64);

    while t < tmax && f + p > 0 {
        let rates = propensities(params, f, p);
        let a0: f64 = rates.iter().sum();
        if a0 <= 0.0 {
            break;
        }

        t += Exp::new(a0)
            .context("failed to construct holding-time distribution")?
            .sample(rng);

        let draw = Uniform::new(0.0, a0)
            .context("failed to construct channel distribution")?
            .sample(rng);
        CHANNELS[select_channel(&rates, draw)].apply(&mut f, &mut p);

        trajectory.push(t, f as f64, p as f64);
    }

    Ok(trajectory)
}

/// Replicate matrices for one segregation cost, on a shared time grid.
///
/// `f[run]` and `p[run]` hold the resampled subpopulation fractions of one
/// replicate (counts divided by the scaled carrying capacity).
#[derive(Debug, Clone, Serialize)]
pub struct ReplicateBatch {
    pub s: f64,
    pub times: Vec<f64>,
    pub f: Vec<Vec<f64>>,
    pub p: Vec<Vec<f64>>,
}

/// Run `runs` independent replicates per segregation cost and resample each
/// onto a 500-point grid over `[0, tmax]`.
///
/// The carrying capacity is scaled on a derived copy of `params`; the
/// caller's record is never touched, so repeated calls cannot compound the
/// scaling. Replicates execute in parallel, each on its own counter-derived
/// RNG stream, so trajectories stay independent and reproducible for a given
/// base seed.
pub fn run_multiple_ssa(
    params: &Params,
    tmax: f64,
    runs: usize,
    seed: Option<u64>,
) -> Result<Vec<ReplicateBatch>> {
    let base_seed = match seed {
        Some(seed) => seed,
        None => ChaCha12Rng::try_from_os_rng()
            .context("failed to seed from the operating system")?
            .random(),
    };
    log::info!("running {runs} replicates per s value with base seed {base_seed}");

    let scaled = params.with_capacity(params.k * CAPACITY_SCALE);
    let grid = linspace(0.0, tmax, GRID_SAMPLES);

    S_VALUES
        .iter()
        .enumerate()
        .map(|(s_idx, &s)| {
            let cell = scaled.with_s(s);

            let rows: Vec<(Vec<f64>, Vec<f64>)> = (0..runs)
                .into_par_iter()
                .map(|run_idx| {
                    let stream = base_seed.wrapping_add((s_idx * runs + run_idx) as u64);
                    let mut rng = ChaCha12Rng::seed_from_u64(stream);

                    let trajectory = gillespie_run(&cell, tmax, &mut rng)
                        .with_context(|| format!("failed replicate {run_idx} at s = {s}"))?;

                    let (f, p) = trajectory.sample_onto(&grid);
                    let f = f.iter().map(|count| count / cell.k).collect();
                    let p = p.iter().map(|count| count / cell.k).collect();
                    Ok((f, p))
                })
                .collect::<Result<_>>()?;

            log::info!("completed {runs} replicates for s = {s}");

            let (f, p) = rows.into_iter().unzip();
            Ok(ReplicateBatch {
                s,
                times: grid.clone(),
                f,
                p,
            })
        })
        .collect()
}
