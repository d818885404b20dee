//! Adaptive Runge-Kutta integration.
//!
//! Embedded Cash-Karp 4(5) pair with proportional step-size control. The
//! fifth-order solution is advanced; the fourth-order embedded solution
//! provides the local error estimate.

use anyhow::{Result, bail};

/// Relative/absolute error tolerances for step acceptance.
#[derive(Debug, Clone, Copy)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
        }
    }
}

/// Accepted integration steps, in time order.
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    pub times: Vec<f64>,
    pub states: Vec<[f64; N]>,
}

impl<const N: usize> Solution<N> {
    pub fn final_state(&self) -> [f64; N] {
        self.states.last().copied().unwrap_or([0.0; N])
    }
}

const SAFETY: f64 = 0.9;
const FACTOR_MIN: f64 = 0.2;
const FACTOR_MAX: f64 = 5.0;

// Cash-Karp stage times.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 3.0 / 5.0;
const C5: f64 = 1.0;
const C6: f64 = 7.0 / 8.0;

// Cash-Karp stage coefficients.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 3.0 / 10.0;
const A42: f64 = -9.0 / 10.0;
const A43: f64 = 6.0 / 5.0;
const A51: f64 = -11.0 / 54.0;
const A52: f64 = 5.0 / 2.0;
const A53: f64 = -70.0 / 27.0;
const A54: f64 = 35.0 / 27.0;
const A61: f64 = 1631.0 / 55296.0;
const A62: f64 = 175.0 / 512.0;
const A63: f64 = 575.0 / 13824.0;
const A64: f64 = 44275.0 / 110592.0;
const A65: f64 = 253.0 / 4096.0;

// Fifth-order weights.
const B1: f64 = 37.0 / 378.0;
const B3: f64 = 250.0 / 621.0;
const B4: f64 = 125.0 / 594.0;
const B6: f64 = 512.0 / 1771.0;

// Embedded fourth-order weights.
const E1: f64 = 2825.0 / 27648.0;
const E3: f64 = 18575.0 / 48384.0;
const E4: f64 = 13525.0 / 55296.0;
const E5: f64 = 277.0 / 14336.0;
const E6: f64 = 1.0 / 4.0;

/// One Cash-Karp step of size `h` from `(t, y)`.
///
/// Returns the fifth-order solution and the per-component error estimate.
fn rk_step<const N: usize, F>(f: &F, t: f64, y: &[f64; N], h: f64) -> ([f64; N], [f64; N])
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    let mut stage = [0.0; N];

    let k1 = f(t, y);
    for i in 0..N {
        stage[i] = y[i] + h * A21 * k1[i];
    }
    let k2 = f(t + C2 * h, &stage);
    for i in 0..N {
        stage[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
    }
    let k3 = f(t + C3 * h, &stage);
    for i in 0..N {
        stage[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
    }
    let k4 = f(t + C4 * h, &stage);
    for i in 0..N {
        stage[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
    }
    let k5 = f(t + C5 * h, &stage);
    for i in 0..N {
        stage[i] =
            y[i] + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
    }
    let k6 = f(t + C6 * h, &stage);

    let mut y_next = [0.0; N];
    let mut err = [0.0; N];
    for i in 0..N {
        y_next[i] = y[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B6 * k6[i]);
        let y_low =
            y[i] + h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]);
        err[i] = y_next[i] - y_low;
    }
    (y_next, err)
}

fn error_norm<const N: usize>(
    err: &[f64; N],
    y: &[f64; N],
    y_next: &[f64; N],
    tol: Tolerances,
) -> f64 {
    let mut sum = 0.0;
    for i in 0..N {
        let scale = tol.atol + tol.rtol * y[i].abs().max(y_next[i].abs());
        let ratio = err[i] / scale;
        sum += ratio * ratio;
    }
    (sum / N as f64).sqrt()
}

fn step_factor(err_norm: f64) -> f64 {
    if err_norm == 0.0 {
        FACTOR_MAX
    } else if err_norm.is_finite() {
        (SAFETY * err_norm.powf(-0.2)).clamp(FACTOR_MIN, FACTOR_MAX)
    } else {
        FACTOR_MIN
    }
}

/// Integrate `dy/dt = f(t, y)` from `t = 0` to `t_end`, recording every
/// accepted step.
///
/// # Errors
/// Fails if the controller drives the step size below the resolvable
/// minimum (the solution cannot be integrated to `t_end` at the requested
/// tolerances).
pub fn integrate<const N: usize, F>(
    f: F,
    y0: [f64; N],
    t_end: f64,
    tol: Tolerances,
) -> Result<Solution<N>>
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    let mut t = 0.0;
    let mut y = y0;
    let mut h = initial_step(t_end);
    let min_step = min_step(t_end);

    let mut solution = Solution {
        times: vec![t],
        states: vec![y],
    };

    while t < t_end {
        if h < min_step {
            bail!("step size underflow at t = {t}");
        }

        let h_step = h.min(t_end - t);
        let (y_next, err) = rk_step(&f, t, &y, h_step);
        let err_norm = error_norm(&err, &y, &y_next, tol);

        if err_norm <= 1.0 {
            t += h_step;
            y = y_next;
            solution.times.push(t);
            solution.states.push(y);
            // Keep the nominal step when the horizon, not the error
            // controller, shortened this one.
            if h_step >= h {
                h = h_step * step_factor(err_norm);
            }
        } else {
            h = h_step * step_factor(err_norm);
        }
    }

    Ok(solution)
}

/// Integrate `dy/dt = f(t, y)` recording the state exactly at each time in
/// `t_eval` (strictly increasing, starting at 0).
///
/// Steps adaptively between output times, capping each step so the solver
/// lands on the requested samples without interpolation.
pub fn integrate_at<const N: usize, F>(
    f: F,
    y0: [f64; N],
    t_eval: &[f64],
    tol: Tolerances,
) -> Result<Solution<N>>
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    let t_end = t_eval.last().copied().unwrap_or(0.0);
    let mut t = 0.0;
    let mut y = y0;
    let mut h = initial_step(t_end);
    let min_step = min_step(t_end);

    let mut solution = Solution {
        times: Vec::with_capacity(t_eval.len()),
        states: Vec::with_capacity(t_eval.len()),
    };

    for &target in t_eval {
        while t < target {
            if h < min_step {
                bail!("step size underflow at t = {t}");
            }

            let h_step = h.min(target - t);
            let (y_next, err) = rk_step(&f, t, &y, h_step);
            let err_norm = error_norm(&err, &y, &y_next, tol);

            if err_norm <= 1.0 {
                t += h_step;
                y = y_next;
                // Keep the nominal step when the output grid, not the error
                // controller, shortened this one.
                if h_step >= h {
                    h = h_step * step_factor(err_norm);
                }
            } else {
                h = h_step * step_factor(err_norm);
            }
        }
        solution.times.push(target);
        solution.states.push(y);
    }

    Ok(solution)
}

fn initial_step(t_end: f64) -> f64 {
    (t_end / 100.0).max(f64::MIN_POSITIVE)
}

fn min_step(t_end: f64) -> f64 {
    1e-12 * t_end.max(1.0)
}
