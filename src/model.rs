//! Shared simulation data types.

use serde::{Deserialize, Serialize};

/// Time-ordered samples of the two subpopulations from a single run.
///
/// Times are strictly increasing and start at 0. In the ODE engine the
/// values are continuous fractions; in the SSA engine they are event-time
/// snapshots of the (scaled) integer counts. A trajectory is not mutated
/// after the run that produced it completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Sample times.
    pub times: Vec<f64>,
    /// Plasmid-free subpopulation at each sample time.
    pub f: Vec<f64>,
    /// Plasmid-bearing subpopulation at each sample time.
    pub p: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            f: Vec::with_capacity(capacity),
            p: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, t: f64, f: f64, p: f64) {
        self.times.push(t);
        self.f.push(f);
        self.p.push(p);
    }

    /// Last recorded (F, P) sample.
    pub fn final_state(&self) -> (f64, f64) {
        let f = self.f.last().copied().unwrap_or(0.0);
        let p = self.p.last().copied().unwrap_or(0.0);
        (f, p)
    }

    /// Resample both subpopulations onto `grid` by linear interpolation.
    ///
    /// Grid points before the first sample hold the first value and points
    /// past the last sample hold the last value, so terminated runs are
    /// extended flat.
    pub fn sample_onto(&self, grid: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let f = interp(grid, &self.times, &self.f);
        let p = interp(grid, &self.times, &self.p);
        (f, p)
    }
}

/// `n` evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Piecewise-linear interpolation of `(times, values)` at each grid point,
/// holding the boundary values outside the sampled range.
fn interp(grid: &[f64], times: &[f64], values: &[f64]) -> Vec<f64> {
    grid.iter()
        .map(|&t| {
            let idx = times.partition_point(|&sample| sample <= t);
            if idx == 0 {
                values[0]
            } else if idx == times.len() {
                values[times.len() - 1]
            } else {
                let (t0, t1) = (times[idx - 1], times[idx]);
                let (y0, y1) = (values[idx - 1], values[idx]);
                let dt = t1 - t0;
                if dt > 0.0 {
                    y0 + (y1 - y0) * (t - t0) / dt
                } else {
                    y1
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_trajectory() -> Trajectory {
        let mut traj = Trajectory::with_capacity(4);
        traj.push(0.0, 10.0, 2.0);
        traj.push(1.0, 8.0, 4.0);
        traj.push(2.5, 5.0, 7.0);
        traj.push(4.0, 5.0, 0.0);
        traj
    }

    #[test]
    fn linspace_is_inclusive_and_even() {
        let grid = linspace(0.0, 500.0, 500);
        assert_eq!(grid.len(), 500);
        assert_eq!(grid[0], 0.0);
        assert!((grid[499] - 500.0).abs() < 1e-12);
        let step = grid[1] - grid[0];
        for pair in grid.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-9);
        }
    }

    #[test]
    fn resampling_onto_own_times_is_identity() {
        let traj = example_trajectory();
        let (f, p) = traj.sample_onto(&traj.times);
        for (got, exp) in f.iter().zip(&traj.f) {
            assert!((got - exp).abs() < 1e-12);
        }
        for (got, exp) in p.iter().zip(&traj.p) {
            assert!((got - exp).abs() < 1e-12);
        }
    }

    #[test]
    fn resampling_interpolates_between_samples() {
        let traj = example_trajectory();
        let (f, p) = traj.sample_onto(&[0.5]);
        assert!((f[0] - 9.0).abs() < 1e-12);
        assert!((p[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn resampling_extends_flat_past_the_end() {
        let traj = example_trajectory();
        let (f, p) = traj.sample_onto(&[4.0, 10.0, 100.0]);
        assert_eq!(f, vec![5.0, 5.0, 5.0]);
        assert_eq!(p, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn final_state_matches_last_push() {
        let traj = example_trajectory();
        assert_eq!(traj.final_state(), (5.0, 0.0));
    }
}
