use serde::Serialize;

/// Streaming mean and sample standard deviation (Welford update).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn summary(&self) -> Summary {
        Summary {
            mean: self.mean,
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Mean over the replicate rows at each time index.
pub fn column_means(rows: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let mut means = vec![0.0; first.len()];
    for row in rows {
        for (mean, val) in means.iter_mut().zip(row) {
            *mean += val;
        }
    }
    for mean in &mut means {
        *mean /= rows.len() as f64;
    }
    means
}

/// Mean and standard deviation of the final sample of each replicate row.
pub fn final_column_summary(rows: &[Vec<f64>]) -> Summary {
    let mut acc = Accumulator::new();
    for row in rows {
        if let Some(&last) = row.last() {
            acc.add(last);
        }
    }
    acc.summary()
}

/// Fraction of replicate rows that end at exactly zero.
pub fn extinct_fraction(rows: &[Vec<f64>]) -> f64 {
    if rows.is_empty() {
        return f64::NAN;
    }
    let extinct = rows
        .iter()
        .filter(|row| row.last().is_some_and(|&last| last == 0.0))
        .count();
    extinct as f64 / rows.len() as f64
}

/// Largest relative change over the trailing `tail_frac` of a series.
///
/// Near zero means the series has settled onto a plateau.
pub fn relative_plateau(values: &[f64], tail_frac: f64) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let tail_len = ((n as f64 * tail_frac).ceil() as usize).clamp(1, n);
    let tail = &values[n - tail_len..];

    let Some(&last) = tail.last() else {
        return f64::NAN;
    };
    if last == 0.0 {
        return f64::NAN;
    }

    let max = tail.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = tail.iter().cloned().fold(f64::INFINITY, f64::min);
    (max - min) / last.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_matches_direct_computation() {
        let mut acc = Accumulator::new();
        for val in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(val);
        }
        let summary = acc.summary();
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_undefined_std_dev() {
        let mut acc = Accumulator::new();
        acc.add(3.0);
        let summary = acc.summary();
        assert_eq!(summary.mean, 3.0);
        assert!(summary.std_dev.is_nan());
    }

    #[test]
    fn column_means_average_rows() {
        let rows = vec![vec![1.0, 2.0, 0.0], vec![3.0, 0.0, 0.0]];
        assert_eq!(column_means(&rows), vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn final_summary_reads_last_entries() {
        let rows = vec![vec![0.0, 1.0], vec![0.0, 3.0]];
        let summary = final_column_summary(&rows);
        assert_eq!(summary.mean, 2.0);
        assert!((summary.std_dev - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn extinct_fraction_counts_zero_endings() {
        let rows = vec![vec![1.0, 0.0], vec![1.0, 0.5], vec![2.0, 0.0], vec![1.0, 1.0]];
        assert_eq!(extinct_fraction(&rows), 0.5);
    }

    #[test]
    fn plateau_measure_is_small_on_settled_series() {
        let values: Vec<f64> = (0..100).map(|i| 1.0 - (-(i as f64) / 5.0).exp()).collect();
        assert!(relative_plateau(&values, 0.1) < 1e-4);
        assert!(relative_plateau(&values, 1.0) > 0.5);
    }
}
