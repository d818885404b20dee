//! Closed-form critical transfer rates.
//!
//! Derived from the non-trivial fixed point of the mean-field model. These
//! are straight arithmetic on the parameter record; near the singular
//! denominator `1 - mu / (r (1 - s))` they legitimately return very large or
//! infinite values, which callers report as-is.

use crate::config::Params;

/// Minimum transfer rate that sustains the plasmid at non-zero frequency.
pub fn beta_crit(p: &Params) -> f64 {
    let num = p.delta + p.mu * (p.c / (1.0 - p.s));
    let denom = p.k * (1.0 - p.mu / (p.r * (1.0 - p.s)));
    num / denom
}

/// Critical transfer rate normalized by the plasmid cost.
pub fn beta_crit_per_cost(p: &Params) -> f64 {
    let viability = 1.0 - p.mu / (p.r * (1.0 - p.s));
    let loss_term = p.delta / (p.c * viability);
    let death_term = p.mu / (1.0 - p.s * viability);
    (loss_term + death_term) / p.k
}

/// Critical transfer rate normalized by the plasmid loss rate.
pub fn beta_crit_per_loss(p: &Params) -> f64 {
    let viability = 1.0 - p.mu / (p.r * (1.0 - p.s));
    let scale = 1.0 / (p.k * viability);
    scale * (1.0 + (p.mu + p.c) / (p.delta * (1.0 - p.s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_params;

    #[test]
    fn thresholds_are_deterministic() {
        let p = test_params();
        assert_eq!(beta_crit(&p).to_bits(), beta_crit(&p).to_bits());
        assert_eq!(
            beta_crit_per_cost(&p).to_bits(),
            beta_crit_per_cost(&p).to_bits()
        );
        assert_eq!(
            beta_crit_per_loss(&p).to_bits(),
            beta_crit_per_loss(&p).to_bits()
        );
    }

    #[test]
    fn beta_crit_reduces_to_loss_over_capacity() {
        // With no cost and no death the threshold is delta / K.
        let p = Params {
            r: 1.0,
            s: 0.0,
            c: 0.0,
            mu: 0.0,
            delta: 0.01,
            beta: 0.0,
            k: 100.0,
        };
        assert_eq!(beta_crit(&p), 0.01 / 100.0);
    }

    #[test]
    fn near_singular_denominator_propagates_infinity() {
        // mu = r (1 - s) makes the fixed-point denominator vanish.
        let p = Params {
            r: 1.0,
            s: 0.0,
            c: 0.05,
            mu: 1.0,
            delta: 0.01,
            beta: 0.0,
            k: 100.0,
        };
        assert!(beta_crit(&p).is_infinite());
        assert!(beta_crit_per_loss(&p).is_infinite());
    }

    #[test]
    fn thresholds_scale_inversely_with_capacity() {
        let p = test_params();
        let doubled = p.with_capacity(2.0 * p.k);
        assert!((beta_crit(&doubled) - beta_crit(&p) / 2.0).abs() < 1e-15);
    }
}
