use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs::File, io::BufReader, ops::RangeBounds, path::Path};

/// Model parameters shared by both simulation engines.
///
/// Loaded from a JSON file and validated before use. The record is `Copy`;
/// sweeps derive per-cell variants with the `with_*` constructors instead of
/// mutating a shared instance. See [`Params::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Params {
    /// Intrinsic growth rate.
    pub r: f64,
    /// Segregation/fitness cost on the plasmid-free subpopulation.
    pub s: f64,
    /// Metabolic cost of plasmid carriage.
    pub c: f64,
    /// Baseline death rate.
    pub mu: f64,
    /// Plasmid loss rate.
    pub delta: f64,
    /// Horizontal transfer rate.
    pub beta: f64,
    /// Carrying capacity.
    #[serde(rename = "K")]
    pub k: f64,
}

impl Params {
    /// Load [`Params`] from a JSON parameter file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized, or if any
    /// parameter value is missing, non-finite, or out of range.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let reader = BufReader::new(file);

        let params: Params =
            serde_json::from_reader(reader).context("failed to deserialize parameters")?;

        params.validate().context("failed to validate parameters")?;

        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.r, 0.0..f64::INFINITY).context("invalid growth rate")?;
        check_num(self.s, 0.0..1.0).context("invalid segregation cost")?;
        check_num(self.c, 0.0..1.0).context("invalid plasmid cost")?;
        check_num(self.mu, 0.0..f64::INFINITY).context("invalid death rate")?;
        check_num(self.delta, 0.0..f64::INFINITY).context("invalid loss rate")?;
        check_num(self.beta, 0.0..f64::INFINITY).context("invalid transfer rate")?;
        check_num(self.k, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid carrying capacity")?;

        Ok(())
    }

    /// Derive a copy with a different segregation cost.
    pub fn with_s(self, s: f64) -> Self {
        Self { s, ..self }
    }

    /// Derive a copy with a different plasmid cost.
    pub fn with_cost(self, c: f64) -> Self {
        Self { c, ..self }
    }

    /// Derive a copy with a different transfer rate.
    pub fn with_beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }

    /// Derive a copy with a different carrying capacity.
    pub fn with_capacity(self, k: f64) -> Self {
        Self { k, ..self }
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params {
        r: 1.0,
        s: 0.0,
        c: 0.05,
        mu: 0.01,
        delta: 0.01,
        beta: 0.02,
        k: 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_params_pass_validation() {
        assert!(test_params().validate().is_ok());
    }

    #[test]
    fn json_round_trip_uses_capital_k() {
        let json = r#"{"r":1.0,"s":0.0,"c":0.05,"mu":0.01,"delta":0.01,"beta":0.02,"K":100.0}"#;
        let params: Params = serde_json::from_str(json).expect("failed to parse params");
        assert_eq!(params, test_params());

        let text = serde_json::to_string(&params).expect("failed to serialize params");
        assert!(text.contains("\"K\":"));
    }

    #[test]
    fn missing_key_is_rejected() {
        let json = r#"{"r":1.0,"s":0.0,"c":0.05,"mu":0.01,"delta":0.01,"beta":0.02}"#;
        assert!(serde_json::from_str::<Params>(json).is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(test_params().with_capacity(0.0).validate().is_err());
        assert!(test_params().with_s(1.0).validate().is_err());
        assert!(test_params().with_cost(-0.1).validate().is_err());
        assert!(test_params().with_beta(-1.0).validate().is_err());
        assert!(test_params().with_beta(f64::NAN).validate().is_err());
        assert!(test_params().with_capacity(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn override_constructors_do_not_alias() {
        let base = test_params();
        let varied = base.with_beta(0.04).with_cost(0.1);
        assert_eq!(base.beta, 0.02);
        assert_eq!(base.c, 0.05);
        assert_eq!(varied.beta, 0.04);
        assert_eq!(varied.c, 0.1);
    }
}
