//! Bayesian shrinkage of observed ROI toward a prior
//!
//! The sample size acts as precision: the weight on the observed ROI is
//! `n / (n + prior_weight)`, and the same weight scales the nominal margin
//! of error so point estimate and uncertainty contract together.

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::error::{EvalError, EvalResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShrinkageResult {
    pub adjusted_roi: f64,
    pub adjusted_margin_of_error: f64,
    /// Weight on the observed ROI, in [0, 1)
    pub shrink_weight: f64,
    /// Margin of error before shrinkage
    pub raw_margin_of_error: f64,
}

impl ShrinkageResult {
    /// (lower, upper) ROI confidence bounds
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.adjusted_roi - self.adjusted_margin_of_error,
            self.adjusted_roi + self.adjusted_margin_of_error,
        )
    }
}

/// `n / (n + pseudo_count)`
pub fn shrink_weight(sample_size: u64, pseudo_count: f64) -> f64 {
    let n = sample_size as f64;
    n / (n + pseudo_count)
}

/// Shrink a decimal ROI observed over `sample_size` bets
pub fn shrink(roi: f64, sample_size: u64, params: &EstimatorConfig) -> EvalResult<ShrinkageResult> {
    if sample_size == 0 {
        return Err(EvalError::InvalidSampleSize { sample_size });
    }
    for (name, value) in [
        ("prior_weight", params.prior_weight),
        ("z_score", params.z_score),
        ("assumed_std_dev", params.assumed_std_dev),
    ] {
        if !(value > 0.0) || !value.is_finite() {
            return Err(EvalError::InvalidParameter { name, value });
        }
    }
    if !params.prior_mean.is_finite() {
        return Err(EvalError::InvalidParameter {
            name: "prior_mean",
            value: params.prior_mean,
        });
    }

    let raw_moe = params.z_score * (params.assumed_std_dev / (sample_size as f64).sqrt());
    let weight = shrink_weight(sample_size, params.prior_weight);

    Ok(ShrinkageResult {
        adjusted_roi: weight * roi + (1.0 - weight) * params.prior_mean,
        adjusted_margin_of_error: weight * raw_moe,
        shrink_weight: weight,
        raw_margin_of_error: raw_moe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(prior_weight: f64) -> EstimatorConfig {
        EstimatorConfig {
            prior_weight,
            ..Default::default()
        }
    }

    #[test]
    fn non_positive_spread_parameters_rejected() {
        let bad_sd = EstimatorConfig {
            assumed_std_dev: -1.0,
            ..Default::default()
        };
        assert_eq!(
            shrink(0.10, 50, &bad_sd).unwrap_err(),
            EvalError::InvalidParameter {
                name: "assumed_std_dev",
                value: -1.0
            }
        );

        let zero_z = EstimatorConfig {
            z_score: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            shrink(0.10, 50, &zero_z),
            Err(EvalError::InvalidParameter { name: "z_score", .. })
        ));

        let nan_sd = EstimatorConfig {
            assumed_std_dev: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            shrink(0.10, 50, &nan_sd),
            Err(EvalError::InvalidParameter { name: "assumed_std_dev", .. })
        ));
    }

    #[test]
    fn fifty_bets_against_hundred_pseudo_count() {
        let r = shrink(0.10, 50, &params(100.0)).unwrap();
        assert!((r.shrink_weight - 1.0 / 3.0).abs() < 1e-12);
        assert!((r.adjusted_roi - 0.0333).abs() < 1e-4);

        let raw = 1.96 / 50f64.sqrt();
        assert!((r.raw_margin_of_error - raw).abs() < 1e-12);
        assert!((r.adjusted_margin_of_error - raw / 3.0).abs() < 1e-12);

        let (lo, hi) = r.bounds();
        assert!((hi - lo - 2.0 * r.adjusted_margin_of_error).abs() < 1e-12);
    }

    #[test]
    fn zero_sample_size_rejected() {
        assert_eq!(
            shrink(0.10, 0, &params(100.0)),
            Err(EvalError::InvalidSampleSize { sample_size: 0 })
        );
    }

    #[test]
    fn distance_from_prior_grows_with_sample_size() {
        let p = EstimatorConfig {
            prior_mean: 0.02,
            ..params(30.0)
        };
        let mut last = 0.0;
        for n in [1u64, 2, 5, 10, 50, 100, 1_000, 100_000] {
            let d = (shrink(-0.08, n, &p).unwrap().adjusted_roi - p.prior_mean).abs();
            assert!(d >= last, "n = {}", n);
            last = d;
        }
    }

    #[test]
    fn boundaries_approach_observed_and_prior() {
        let p = params(100.0);
        let large = shrink(0.10, 100_000_000, &p).unwrap();
        assert!((large.adjusted_roi - 0.10).abs() < 1e-6);
        assert!(large.shrink_weight < 1.0);

        let tiny = shrink(0.10, 1, &params(1e9)).unwrap();
        assert!(tiny.adjusted_roi.abs() < 1e-9);
    }

    #[test]
    fn non_positive_prior_weight_rejected() {
        assert!(matches!(
            shrink(0.1, 10, &params(0.0)),
            Err(EvalError::InvalidParameter { name: "prior_weight", .. })
        ));
    }
}
