//! Fractional Kelly stake sizing
//!
//! ```text
//! f* = (b*p - q) / b
//! ```
//!
//! clamped at zero (no short stakes), capped, then multiplied by the
//! risk-reduction fraction and scaled to units.

use serde::{Deserialize, Serialize};

use super::odds::payout;
use crate::config::KellyConfig;
use crate::error::{EvalError, EvalResult};
use crate::types::AmericanOdds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeRecommendation {
    pub b: f64,
    /// Full Kelly fraction, >= 0, before the cap
    pub kelly_fraction: f64,
    /// Fraction after `max_fraction` and the risk-reduction multiplier
    pub stake_fraction: f64,
    /// `stake_fraction * units_scale`
    pub recommended_units: f64,
}

/// Full Kelly fraction at `odds`, never negative
pub fn kelly_fraction(odds: AmericanOdds, win_probability: f64) -> EvalResult<f64> {
    if !(0.0..=1.0).contains(&win_probability) {
        return Err(EvalError::InvalidProbability {
            probability: win_probability,
        });
    }

    let b = payout(odds);
    let q = 1.0 - win_probability;
    let kelly = (b * win_probability - q) / b;
    Ok(kelly.max(0.0))
}

pub fn recommend_stake(
    odds: AmericanOdds,
    win_probability: f64,
    config: &KellyConfig,
) -> EvalResult<StakeRecommendation> {
    let f_raw = kelly_fraction(odds, win_probability)?;
    let f_capped = f_raw.min(config.max_fraction.max(0.0));
    let stake_fraction = f_capped * config.fraction.max(0.0);

    Ok(StakeRecommendation {
        b: payout(odds),
        kelly_fraction: f_raw,
        stake_fraction,
        recommended_units: stake_fraction * config.units_scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::odds::breakeven_probability;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn odds(v: f64) -> AmericanOdds {
        AmericanOdds::new(v).unwrap()
    }

    #[test]
    fn half_kelly_at_minus_105() {
        let q = recommend_stake(odds(-105.0), 0.55, &KellyConfig::default()).unwrap();
        assert!((q.b - 0.9524).abs() < 1e-4);
        assert!((q.kelly_fraction - 0.0775).abs() < 1e-4);
        assert!((q.recommended_units - 3.87).abs() < 0.01);
    }

    #[test]
    fn kelly_zero_when_negative_edge() {
        let f = kelly_fraction(odds(-110.0), 0.45).unwrap();
        assert_eq!(f, 0.0);
    }

    #[test]
    fn kelly_zero_at_breakeven() {
        for raw in [-250.0, -110.0, 100.0, 175.0, 400.0] {
            let o = odds(raw);
            let f = kelly_fraction(o, breakeven_probability(o)).unwrap();
            assert!(f.abs() < 1e-12, "odds {}", raw);
        }
    }

    #[test]
    fn kelly_never_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let magnitude: f64 = rng.gen_range(100.0..2000.0);
            let raw = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
            let p: f64 = rng.gen_range(0.0..1.0);
            assert!(kelly_fraction(odds(raw), p).unwrap() >= 0.0);
        }
    }

    #[test]
    fn certain_outcomes_are_well_defined() {
        assert_eq!(kelly_fraction(odds(150.0), 0.0).unwrap(), 0.0);
        assert!((kelly_fraction(odds(150.0), 1.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_probability_rejected() {
        assert!(kelly_fraction(odds(150.0), 1.2).is_err());
        assert!(kelly_fraction(odds(150.0), f64::NAN).is_err());
    }

    #[test]
    fn cap_applies_before_fraction() {
        let config = KellyConfig {
            fraction: 0.5,
            units_scale: 100.0,
            max_fraction: 0.05,
        };
        let q = recommend_stake(odds(-105.0), 0.55, &config).unwrap();
        assert!(q.kelly_fraction > 0.05);
        assert!((q.stake_fraction - 0.025).abs() < 1e-12);
        assert!((q.recommended_units - 2.5).abs() < 1e-9);
    }
}
