//! Signal combination
//!
//! Two unrelated strategies live here and are kept apart:
//! - probability blending: weight-normalised average of per-source implied
//!   probabilities, plus an agreement classifier
//! - correlation discount: coarse merge of two unit stakes
//!
//! Bet-size deviation ("signal strength") is a heuristic multiplier on an
//! already computed EV and stake. It is not a probability update and is
//! unbounded above.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EvalError, EvalResult};
use crate::types::Agreement;

/// How each source's combination weight is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStrategy {
    /// Actual bet size / average bet size
    BetSizeRatio,
    /// Number of settled bets
    SampleSize,
    /// Sample size scaled by the bet-size ratio
    SampleSizeTimesBetSizeRatio,
}

impl fmt::Display for WeightStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightStrategy::BetSizeRatio => write!(f, "bet_size_ratio"),
            WeightStrategy::SampleSize => write!(f, "sample_size"),
            WeightStrategy::SampleSizeTimesBetSizeRatio => {
                write!(f, "sample_size_times_bet_size_ratio")
            }
        }
    }
}

/// What to do with a stake when sources disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// No stake on conflict
    Suppress,
    /// Multiply the stake by the configured damping factor
    Damp,
    /// Ignore the agreement flag
    Proceed,
}

impl ConflictPolicy {
    /// Stake multiplier for a given agreement, `None` when suppressed
    pub fn stake_multiplier(&self, agreement: Agreement, damping: f64) -> Option<f64> {
        match (agreement, self) {
            (Agreement::Agree, _) | (Agreement::Conflict, ConflictPolicy::Proceed) => Some(1.0),
            (Agreement::Conflict, ConflictPolicy::Damp) => Some(damping),
            (Agreement::Conflict, ConflictPolicy::Suppress) => None,
        }
    }
}

/// `actual / average`; `None` when the average is not a usable denominator
pub fn signal_strength(actual_bet_size: f64, avg_bet_size: f64) -> EvalResult<Option<f64>> {
    if !(actual_bet_size > 0.0) || !actual_bet_size.is_finite() {
        return Err(EvalError::InvalidBetSize {
            bet_size: actual_bet_size,
        });
    }
    if !(avg_bet_size > 0.0) || !avg_bet_size.is_finite() {
        return Ok(None);
    }
    Ok(Some(actual_bet_size / avg_bet_size))
}

/// Bet-size-deviation weighting of a single bettor's output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetSizeSignal {
    pub actual_bet_size: f64,
    pub signal_strength: f64,
    /// Expected ROI (percent) times signal strength
    pub weighted_expected_roi: f64,
    /// Risk-reduced Kelly fraction times signal strength
    pub signal_weighted_stake: Option<f64>,
    pub signal_weighted_units: Option<f64>,
}

/// `stake_fraction` is `None` when no stake could be sized
pub fn apply_bet_size_signal(
    actual_bet_size: f64,
    signal_strength: f64,
    expected_roi: f64,
    stake_fraction: Option<f64>,
    units_scale: f64,
) -> BetSizeSignal {
    let signal_weighted_stake = stake_fraction.map(|f| f * signal_strength);
    BetSizeSignal {
        actual_bet_size,
        signal_strength,
        weighted_expected_roi: expected_roi * signal_strength,
        signal_weighted_stake,
        signal_weighted_units: signal_weighted_stake.map(|f| f * units_scale),
    }
}

/// One independent estimate to blend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSource {
    pub label: String,
    pub probability: f64,
    pub sample_size: u64,
    /// Bet-size deviation ratio; treated as 1.0 (no deviation) when absent
    pub bet_size_ratio: Option<f64>,
}

impl SignalSource {
    /// Raw (unnormalized) weight under `strategy`.
    ///
    /// A source without a bet-size ratio (no actual bet size given, or an
    /// average bet size of zero) weighs in as if it bet its average size.
    /// Callers that hit the zero-average case record a
    /// `Warning::UndefinedSignalStrength` so the blend is marked unreliable.
    pub fn weight(&self, strategy: WeightStrategy) -> f64 {
        let ratio = self.bet_size_ratio.unwrap_or(1.0);
        match strategy {
            WeightStrategy::BetSizeRatio => ratio,
            WeightStrategy::SampleSize => self.sample_size as f64,
            WeightStrategy::SampleSizeTimesBetSizeRatio => self.sample_size as f64 * ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSource {
    pub label: String,
    pub probability: f64,
    pub weight: f64,
    pub normalized_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub probability: f64,
    pub agreement: Agreement,
    pub strategy: WeightStrategy,
    pub sources: Vec<WeightedSource>,
}

/// `Σ(pᵢ·wᵢ) / Σwᵢ`
pub fn combine_probabilities(
    sources: &[SignalSource],
    strategy: WeightStrategy,
) -> EvalResult<Combination> {
    if sources.is_empty() {
        return Err(EvalError::NoSources);
    }

    let weights: Vec<f64> = sources.iter().map(|s| s.weight(strategy)).collect();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EvalError::ZeroTotalWeight);
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(EvalError::ZeroTotalWeight);
    }

    let probability = sources
        .iter()
        .zip(&weights)
        .map(|(s, w)| s.probability * w)
        .sum::<f64>()
        / total;

    let probabilities: Vec<f64> = sources.iter().map(|s| s.probability).collect();

    Ok(Combination {
        probability,
        agreement: classify_agreement(&probabilities),
        strategy,
        sources: sources
            .iter()
            .zip(weights)
            .map(|(s, w)| WeightedSource {
                label: s.label.clone(),
                probability: s.probability,
                weight: w,
                normalized_weight: w / total,
            })
            .collect(),
    })
}

/// `Agree` when every probability is on the same side of 0.5.
///
/// Exactly 0.5 is its own side, so it only agrees with other 0.5 values.
pub fn classify_agreement(probabilities: &[f64]) -> Agreement {
    let side = |p: f64| p.partial_cmp(&0.5);
    let mut sides = probabilities.iter().map(|p| side(*p));
    match sides.next() {
        None => Agreement::Agree,
        Some(first) => {
            if first.is_some() && sides.all(|s| s == first) {
                Agreement::Agree
            } else {
                Agreement::Conflict
            }
        }
    }
}

/// `units1 + units2 − ρ·min(units1, units2)`; stakes must be finite and non-negative
pub fn discount_correlated_units(units1: f64, units2: f64, rho: f64) -> EvalResult<f64> {
    if !(0.0..=1.0).contains(&rho) {
        return Err(EvalError::InvalidCorrelation { rho });
    }
    for (name, value) in [("units1", units1), ("units2", units2)] {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(EvalError::InvalidParameter { name, value });
        }
    }
    Ok(units1 + units2 - rho * units1.min(units2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(label: &str, probability: f64, sample_size: u64, ratio: Option<f64>) -> SignalSource {
        SignalSource {
            label: label.to_string(),
            probability,
            sample_size,
            bet_size_ratio: ratio,
        }
    }

    #[test]
    fn signal_strength_ratio() {
        assert_eq!(signal_strength(3.0, 1.5).unwrap(), Some(2.0));
        assert_eq!(signal_strength(3.0, 0.0).unwrap(), None);
        assert!(signal_strength(0.0, 1.0).is_err());
        assert!(signal_strength(-1.0, 1.0).is_err());
    }

    #[test]
    fn bet_size_signal_scales_ev_and_stake() {
        let sig = apply_bet_size_signal(4.0, 2.0, 7.38, Some(0.03875), 100.0);
        assert!((sig.weighted_expected_roi - 14.76).abs() < 1e-9);
        assert!((sig.signal_weighted_stake.unwrap() - 0.0775).abs() < 1e-12);
        assert!((sig.signal_weighted_units.unwrap() - 7.75).abs() < 1e-9);

        let no_stake = apply_bet_size_signal(4.0, 2.0, 7.38, None, 100.0);
        assert_eq!(no_stake.signal_weighted_units, None);
    }

    #[test]
    fn sample_size_weighted_average() {
        let sources = vec![
            source("a", 0.60, 300, None),
            source("b", 0.52, 100, None),
        ];
        let c = combine_probabilities(&sources, WeightStrategy::SampleSize).unwrap();
        assert!((c.probability - 0.58).abs() < 1e-12);
        assert_eq!(c.agreement, Agreement::Agree);
        assert!((c.sources[0].normalized_weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn strategies_give_different_weights() {
        let sources = vec![
            source("a", 0.60, 100, Some(0.5)),
            source("b", 0.40, 100, Some(1.5)),
        ];
        let by_n = combine_probabilities(&sources, WeightStrategy::SampleSize).unwrap();
        let by_ratio = combine_probabilities(&sources, WeightStrategy::BetSizeRatio).unwrap();
        let by_product =
            combine_probabilities(&sources, WeightStrategy::SampleSizeTimesBetSizeRatio).unwrap();

        assert!((by_n.probability - 0.50).abs() < 1e-12);
        assert!((by_ratio.probability - 0.45).abs() < 1e-12);
        assert!((by_product.probability - 0.45).abs() < 1e-12);
        assert_eq!(by_n.agreement, Agreement::Conflict);
    }

    #[test]
    fn combination_errors() {
        assert_eq!(
            combine_probabilities(&[], WeightStrategy::SampleSize),
            Err(EvalError::NoSources)
        );
        let zero = vec![source("a", 0.6, 10, Some(0.0))];
        assert_eq!(
            combine_probabilities(&zero, WeightStrategy::BetSizeRatio),
            Err(EvalError::ZeroTotalWeight)
        );
    }

    #[test]
    fn agreement_classifier() {
        assert_eq!(classify_agreement(&[0.55, 0.70]), Agreement::Agree);
        assert_eq!(classify_agreement(&[0.45, 0.30]), Agreement::Agree);
        assert_eq!(classify_agreement(&[0.55, 0.45]), Agreement::Conflict);
        assert_eq!(classify_agreement(&[0.55, 0.50]), Agreement::Conflict);
        assert_eq!(classify_agreement(&[0.55]), Agreement::Agree);
        assert_eq!(classify_agreement(&[0.55, f64::NAN]), Agreement::Conflict);
    }

    #[test]
    fn correlation_discount_boundaries() {
        assert_eq!(discount_correlated_units(3.0, 2.0, 0.0).unwrap(), 5.0);
        assert_eq!(discount_correlated_units(3.0, 2.0, 1.0).unwrap(), 3.0);
        assert!((discount_correlated_units(3.0, 2.0, 0.5).unwrap() - 4.0).abs() < 1e-12);
        assert!(discount_correlated_units(3.0, 2.0, 1.1).is_err());
        assert_eq!(discount_correlated_units(0.0, 2.0, 0.5).unwrap(), 2.0);
    }

    #[test]
    fn correlation_discount_rejects_invalid_stakes() {
        assert!(matches!(
            discount_correlated_units(f64::NAN, 2.0, 0.5),
            Err(EvalError::InvalidParameter { name: "units1", .. })
        ));
        assert_eq!(
            discount_correlated_units(3.0, -1.0, 0.5).unwrap_err(),
            EvalError::InvalidParameter {
                name: "units2",
                value: -1.0
            }
        );
        assert!(discount_correlated_units(f64::INFINITY, 1.0, 0.0).is_err());
    }

    #[test]
    fn conflict_policy_multipliers() {
        assert_eq!(
            ConflictPolicy::Suppress.stake_multiplier(Agreement::Conflict, 0.5),
            None
        );
        assert_eq!(
            ConflictPolicy::Damp.stake_multiplier(Agreement::Conflict, 0.5),
            Some(0.5)
        );
        assert_eq!(
            ConflictPolicy::Suppress.stake_multiplier(Agreement::Agree, 0.5),
            Some(1.0)
        );
        assert_eq!(
            ConflictPolicy::Proceed.stake_multiplier(Agreement::Conflict, 0.5),
            Some(1.0)
        );
    }
}
