//! Evaluation pipeline
//!
//! record → shrinkage → implied probability (original odds) → expected ROI
//! (new odds) → interval propagation → Kelly stake. Optional bet-size
//! weighting and multi-source blending sit between the probability and the
//! stake.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AppConfig, CombinerConfig, EstimatorConfig, KellyConfig};
use crate::error::EvalResult;
use crate::pricing::{
    apply_bet_size_signal, combine_probabilities, discount_correlated_units, expected_roi,
    implied_probability, propagate_interval, recommend_stake, shrink, signal_strength,
    BetSizeSignal, Combination, IntervalEstimate, ShrinkageResult, SignalSource,
    StakeRecommendation,
};
use crate::types::{AmericanOdds, BettorRecord, ProbabilityEstimate, RecordKey, Warning};

/// Single-bettor evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub key: RecordKey,
    pub original_odds: AmericanOdds,
    pub new_odds: AmericanOdds,
    /// Observed ROI (decimal)
    pub observed_roi: f64,
    pub sample_size: u64,
    pub shrinkage: ShrinkageResult,
    /// Implied win probability with bounds from the ROI interval
    pub probability: ProbabilityEstimate,
    /// Expected ROI at the new odds (percent)
    pub expected_roi: f64,
    pub interval: IntervalEstimate,
    /// `None` when the implied probability is outside [0, 1]
    pub stake: Option<StakeRecommendation>,
    pub bet_size_signal: Option<BetSizeSignal>,
    pub warnings: Vec<Warning>,
}

impl EvaluationReport {
    pub fn reliable(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// One bettor contributing to a multi-source evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInput {
    pub record: BettorRecord,
    /// Odds the bettor's record was earned at
    pub original_odds: AmericanOdds,
    pub actual_bet_size: Option<f64>,
}

impl SourceInput {
    pub fn new(record: BettorRecord, original_odds: AmericanOdds) -> Self {
        Self {
            record,
            original_odds,
            actual_bet_size: None,
        }
    }

    pub fn with_bet_size(mut self, actual_bet_size: f64) -> Self {
        self.actual_bet_size = Some(actual_bet_size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEstimate {
    pub key: RecordKey,
    pub original_odds: AmericanOdds,
    pub shrinkage: ShrinkageResult,
    pub probability: f64,
    /// Interval at the source's own odds, repriced to the new odds
    pub interval: IntervalEstimate,
    pub bet_size_ratio: Option<f64>,
}

/// Multi-source evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub new_odds: AmericanOdds,
    pub sources: Vec<SourceEstimate>,
    pub combination: Combination,
    /// Expected ROI at the new odds from the blended probability (percent)
    pub expected_roi: f64,
    /// Blended probability bounds, using the same normalized weights
    pub probability_lower: f64,
    pub probability_upper: f64,
    pub expected_roi_lower: f64,
    pub expected_roi_upper: f64,
    pub expected_roi_margin_of_error: f64,
    /// Multiplier applied by the conflict policy, `None` when suppressed
    pub stake_multiplier: Option<f64>,
    pub stake: Option<StakeRecommendation>,
    pub warnings: Vec<Warning>,
}

impl CombinedReport {
    pub fn reliable(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Stateless evaluator over fixed parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    estimator: EstimatorConfig,
    kelly: KellyConfig,
    combiner: CombinerConfig,
}

impl Evaluator {
    pub fn new(estimator: EstimatorConfig, kelly: KellyConfig, combiner: CombinerConfig) -> Self {
        Self {
            estimator,
            kelly,
            combiner,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.estimator, config.kelly, config.combiner)
    }

    pub fn estimator(&self) -> &EstimatorConfig {
        &self.estimator
    }

    pub fn kelly(&self) -> &KellyConfig {
        &self.kelly
    }

    pub fn combiner(&self) -> &CombinerConfig {
        &self.combiner
    }

    pub fn evaluate(
        &self,
        record: &BettorRecord,
        original_odds: AmericanOdds,
        new_odds: AmericanOdds,
    ) -> EvalResult<EvaluationReport> {
        let observed_roi = record.roi();
        let shrinkage = shrink(observed_roi, record.sample_size, &self.estimator)?;
        let p = implied_probability(original_odds, shrinkage.adjusted_roi);
        let ev = expected_roi(new_odds, p);
        let interval = propagate_interval(
            shrinkage.adjusted_roi,
            shrinkage.adjusted_margin_of_error,
            original_odds,
            new_odds,
        );

        debug!(
            key = %record.key,
            roi = observed_roi,
            adjusted_roi = shrinkage.adjusted_roi,
            weight = shrinkage.shrink_weight,
            p,
            ev,
            "evaluated record"
        );

        let mut warnings = Vec::new();
        let probability =
            ProbabilityEstimate::with_bounds(p, interval.probability_lower, interval.probability_upper);
        if !probability.is_proper() {
            warnings.push(Warning::ProbabilityOutOfRange {
                source: record.key.to_string(),
                probability: p,
            });
        }

        let stake = if (0.0..=1.0).contains(&p) {
            Some(recommend_stake(new_odds, p, &self.kelly)?)
        } else {
            None
        };

        let report = EvaluationReport {
            key: record.key.clone(),
            original_odds,
            new_odds,
            observed_roi,
            sample_size: record.sample_size,
            shrinkage,
            probability,
            expected_roi: ev,
            interval,
            stake,
            bet_size_signal: None,
            warnings,
        };
        log_warnings(&report.warnings);

        Ok(report)
    }

    /// `evaluate` plus bet-size deviation weighting
    pub fn evaluate_with_bet_size(
        &self,
        record: &BettorRecord,
        original_odds: AmericanOdds,
        new_odds: AmericanOdds,
        actual_bet_size: f64,
    ) -> EvalResult<EvaluationReport> {
        let mut report = self.evaluate(record, original_odds, new_odds)?;

        match signal_strength(actual_bet_size, record.avg_bet_size)? {
            Some(strength) => {
                report.bet_size_signal = Some(apply_bet_size_signal(
                    actual_bet_size,
                    strength,
                    report.expected_roi,
                    report.stake.map(|s| s.stake_fraction),
                    self.kelly.units_scale,
                ));
            }
            None => {
                let warning = Warning::UndefinedSignalStrength {
                    avg_bet_size: record.avg_bet_size,
                };
                warn!(key = %record.key, "{}", warning);
                report.warnings.push(warning);
            }
        }

        Ok(report)
    }

    pub fn evaluate_sources(
        &self,
        inputs: &[SourceInput],
        new_odds: AmericanOdds,
    ) -> EvalResult<CombinedReport> {
        let mut warnings = Vec::new();
        let mut sources = Vec::with_capacity(inputs.len());
        let mut signals = Vec::with_capacity(inputs.len());

        for input in inputs {
            let record = &input.record;
            let shrinkage = shrink(record.roi(), record.sample_size, &self.estimator)?;
            let p = implied_probability(input.original_odds, shrinkage.adjusted_roi);
            let interval = propagate_interval(
                shrinkage.adjusted_roi,
                shrinkage.adjusted_margin_of_error,
                input.original_odds,
                new_odds,
            );
            if !(p > 0.0 && p < 1.0) {
                warnings.push(Warning::ProbabilityOutOfRange {
                    source: record.key.to_string(),
                    probability: p,
                });
            }

            let bet_size_ratio = match input.actual_bet_size {
                Some(actual) => {
                    let ratio = signal_strength(actual, record.avg_bet_size)?;
                    if ratio.is_none() {
                        warnings.push(Warning::UndefinedSignalStrength {
                            avg_bet_size: record.avg_bet_size,
                        });
                    }
                    ratio
                }
                None => None,
            };

            signals.push(SignalSource {
                label: record.key.to_string(),
                probability: p,
                sample_size: record.sample_size,
                bet_size_ratio,
            });
            sources.push(SourceEstimate {
                key: record.key.clone(),
                original_odds: input.original_odds,
                shrinkage,
                probability: p,
                interval,
                bet_size_ratio,
            });
        }

        let combination = combine_probabilities(&signals, self.combiner.weight_strategy)?;
        let p = combination.probability;
        if !(p > 0.0 && p < 1.0) {
            warnings.push(Warning::ProbabilityOutOfRange {
                source: "combined".to_string(),
                probability: p,
            });
        }

        let blend = |bound: fn(&IntervalEstimate) -> f64| -> f64 {
            sources
                .iter()
                .zip(&combination.sources)
                .map(|(s, w)| bound(&s.interval) * w.normalized_weight)
                .sum()
        };
        let probability_lower = blend(|i| i.probability_lower);
        let probability_upper = blend(|i| i.probability_upper);
        let expected_roi_lower = expected_roi(new_odds, probability_lower);
        let expected_roi_upper = expected_roi(new_odds, probability_upper);

        let stake_multiplier = self
            .combiner
            .conflict_policy
            .stake_multiplier(combination.agreement, self.combiner.conflict_damping);

        let stake = match stake_multiplier {
            Some(m) if (0.0..=1.0).contains(&p) => {
                let mut stake = recommend_stake(new_odds, p, &self.kelly)?;
                stake.stake_fraction *= m;
                stake.recommended_units *= m;
                Some(stake)
            }
            _ => None,
        };

        debug!(
            sources = inputs.len(),
            p,
            agreement = %combination.agreement,
            strategy = %combination.strategy,
            "combined sources"
        );

        let report = CombinedReport {
            new_odds,
            sources,
            expected_roi: expected_roi(new_odds, p),
            probability_lower,
            probability_upper,
            expected_roi_lower,
            expected_roi_upper,
            expected_roi_margin_of_error: (expected_roi_upper - expected_roi_lower) / 2.0,
            combination,
            stake_multiplier,
            stake,
            warnings,
        };
        log_warnings(&report.warnings);

        Ok(report)
    }

    /// Correlation-discounted sum of two unit stakes
    pub fn combine_units(&self, units1: f64, units2: f64, rho: f64) -> EvalResult<f64> {
        discount_correlated_units(units1, units2, rho)
    }
}

fn log_warnings(warnings: &[Warning]) {
    for w in warnings {
        warn!("unreliable result: {}", w);
    }
}
