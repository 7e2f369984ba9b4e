//! Confidence interval propagation
//!
//! Pushes the ROI interval through two substitutions in order: ROI bounds to
//! probability bounds at the original odds, then probability bounds to
//! expected-ROI bounds at the new odds.

use serde::{Deserialize, Serialize};

use super::transform::{expected_roi, implied_probability};
use crate::types::AmericanOdds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalEstimate {
    pub roi_lower: f64,
    pub roi_upper: f64,
    pub probability_lower: f64,
    pub probability_upper: f64,
    /// Expected ROI bounds at the new odds (percent)
    pub expected_roi_lower: f64,
    pub expected_roi_upper: f64,
    /// Half-width of the expected ROI interval (percent)
    pub expected_roi_margin_of_error: f64,
}

pub fn propagate_interval(
    adjusted_roi: f64,
    adjusted_margin_of_error: f64,
    original_odds: AmericanOdds,
    new_odds: AmericanOdds,
) -> IntervalEstimate {
    let roi_lower = adjusted_roi - adjusted_margin_of_error;
    let roi_upper = adjusted_roi + adjusted_margin_of_error;

    let probability_lower = implied_probability(original_odds, roi_lower);
    let probability_upper = implied_probability(original_odds, roi_upper);

    let expected_roi_lower = expected_roi(new_odds, probability_lower);
    let expected_roi_upper = expected_roi(new_odds, probability_upper);

    IntervalEstimate {
        roi_lower,
        roi_upper,
        probability_lower,
        probability_upper,
        expected_roi_lower,
        expected_roi_upper,
        expected_roi_margin_of_error: (expected_roi_upper - expected_roi_lower) / 2.0,
    }
}
