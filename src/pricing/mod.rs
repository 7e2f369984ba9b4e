//! Pricing, estimation and stake sizing.
//!
//! Every function here is pure: no I/O, no shared state.

pub mod combiner;
pub mod interval;
pub mod kelly;
pub mod odds;
pub mod shrinkage;
pub mod transform;

pub use combiner::{
    apply_bet_size_signal, classify_agreement, combine_probabilities, discount_correlated_units,
    signal_strength, BetSizeSignal, Combination, ConflictPolicy, SignalSource, WeightStrategy,
    WeightedSource,
};
pub use interval::{propagate_interval, IntervalEstimate};
pub use kelly::{kelly_fraction, recommend_stake, StakeRecommendation};
pub use odds::{breakeven_probability, payout, payout_from_raw};
pub use shrinkage::{shrink, shrink_weight, ShrinkageResult};
pub use transform::{expected_roi, implied_probability, reprice_roi};
