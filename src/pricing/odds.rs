use crate::error::EvalResult;
use crate::types::AmericanOdds;

/// Net profit per unit staked on a win.
///
/// +150 -> 1.5, -200 -> 0.5, +100/-100 -> 1.0
pub fn payout(odds: AmericanOdds) -> f64 {
    let raw = odds.value();
    if raw > 0.0 {
        raw / 100.0
    } else {
        100.0 / raw.abs()
    }
}

/// `payout` for an unvalidated value
pub fn payout_from_raw(odds: f64) -> EvalResult<f64> {
    Ok(payout(AmericanOdds::new(odds)?))
}

/// Win probability at which a bet at `odds` has zero expected value
pub fn breakeven_probability(odds: AmericanOdds) -> f64 {
    1.0 / (payout(odds) + 1.0)
}
