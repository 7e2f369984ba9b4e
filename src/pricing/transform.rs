use super::odds::payout;
use crate::types::AmericanOdds;

/// Win probability consistent with earning `roi` (decimal) per unit at `odds`.
///
/// Solves `p*b - (1 - p) = roi`. Not clamped: a result outside (0, 1) means
/// the ROI is implausible at that price and the caller should flag it.
pub fn implied_probability(odds: AmericanOdds, roi: f64) -> f64 {
    let b = payout(odds);
    (roi + 1.0) / (b + 1.0)
}

/// Expected ROI in percent for a bet at `odds` that wins with `true_prob`
pub fn expected_roi(odds: AmericanOdds, true_prob: f64) -> f64 {
    let b = payout(odds);
    let ev = true_prob * b - (1.0 - true_prob);
    ev * 100.0
}

/// ROI earned at `original_odds`, repriced to `new_odds` (percent)
pub fn reprice_roi(original_odds: AmericanOdds, new_odds: AmericanOdds, roi: f64) -> f64 {
    expected_roi(new_odds, implied_probability(original_odds, roi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn odds(v: f64) -> AmericanOdds {
        AmericanOdds::new(v).unwrap()
    }

    #[test]
    fn even_money_ten_percent_roi() {
        let p = implied_probability(odds(-100.0), 0.10);
        assert!((p - 0.55).abs() < 1e-12);

        let ev = expected_roi(odds(-105.0), p);
        assert!((ev - 7.38).abs() < 0.01, "ev = {}", ev);
        assert!((reprice_roi(odds(-100.0), odds(-105.0), 0.10) - ev).abs() < 1e-12);
    }

    #[test]
    fn extreme_roi_leaves_unit_interval() {
        // +300% ROI at even money would need p = 2.0
        let p = implied_probability(odds(-100.0), 3.0);
        assert!(p > 1.0);
    }

    #[test]
    fn round_trip_recovers_roi() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut checked = 0;
        while checked < 500 {
            let magnitude: f64 = rng.gen_range(100.0..1000.0);
            let raw = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
            let roi: f64 = rng.gen_range(-0.99..2.0);
            let o = odds(raw);
            let p = implied_probability(o, roi);
            if p <= 0.0 || p >= 1.0 {
                continue;
            }
            let back = expected_roi(o, p);
            assert!((back - roi * 100.0).abs() < 1e-9, "odds {} roi {}", raw, roi);
            checked += 1;
        }
    }

    #[test]
    fn breakeven_probability_has_zero_ev() {
        let o = odds(-110.0);
        let p = super::super::odds::breakeven_probability(o);
        assert!(expected_roi(o, p).abs() < 1e-9);
    }
}
