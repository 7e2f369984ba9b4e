//! Core types used throughout Bettor Edge
//!
//! Defines odds, historical bettor records, probability estimates and the
//! non-fatal warnings attached to evaluation results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EvalError, EvalResult};

/// American odds (+150 underdog, -110 favorite). Never zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AmericanOdds(f64);

impl AmericanOdds {
    /// Validate and wrap a raw odds value
    pub fn new(odds: f64) -> EvalResult<Self> {
        if odds == 0.0 || !odds.is_finite() {
            return Err(EvalError::InvalidOdds { odds });
        }
        Ok(Self(odds))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Positive odds pay more than the stake on a win
    pub fn is_underdog(&self) -> bool {
        self.0 > 0.0
    }

    pub fn is_favorite(&self) -> bool {
        self.0 < 0.0
    }
}

impl TryFrom<f64> for AmericanOdds {
    type Error = EvalError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for AmericanOdds {
    type Error = EvalError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value as f64)
    }
}

impl<'de> Deserialize<'de> for AmericanOdds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        AmericanOdds::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0.0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Dataset key: (bettor, bet type)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub bettor: String,
    pub bet_type: String,
}

impl RecordKey {
    pub fn new(bettor: impl Into<String>, bet_type: impl Into<String>) -> Self {
        Self {
            bettor: bettor.into(),
            bet_type: bet_type.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bettor, self.bet_type)
    }
}

/// Historical performance of one bettor on one bet type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettorRecord {
    pub key: RecordKey,
    /// Observed ROI as a percentage (10.0 = +10%)
    pub roi_pct: f64,
    /// Number of settled bets behind the ROI
    pub sample_size: u64,
    /// Average stake in units
    pub avg_bet_size: f64,
}

impl BettorRecord {
    pub fn new(key: RecordKey, roi_pct: f64, sample_size: u64, avg_bet_size: f64) -> Self {
        Self {
            key,
            roi_pct,
            sample_size,
            avg_bet_size,
        }
    }

    /// ROI as a decimal fraction (0.10 = +10%)
    pub fn roi(&self) -> f64 {
        self.roi_pct / 100.0
    }
}

/// Implied win probability with optional confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityEstimate {
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ProbabilityEstimate {
    pub fn point(value: f64) -> Self {
        Self {
            value,
            lower: None,
            upper: None,
        }
    }

    pub fn with_bounds(value: f64, lower: f64, upper: f64) -> Self {
        Self {
            value,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Strictly inside (0, 1)
    pub fn is_proper(&self) -> bool {
        self.value > 0.0 && self.value < 1.0
    }
}

/// Whether all sources point the same way relative to a coin flip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agreement {
    Agree,
    Conflict,
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agreement::Agree => write!(f, "Agree"),
            Agreement::Conflict => write!(f, "Conflict"),
        }
    }
}

/// Non-fatal condition that makes a result unreliable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Average bet size is zero, so bet-size deviation has no meaning
    UndefinedSignalStrength { avg_bet_size: f64 },
    /// Implied probability left (0, 1) for an extreme ROI/odds combination
    ProbabilityOutOfRange { source: String, probability: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UndefinedSignalStrength { avg_bet_size } => write!(
                f,
                "signal strength undefined (average bet size {})",
                avg_bet_size
            ),
            Warning::ProbabilityOutOfRange {
                source,
                probability,
            } => write!(
                f,
                "implied probability {:.4} for {} is outside (0, 1)",
                probability, source
            ),
        }
    }
}
