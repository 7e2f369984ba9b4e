//! Evaluation errors
//!
//! Every variant is fatal to the single evaluation that raised it.

use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Invalid American odds {odds}: must be a nonzero finite number")]
    InvalidOdds { odds: f64 },

    #[error("Invalid sample size {sample_size}: need at least one settled bet")]
    InvalidSampleSize { sample_size: u64 },

    #[error("No historical record for bettor '{bettor}' on bet type '{bet_type}'")]
    MissingRecord { bettor: String, bet_type: String },

    #[error("Invalid bet size {bet_size}: must be positive")]
    InvalidBetSize { bet_size: f64 },

    #[error("Invalid win probability {probability}: must lie in [0, 1]")]
    InvalidProbability { probability: f64 },

    #[error("Invalid correlation {rho}: must lie in [0, 1]")]
    InvalidCorrelation { rho: f64 },

    #[error("At least one signal source is required")]
    NoSources,

    #[error("Signal weights sum to zero")]
    ZeroTotalWeight,

    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl EvalError {
    /// Missing data is reported to the host as "no data", not as a failure
    pub fn is_missing_record(&self) -> bool {
        matches!(self, EvalError::MissingRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_value() {
        let err = EvalError::InvalidSampleSize { sample_size: 0 };
        assert!(err.to_string().contains("sample size 0"));

        let err = EvalError::MissingRecord {
            bettor: "bob".into(),
            bet_type: "totals".into(),
        };
        assert!(err.is_missing_record());
        assert!(err.to_string().contains("'bob'"));
    }
}
