//! Bettor Edge Library
//!
//! Turns a bettor's historical ROI into a shrunken win-probability estimate,
//! an expected ROI at a new price, and a fractional-Kelly stake.

pub mod batch;
pub mod config;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod pricing;
pub mod types;

pub use error::{EvalError, EvalResult};
pub use persistence::{BettorDataset, RecordLookup};
pub use pipeline::{CombinedReport, EvaluationReport, Evaluator, SourceInput};
pub use types::{AmericanOdds, Agreement, BettorRecord, ProbabilityEstimate, RecordKey, Warning};
