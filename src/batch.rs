//! Batch evaluation
//!
//! Evaluates many requests against one shared, read-only dataset snapshot.
//! Each request runs on the blocking pool; outputs keep request order.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::EvalResult;
use crate::persistence::{RecordLookup, ReportRecord};
use crate::pipeline::{EvaluationReport, Evaluator};
use crate::types::{AmericanOdds, RecordKey};

/// One (bettor, bet type, odds) evaluation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub bettor: String,
    pub bet_type: String,
    pub original_odds: f64,
    pub new_odds: f64,
    #[serde(default)]
    pub actual_bet_size: Option<f64>,
}

impl BatchRequest {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.bettor, &self.bet_type)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub request: BatchRequest,
    pub result: EvalResult<EvaluationReport>,
}

impl BatchOutcome {
    pub fn to_record(&self, timestamp: i64) -> ReportRecord {
        match &self.result {
            Ok(report) => ReportRecord::from_report(report, timestamp),
            Err(e) => ReportRecord::failed(
                &self.request.key(),
                self.request.original_odds,
                self.request.new_odds,
                e,
                timestamp,
            ),
        }
    }
}

/// Read requests from CSV (`bettor,bet_type,original_odds,new_odds[,actual_bet_size]`)
pub fn load_requests(path: impl AsRef<Path>) -> Result<Vec<BatchRequest>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open requests {}", path.display()))?;
    read_requests(file)
}

pub fn read_requests<R: Read>(reader: R) -> Result<Vec<BatchRequest>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut requests = Vec::new();
    for result in reader.deserialize() {
        let request: BatchRequest = result.context("Failed to deserialize batch request")?;
        requests.push(request);
    }
    Ok(requests)
}

/// Evaluate a single request synchronously
pub fn evaluate_request<L: RecordLookup + ?Sized>(
    evaluator: &Evaluator,
    lookup: &L,
    request: &BatchRequest,
) -> EvalResult<EvaluationReport> {
    let record = lookup.lookup(&request.bettor, &request.bet_type)?;
    let original = AmericanOdds::new(request.original_odds)?;
    let new = AmericanOdds::new(request.new_odds)?;

    match request.actual_bet_size {
        Some(size) => evaluator.evaluate_with_bet_size(&record, original, new, size),
        None => evaluator.evaluate(&record, original, new),
    }
}

pub async fn evaluate_batch<L>(
    evaluator: Evaluator,
    lookup: Arc<L>,
    requests: Vec<BatchRequest>,
) -> Result<Vec<BatchOutcome>>
where
    L: RecordLookup + Send + Sync + 'static,
{
    let total = requests.len();
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let lookup = Arc::clone(&lookup);
            tokio::task::spawn_blocking(move || {
                let result = evaluate_request(&evaluator, &*lookup, &request);
                BatchOutcome { request, result }
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(total);
    for handle in handles {
        let outcome = handle.await.context("Batch evaluation task failed")?;
        if let Err(e) = &outcome.result {
            debug!(key = %outcome.request.key(), "request failed: {}", e);
        }
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let unreliable = outcomes
        .iter()
        .filter(|o| matches!(&o.result, Ok(r) if !r.reliable()))
        .count();
    info!(
        "Batch complete: {} requests, {} failed, {} unreliable",
        total, failed, unreliable
    );

    Ok(outcomes)
}
