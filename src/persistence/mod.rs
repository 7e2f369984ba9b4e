//! CSV Persistence Module
//!
//! Read-only bettor dataset snapshot and CSV output of batch reports

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{EvalError, EvalResult};
use crate::pipeline::EvaluationReport;
use crate::types::{BettorRecord, RecordKey};

/// Source of historical records, keyed by (bettor, bet type)
pub trait RecordLookup {
    fn lookup(&self, bettor: &str, bet_type: &str) -> EvalResult<BettorRecord>;
}

/// Dataset row as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(alias = "Bettor")]
    pub bettor: String,
    #[serde(alias = "Bet Type")]
    pub bet_type: String,
    #[serde(alias = "ROI (%)", alias = "ROI")]
    pub roi_pct: f64,
    #[serde(alias = "Sample Size")]
    pub sample_size: u64,
    #[serde(alias = "Avg Bet Size", alias = "Avg Bet Size (units)")]
    pub avg_bet_size: f64,
}

impl DatasetRow {
    fn into_record(self, line: usize) -> Result<BettorRecord> {
        if self.sample_size == 0 {
            bail!(
                "row {}: sample_size must be at least 1 for {}/{}",
                line,
                self.bettor,
                self.bet_type
            );
        }
        if !self.roi_pct.is_finite() || !self.avg_bet_size.is_finite() {
            bail!(
                "row {}: non-finite ROI or bet size for {}/{}",
                line,
                self.bettor,
                self.bet_type
            );
        }
        Ok(BettorRecord::new(
            RecordKey::new(self.bettor.trim(), self.bet_type.trim()),
            self.roi_pct,
            self.sample_size,
            self.avg_bet_size,
        ))
    }
}

/// Immutable in-memory snapshot of the bettor dataset
#[derive(Debug, Clone, Default)]
pub struct BettorDataset {
    records: BTreeMap<RecordKey, BettorRecord>,
}

impl BettorDataset {
    pub fn from_records(records: impl IntoIterator<Item = BettorRecord>) -> Self {
        let mut map = BTreeMap::new();
        for record in records {
            if let Some(prev) = map.insert(record.key.clone(), record) {
                warn!("Duplicate dataset key {}, keeping the later row", prev.key);
            }
        }
        Self { records: map }
    }

    /// Load the dataset from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        let dataset = Self::from_reader(file)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        info!(
            "Loaded {} bettor records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, result) in reader.deserialize().enumerate() {
            // header is line 1
            let line = i + 2;
            let row: DatasetRow =
                result.with_context(|| format!("Failed to deserialize dataset row {}", line))?;
            records.push(row.into_record(line)?);
        }

        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&BettorRecord> {
        self.records.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &BettorRecord> {
        self.records.values()
    }

    /// Distinct bettors, sorted
    pub fn bettors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.records.keys().map(|k| k.bettor.as_str()).collect();
        out.dedup();
        out
    }

    /// Bet types recorded for one bettor, sorted
    pub fn bet_types(&self, bettor: &str) -> Vec<&str> {
        self.records
            .keys()
            .filter(|k| k.bettor == bettor)
            .map(|k| k.bet_type.as_str())
            .collect()
    }
}

impl RecordLookup for BettorDataset {
    fn lookup(&self, bettor: &str, bet_type: &str) -> EvalResult<BettorRecord> {
        self.records
            .get(&RecordKey::new(bettor, bet_type))
            .cloned()
            .ok_or_else(|| EvalError::MissingRecord {
                bettor: bettor.to_string(),
                bet_type: bet_type.to_string(),
            })
    }
}

/// Flattened evaluation for CSV output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub timestamp: i64,
    pub bettor: String,
    pub bet_type: String,
    pub original_odds: f64,
    pub new_odds: f64,
    pub observed_roi_pct: f64,
    pub sample_size: u64,
    pub adjusted_roi_pct: f64,
    pub adjusted_moe_pct: f64,
    pub probability: f64,
    pub probability_lower: f64,
    pub probability_upper: f64,
    pub expected_roi_pct: f64,
    pub expected_roi_moe_pct: f64,
    pub kelly_fraction: Option<f64>,
    pub recommended_units: Option<f64>,
    pub reliable: bool,
    pub error: Option<String>,
}

impl ReportRecord {
    pub fn from_report(report: &EvaluationReport, timestamp: i64) -> Self {
        Self {
            timestamp,
            bettor: report.key.bettor.clone(),
            bet_type: report.key.bet_type.clone(),
            original_odds: report.original_odds.value(),
            new_odds: report.new_odds.value(),
            observed_roi_pct: report.observed_roi * 100.0,
            sample_size: report.sample_size,
            adjusted_roi_pct: report.shrinkage.adjusted_roi * 100.0,
            adjusted_moe_pct: report.shrinkage.adjusted_margin_of_error * 100.0,
            probability: report.probability.value,
            probability_lower: report.interval.probability_lower,
            probability_upper: report.interval.probability_upper,
            expected_roi_pct: report.expected_roi,
            expected_roi_moe_pct: report.interval.expected_roi_margin_of_error,
            kelly_fraction: report.stake.map(|s| s.kelly_fraction),
            recommended_units: report.stake.map(|s| s.recommended_units),
            reliable: report.reliable(),
            error: None,
        }
    }

    /// Row for a request that produced no report
    pub fn failed(
        key: &RecordKey,
        original_odds: f64,
        new_odds: f64,
        error: &EvalError,
        timestamp: i64,
    ) -> Self {
        Self {
            timestamp,
            bettor: key.bettor.clone(),
            bet_type: key.bet_type.clone(),
            original_odds,
            new_odds,
            observed_roi_pct: f64::NAN,
            sample_size: 0,
            adjusted_roi_pct: f64::NAN,
            adjusted_moe_pct: f64::NAN,
            probability: f64::NAN,
            probability_lower: f64::NAN,
            probability_upper: f64::NAN,
            expected_roi_pct: f64::NAN,
            expected_roi_moe_pct: f64::NAN,
            kelly_fraction: None,
            recommended_units: None,
            reliable: false,
            error: Some(error.to_string()),
        }
    }
}

/// Writes report rows as CSV
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl ReportWriter<std::fs::File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: WriterBuilder::new().has_headers(true).from_writer(inner),
        }
    }

    pub fn write(&mut self, record: &ReportRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .context("Failed to write report record")
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().context("Failed to flush report")?;
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish report: {}", e.error()))
    }
}
