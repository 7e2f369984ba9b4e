//! Bettor Edge
//!
//! Command-line host over the evaluation pipeline.

use anyhow::{bail, Context, Result};
use bettor_edge::{
    batch::{evaluate_batch, load_requests},
    config::{AppConfig, LoggingConfig},
    persistence::{BettorDataset, RecordLookup, ReportWriter},
    pipeline::{CombinedReport, EvaluationReport, Evaluator, SourceInput},
    types::AmericanOdds,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bettor-edge")]
#[command(about = "Expected ROI and Kelly stake sizing from a bettor's historical ROI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra config file layered over config/default and config/local
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Dataset CSV (overrides data.dataset_path)
    #[arg(short, long, global = true, env = "BETTOR_EDGE_DATASET")]
    dataset: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List bettors and bet types in the dataset
    List,
    /// Evaluate one bettor record at a new price
    Evaluate {
        #[arg(long)]
        bettor: String,
        #[arg(long)]
        bet_type: String,
        /// Odds the record was earned at (American)
        #[arg(long, allow_negative_numbers = true)]
        original_odds: f64,
        /// Odds currently available (American)
        #[arg(long, allow_negative_numbers = true)]
        new_odds: f64,
        /// Actual bet size in units, for bet-size deviation weighting
        #[arg(long)]
        bet_size: Option<f64>,
    },
    /// Blend several bettors into one probability
    Compare {
        /// bettor:bet_type:original_odds[:bet_size], repeatable
        #[arg(long = "source", required = true, num_args = 1, allow_negative_numbers = true)]
        sources: Vec<String>,
        #[arg(long, allow_negative_numbers = true)]
        new_odds: f64,
    },
    /// Merge two unit stakes with a correlation discount
    CombineUnits {
        #[arg(long)]
        units1: f64,
        #[arg(long)]
        units2: f64,
        /// Correlation coefficient in [0, 1]
        #[arg(long, default_value = "0.0")]
        rho: f64,
    },
    /// Evaluate a CSV of requests concurrently
    Batch {
        /// bettor,bet_type,original_odds,new_odds[,actual_bet_size]
        #[arg(long)]
        requests: String,
        /// Output report CSV
        #[arg(long, default_value = "./data/report.csv")]
        out: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(path) = &cli.dataset {
        config.data.dataset_path = path.clone();
    }

    init_logging(&config.logging);
    info!("Configuration: {}", config);

    let evaluator = Evaluator::from_config(&config);

    match cli.command {
        Commands::List => list(&config),
        Commands::Evaluate {
            bettor,
            bet_type,
            original_odds,
            new_odds,
            bet_size,
        } => {
            let dataset = BettorDataset::load(&config.data.dataset_path)?;
            let record = dataset.lookup(&bettor, &bet_type)?;
            let original = AmericanOdds::new(original_odds)?;
            let new = AmericanOdds::new(new_odds)?;
            let report = match bet_size {
                Some(size) => evaluator.evaluate_with_bet_size(&record, original, new, size)?,
                None => evaluator.evaluate(&record, original, new)?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Commands::Compare { sources, new_odds } => {
            let dataset = BettorDataset::load(&config.data.dataset_path)?;
            let inputs = sources
                .iter()
                .map(|s| parse_source(&dataset, s))
                .collect::<Result<Vec<_>>>()?;
            let report = evaluator.evaluate_sources(&inputs, AmericanOdds::new(new_odds)?)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_combined(&report);
            }
            Ok(())
        }
        Commands::CombineUnits { units1, units2, rho } => {
            let units = evaluator.combine_units(units1, units2, rho)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "units1": units1, "units2": units2, "rho": rho, "combined_units": units })
                );
            } else {
                println!("Combined stake: {:.2} units (rho = {:.2})", units, rho);
            }
            Ok(())
        }
        Commands::Batch { requests, out } => {
            let dataset = Arc::new(BettorDataset::load(&config.data.dataset_path)?);
            let requests = load_requests(&requests)?;
            let outcomes = evaluate_batch(evaluator, dataset, requests).await?;

            let now = chrono::Utc::now().timestamp_millis();
            let mut writer = ReportWriter::create(&out)?;
            for outcome in &outcomes {
                writer.write(&outcome.to_record(now))?;
            }
            writer.finish()?;
            info!("Wrote {} rows to {}", outcomes.len(), out);
            Ok(())
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn list(config: &AppConfig) -> Result<()> {
    let dataset = BettorDataset::load(&config.data.dataset_path)?;
    for bettor in dataset.bettors() {
        println!("{}: {}", bettor, dataset.bet_types(bettor).join(", "));
    }
    Ok(())
}

fn parse_source(dataset: &BettorDataset, arg: &str) -> Result<SourceInput> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() < 3 || parts.len() > 4 {
        bail!(
            "source '{}' must be bettor:bet_type:original_odds[:bet_size]",
            arg
        );
    }

    let record = dataset.lookup(parts[0], parts[1])?;
    let odds: f64 = parts[2]
        .parse()
        .with_context(|| format!("invalid odds in source '{}'", arg))?;
    let mut input = SourceInput::new(record, AmericanOdds::new(odds)?);

    if let Some(size) = parts.get(3) {
        let size: f64 = size
            .parse()
            .with_context(|| format!("invalid bet size in source '{}'", arg))?;
        input = input.with_bet_size(size);
    }

    Ok(input)
}

fn print_report(r: &EvaluationReport) {
    println!("{} ({} bets)", r.key, r.sample_size);
    println!(
        "  Observed ROI:      {:+.2}%  ->  adjusted {:+.2}% ± {:.2}% (weight {:.3})",
        r.observed_roi * 100.0,
        r.shrinkage.adjusted_roi * 100.0,
        r.shrinkage.adjusted_margin_of_error * 100.0,
        r.shrinkage.shrink_weight
    );
    println!(
        "  ROI bounds:        [{:+.2}%, {:+.2}%]",
        r.interval.roi_lower * 100.0,
        r.interval.roi_upper * 100.0
    );
    println!(
        "  Implied true prob: {:.2}%  [{:.2}%, {:.2}%] at {}",
        r.probability.value * 100.0,
        r.interval.probability_lower * 100.0,
        r.interval.probability_upper * 100.0,
        r.original_odds
    );
    println!(
        "  Expected ROI:      {:+.2}% ± {:.2}% at {}",
        r.expected_roi, r.interval.expected_roi_margin_of_error, r.new_odds
    );
    match &r.stake {
        Some(s) => println!(
            "  Kelly:             {:.4} full, {:.2} units recommended",
            s.kelly_fraction, s.recommended_units
        ),
        None => println!("  Kelly:             no stake"),
    }
    if let Some(sig) = &r.bet_size_signal {
        println!(
            "  Signal strength:   {:.2}x  -> weighted EV {:+.2}%{}",
            sig.signal_strength,
            sig.weighted_expected_roi,
            sig.signal_weighted_units
                .map(|u| format!(", weighted stake {:.2} units", u))
                .unwrap_or_default()
        );
    }
    for w in &r.warnings {
        println!("  WARNING: {}", w);
    }
}

fn print_combined(r: &CombinedReport) {
    for (s, w) in r.sources.iter().zip(&r.combination.sources) {
        println!(
            "{} at {}: p = {:.2}%, weight {:.3}",
            s.key,
            s.original_odds,
            s.probability * 100.0,
            w.normalized_weight
        );
    }
    println!(
        "Combined ({}): p = {:.2}%, {}",
        r.combination.strategy,
        r.combination.probability * 100.0,
        r.combination.agreement
    );
    println!(
        "Expected ROI at {}: {:+.2}% ± {:.2}%",
        r.new_odds, r.expected_roi, r.expected_roi_margin_of_error
    );
    match (&r.stake, r.stake_multiplier) {
        (Some(s), Some(m)) => println!(
            "Stake: {:.2} units (Kelly {:.4}, multiplier {:.2})",
            s.recommended_units, s.kelly_fraction, m
        ),
        (None, None) => println!("Stake: suppressed (sources conflict)"),
        _ => println!("Stake: none"),
    }
    for w in &r.warnings {
        println!("WARNING: {}", w);
    }
}
