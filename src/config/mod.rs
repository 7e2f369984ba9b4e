//! Configuration management for Bettor Edge
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub estimator: EstimatorConfig,
    pub kelly: KellyConfig,
    pub combiner: CombinerConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// Bayesian shrinkage parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EstimatorConfig {
    /// ROI the estimate is pulled toward (decimal)
    pub prior_mean: f64,
    /// Pseudo-count of prior bets
    pub prior_weight: f64,
    /// 1.96 -> 95% confidence
    pub z_score: f64,
    /// Assumed per-bet ROI standard deviation
    pub assumed_std_dev: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            prior_mean: 0.0,
            prior_weight: 100.0,
            z_score: 1.96,
            assumed_std_dev: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct KellyConfig {
    /// Risk-reduction multiplier on full Kelly (0.5 = half Kelly)
    pub fraction: f64,
    /// Units per bankroll (100 -> one unit is 1% of bankroll)
    pub units_scale: f64,
    /// Cap on the full Kelly fraction before the multiplier
    pub max_fraction: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            fraction: 0.5,
            units_scale: 100.0,
            max_fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CombinerConfig {
    pub weight_strategy: WeightStrategy,
    pub conflict_policy: ConflictPolicy,
    /// Stake multiplier under `ConflictPolicy::Damp`
    pub conflict_damping: f64,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            weight_strategy: WeightStrategy::SampleSize,
            conflict_policy: ConflictPolicy::Suppress,
            conflict_damping: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Historical bettor dataset (CSV)
    pub dataset_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: "./data/bettors.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with an explicit file layered over the defaults
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            // Estimator defaults
            .set_default("estimator.prior_mean", 0.0)?
            .set_default("estimator.prior_weight", 100.0)?
            .set_default("estimator.z_score", 1.96)?
            .set_default("estimator.assumed_std_dev", 1.0)?
            // Kelly defaults
            .set_default("kelly.fraction", 0.5)?
            .set_default("kelly.units_scale", 100.0)?
            .set_default("kelly.max_fraction", 1.0)?
            // Combiner defaults
            .set_default("combiner.weight_strategy", "sample_size")?
            .set_default("combiner.conflict_policy", "suppress")?
            .set_default("combiner.conflict_damping", 0.5)?
            // Data defaults
            .set_default("data.dataset_path", "./data/bettors.csv")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config = builder
            // Override with environment variables (BETTOR_EDGE__*)
            .add_source(Environment::with_prefix("BETTOR_EDGE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Reject parameter values the estimators are undefined for
    pub fn validate(&self) -> Result<()> {
        let est = &self.estimator;
        if !(est.prior_weight > 0.0) {
            bail!("estimator.prior_weight must be positive, got {}", est.prior_weight);
        }
        if !(est.z_score > 0.0) {
            bail!("estimator.z_score must be positive, got {}", est.z_score);
        }
        if !(est.assumed_std_dev > 0.0) {
            bail!(
                "estimator.assumed_std_dev must be positive, got {}",
                est.assumed_std_dev
            );
        }
        if !est.prior_mean.is_finite() {
            bail!("estimator.prior_mean must be finite");
        }

        let kelly = &self.kelly;
        if !(kelly.fraction > 0.0 && kelly.fraction <= 1.0) {
            bail!("kelly.fraction must lie in (0, 1], got {}", kelly.fraction);
        }
        if !(kelly.units_scale > 0.0) {
            bail!("kelly.units_scale must be positive, got {}", kelly.units_scale);
        }
        if !(kelly.max_fraction > 0.0) {
            bail!("kelly.max_fraction must be positive, got {}", kelly.max_fraction);
        }

        let damping = self.combiner.conflict_damping;
        if !(0.0..=1.0).contains(&damping) {
            bail!("combiner.conflict_damping must lie in [0, 1], got {}", damping);
        }

        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "prior={:.3} prior_weight={} z={} sd={} kelly={}x cap={} weights={} conflict={:?} data={}",
            self.estimator.prior_mean,
            self.estimator.prior_weight,
            self.estimator.z_score,
            self.estimator.assumed_std_dev,
            self.kelly.fraction,
            self.kelly.max_fraction,
            self.combiner.weight_strategy,
            self.combiner.conflict_policy,
            self.data.dataset_path
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.estimator.z_score, 1.96);
        assert_eq!(cfg.estimator.assumed_std_dev, 1.0);
        assert_eq!(cfg.estimator.prior_weight, 100.0);
        assert_eq!(cfg.estimator.prior_mean, 0.0);
        assert_eq!(cfg.kelly.fraction, 0.5);
        assert_eq!(cfg.combiner.weight_strategy, WeightStrategy::SampleSize);
        assert_eq!(cfg.combiner.conflict_policy, ConflictPolicy::Suppress);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let mut cfg = AppConfig::default();
        cfg.estimator.prior_weight = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.kelly.fraction = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.combiner.conflict_damping = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.estimator.z_score = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn strategies_deserialize_snake_case() {
        let cfg: CombinerConfig = serde_json::from_str(
            r#"{"weight_strategy":"sample_size_times_bet_size_ratio","conflict_policy":"damp","conflict_damping":0.25}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.weight_strategy,
            WeightStrategy::SampleSizeTimesBetSizeRatio
        );
        assert_eq!(cfg.conflict_policy, ConflictPolicy::Damp);
    }

    #[test]
    fn digest_mentions_strategy() {
        let digest = AppConfig::default().digest();
        assert!(digest.contains("weights=sample_size"));
    }
}
