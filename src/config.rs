use crate::data::LabelRule;
use crate::profiles::ProfileKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "FAILURE_PREDICTOR_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Shared pipeline settings
    #[validate(nested)]
    pub pipeline: PipelineConfig,

    /// Battery replacement profile
    #[serde(default)]
    pub battery: BatteryConfig,

    /// Turbine maintenance profile
    #[serde(default)]
    #[validate(nested)]
    pub turbine: TurbineConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and
    /// the environment (prefix `FAILURE_PREDICTOR`, separator `__`).
    ///
    /// A file named explicitly (argument or `FAILURE_PREDICTOR_CONFIG`) must
    /// exist; only the implicit `config/local.toml` may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let explicit = path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        let required = explicit.is_some();
        let config_path = explicit.unwrap_or_else(|| "config/local.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(required))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("FAILURE_PREDICTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Profile run when no subcommand is given
    #[serde(default)]
    pub profile: ProfileKind,

    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_size")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,

    /// Seed for the split and synthetic generation
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Optional tree depth limit (unset grows until leaves are pure)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile: ProfileKind::default(),
            test_size: default_test_size(),
            seed: default_seed(),
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Directory the CSV files are resolved against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Measurement table
    #[serde(default = "default_primary_file")]
    pub primary_file: PathBuf,

    /// Table of problem timestamps
    #[serde(default = "default_problems_file")]
    pub problems_file: PathBuf,
}

impl BatteryConfig {
    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(&self.primary_file)
    }

    pub fn problems_path(&self) -> PathBuf {
        self.data_dir.join(&self.problems_file)
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            primary_file: default_primary_file(),
            problems_file: default_problems_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TurbineConfig {
    /// Number of synthetic rows
    #[serde(default = "default_synthetic_rows")]
    #[validate(range(min = 2))]
    pub rows: usize,

    /// Label derivation rule
    #[serde(default)]
    pub label_rule: LabelRule,
}

impl Default for TurbineConfig {
    fn default() -> Self {
        Self {
            rows: default_synthetic_rows(),
            label_rule: LabelRule::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_primary_file() -> PathBuf {
    PathBuf::from("synthetic_soh.csv")
}

fn default_problems_file() -> PathBuf {
    PathBuf::from("problem_rows_sample.csv")
}

fn default_synthetic_rows() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_load() {
        let config = Config::load(None).unwrap();

        assert_eq!(config.pipeline.test_size, 0.2);
        assert_eq!(config.pipeline.seed, 42);
        assert_eq!(config.turbine.rows, 1000);
        assert_eq!(config.turbine.label_rule, LabelRule::IndependentDraws);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("does/not/exist"));
    }

    #[test]
    fn test_battery_paths() {
        let battery = BatteryConfig {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };

        assert_eq!(battery.primary_path(), PathBuf::from("/data/synthetic_soh.csv"));
        assert_eq!(
            battery.problems_path(),
            PathBuf::from("/data/problem_rows_sample.csv")
        );
    }

    #[test]
    fn test_validation_rejects_bad_test_size() {
        let mut config = Config::default();
        config.pipeline.test_size = 1.5;
        assert!(config.validate().is_err());

        config.pipeline.test_size = 0.2;
        config.turbine.rows = 1;
        assert!(config.validate().is_err());
    }
}
