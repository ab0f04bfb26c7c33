//! Company configuration.
//!
//! ```
//! use sitework_core::config::CompanyConfig;
//!
//! let config = CompanyConfig::from_json(r#"{ "company_name": "Hartley & Sons" }"#).unwrap();
//! assert_eq!(config.warehouse_capacity, 2_000);
//! assert!(config.validate().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use sitework_logic::tuning::{OutcomeTuning, TuningError};

/// Settings a company is created with. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub company_name: String,
    pub starting_funds: i64,
    /// Total units of material the warehouse can hold.
    pub warehouse_capacity: u32,
    /// Share of a job's net profit paid out on completion (0.0-1.0).
    pub completion_payout_fraction: f64,
    /// Simulated seconds per day for `update`.
    pub seconds_per_day: f64,
    /// Temporary workers a job may take on under the temporary-hires setting.
    pub temporary_hire_limit: u32,
    /// Random seed for generation (None = random).
    pub seed: Option<u64>,
    pub tuning: OutcomeTuning,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            company_name: "SiteWork Construction".to_string(),
            starting_funds: 50_000,
            warehouse_capacity: 2_000,
            completion_payout_fraction: 1.0,
            seconds_per_day: 60.0,
            temporary_hire_limit: 2,
            seed: None,
            tuning: OutcomeTuning::default(),
        }
    }
}

impl CompanyConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Every problem found, empty when the config is usable.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.company_name.trim().is_empty() {
            errors.push(ConfigError::EmptyCompanyName);
        }
        if self.warehouse_capacity == 0 {
            errors.push(ConfigError::ZeroWarehouseCapacity);
        }
        if !(0.0..=1.0).contains(&self.completion_payout_fraction) {
            errors.push(ConfigError::PayoutFractionOutOfRange(
                self.completion_payout_fraction,
            ));
        }
        if !(self.seconds_per_day > 0.0) {
            errors.push(ConfigError::NonPositiveDayLength(self.seconds_per_day));
        }
        errors.extend(self.tuning.validate().into_iter().map(ConfigError::Tuning));

        errors
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyCompanyName,
    ZeroWarehouseCapacity,
    PayoutFractionOutOfRange(f64),
    /// Zero, negative or NaN.
    NonPositiveDayLength(f64),
    Tuning(TuningError),
    /// Malformed JSON.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyCompanyName => write!(f, "company name is empty"),
            ConfigError::ZeroWarehouseCapacity => write!(f, "warehouse capacity is zero"),
            ConfigError::PayoutFractionOutOfRange(v) => {
                write!(f, "completion payout fraction {} is outside 0..=1", v)
            }
            ConfigError::NonPositiveDayLength(v) => {
                write!(f, "seconds per day must be positive, got {}", v)
            }
            ConfigError::Tuning(e) => write!(f, "tuning: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<TuningError> for ConfigError {
    fn from(e: TuningError) -> Self {
        ConfigError::Tuning(e)
    }
}
