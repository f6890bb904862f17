use config::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::errors::LedgerError;

/// Default values for configuration
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_RECOVERY_RATIO: &str = "0.47";
const DEFAULT_WEIGHT_UNITS_PER_QUINTAL: &str = "100";
const DEFAULT_PADDY_KG_PER_BAG: &str = "75";

/// Milling and unit constants the engine needs at every computation.
///
/// All weights inside the engine are quintals; `weight_units_per_quintal` is
/// the divisor applied exactly once at the query boundary to whatever unit
/// the event store records (100 for kg, 1000 for the legacy unit some
/// historical rows use).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Quintals of milled output produced per quintal-equivalent paddy bag;
    /// the paddy-bags-deducted divisor for consumption events.
    #[validate(custom = "positive_decimal")]
    pub recovery_ratio: Decimal,

    /// Stored-weight units that make up one quintal.
    #[validate(custom = "positive_decimal")]
    pub weight_units_per_quintal: Decimal,

    /// Standard weight of one raw paddy bag, in kg. Used to express paddy
    /// deductions in quintals alongside the bag count.
    #[validate(custom = "positive_decimal")]
    pub paddy_kg_per_bag: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recovery_ratio: dec!(0.47),
            weight_units_per_quintal: dec!(100),
            paddy_kg_per_bag: dec!(75),
        }
    }
}

fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

/// Loads engine configuration from `config/default.toml`, an environment
/// profile file, and `RICEMILL_*` environment variables, in that order of
/// precedence. All sources are optional; the built-in defaults alone are a
/// valid configuration.
pub fn load_config() -> Result<EngineConfig, LedgerError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading engine configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("recovery_ratio", DEFAULT_RECOVERY_RATIO)
        .map_err(|e| LedgerError::Config(e.to_string()))?
        .set_default("weight_units_per_quintal", DEFAULT_WEIGHT_UNITS_PER_QUINTAL)
        .map_err(|e| LedgerError::Config(e.to_string()))?
        .set_default("paddy_kg_per_bag", DEFAULT_PADDY_KG_PER_BAG)
        .map_err(|e| LedgerError::Config(e.to_string()))?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("RICEMILL").separator("__"))
        .build()
        .map_err(|e| LedgerError::Config(e.to_string()))?;

    let engine_config: EngineConfig = config
        .try_deserialize()
        .map_err(|e| LedgerError::Config(e.to_string()))?;

    engine_config
        .validate()
        .map_err(|e| LedgerError::Config(e.to_string()))?;

    Ok(engine_config)
}
