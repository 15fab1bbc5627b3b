//! Configuration for fitting and querying the recommendation engine.
//!
//! Built with the builder pattern; [`EngineConfigBuilder::build`] validates
//! every field before a config can be used.

use crate::types::{FeatureSchema, NUTRIENT_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of recommendations returned when the caller does not ask for more.
pub const DEFAULT_K: usize = 5;

/// Label column of the food composition table.
pub const DEFAULT_LABEL_COLUMN: &str = "Food name";

/// Share of rows held out by the evaluation split.
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// Seed for the evaluation shuffle.
pub const DEFAULT_SEED: u64 = 42;

/// Configuration for the recommendation engine.
///
/// # Example
///
/// ```rust
/// use nutrient_index::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .default_k(3)
///     .label_column("Name")
///     .build()
///     .unwrap();
/// assert_eq!(config.default_k, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ordered feature columns; order is the fit/query contract.
    /// Default: the 7 nutrient codes
    pub feature_columns: Vec<String>,

    /// Column holding the food name.
    /// Default: "Food name"
    pub label_column: String,

    /// Number of neighbors returned by default.
    /// Default: 5
    pub default_k: usize,

    /// Fraction of rows held out for evaluation (0.0 - 1.0, exclusive).
    /// Default: 0.2
    pub holdout_fraction: f64,

    /// Seed for the holdout shuffle.
    /// Default: 42
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feature_columns: NUTRIENT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            default_k: DEFAULT_K,
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// The feature schema described by this configuration.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(self.feature_columns.iter().cloned())
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.feature_columns.is_empty() {
            return Err(ConfigValidationError::NoFeatureColumns);
        }

        let mut seen = HashSet::new();
        for column in &self.feature_columns {
            if !seen.insert(column.as_str()) {
                return Err(ConfigValidationError::DuplicateFeatureColumn(column.clone()));
            }
        }

        if self.label_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyLabelColumn);
        }

        if self.default_k == 0 {
            return Err(ConfigValidationError::InvalidDefaultK(self.default_k));
        }

        if !(0.0..1.0).contains(&self.holdout_fraction) {
            return Err(ConfigValidationError::InvalidHoldoutFraction(
                self.holdout_fraction,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one feature column is required")]
    NoFeatureColumns,

    #[error("Feature column '{0}' is listed more than once")]
    DuplicateFeatureColumn(String),

    #[error("Label column name must not be empty")]
    EmptyLabelColumn,

    #[error("Invalid default k: {0} (must be at least 1)")]
    InvalidDefaultK(usize),

    #[error("Invalid holdout fraction: {0} (must be in [0.0, 1.0))")]
    InvalidHoldoutFraction(f64),
}

impl From<ConfigValidationError> for crate::error::IndexError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::IndexError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`EngineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    feature_columns: Option<Vec<String>>,
    label_column: Option<String>,
    default_k: Option<usize>,
    holdout_fraction: Option<f64>,
    seed: Option<u64>,
}

impl EngineConfigBuilder {
    /// Set the ordered feature columns.
    pub fn feature_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the column holding the food name.
    pub fn label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = Some(column.into());
        self
    }

    /// Set the number of recommendations returned by default.
    pub fn default_k(mut self, k: usize) -> Self {
        self.default_k = Some(k);
        self
    }

    /// Set the share of rows held out for evaluation.
    pub fn holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = Some(fraction);
        self
    }

    /// Set the seed used by the holdout shuffle.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EngineConfig` or an error if validation fails.
    pub fn build(self) -> Result<EngineConfig, ConfigValidationError> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            feature_columns: self.feature_columns.unwrap_or(defaults.feature_columns),
            label_column: self.label_column.unwrap_or(defaults.label_column),
            default_k: self.default_k.unwrap_or(defaults.default_k),
            holdout_fraction: self.holdout_fraction.unwrap_or(defaults.holdout_fraction),
            seed: self.seed.unwrap_or(defaults.seed),
        };

        config.validate()?;
        Ok(config)
    }
}
