//! Preprocessing applied identically at fit time and at query time.
//!
//! This module provides:
//! - Median imputation of missing values
//! - Standardization to zero mean and unit variance

mod imputer;
mod scaler;

pub use imputer::{FeatureImputer, ImputationStatistics};
pub use scaler::{FeatureScaler, ScalingStatistics};
