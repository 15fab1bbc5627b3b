//! Standardization to zero mean and unit variance.

use crate::error::{IndexError, Result};
use crate::types::FeatureSchema;
use crate::utils::mean_and_std;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative tolerance under which a standard deviation counts as zero.
///
/// Scaled by `|mean|` with no absolute floor: an all-zero column is rejected
/// only because its deviation is exactly zero.
const DEGENERATE_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// Per-dimension mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingStatistics {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl ScalingStatistics {
    pub fn mean(&self, index: usize) -> Option<f64> {
        self.means.get(index).copied()
    }

    pub fn std_dev(&self, index: usize) -> Option<f64> {
        self.std_devs.get(index).copied()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Whether the statistics are usable for scaling (equal lengths, positive
    /// finite deviations).
    pub fn is_consistent(&self) -> bool {
        self.means.len() == self.std_devs.len()
            && self.means.iter().all(|m| m.is_finite())
            && self.std_devs.iter().all(|s| s.is_finite() && *s > 0.0)
    }
}

pub struct FeatureScaler;

impl FeatureScaler {
    /// Compute mean and population standard deviation for every dimension of
    /// the imputed matrix.
    ///
    /// A constant dimension fails with [`IndexError::DegenerateFeature`].
    pub fn fit(matrix: &[Vec<f64>], schema: &FeatureSchema) -> Result<ScalingStatistics> {
        if matrix.is_empty() {
            return Err(IndexError::EmptyDataset);
        }
        for (row_idx, row) in matrix.iter().enumerate() {
            schema.check_width(format!("imputed row {}", row_idx), row.len())?;
        }

        let mut means = Vec::with_capacity(schema.len());
        let mut std_devs = Vec::with_capacity(schema.len());
        let mut column = Vec::with_capacity(matrix.len());

        for dim in 0..schema.len() {
            column.clear();
            column.extend(matrix.iter().map(|row| row[dim]));

            let (mean, std) = mean_and_std(&column).ok_or(IndexError::EmptyDataset)?;
            if !std.is_finite() || std <= DEGENERATE_TOLERANCE * mean.abs() {
                return Err(IndexError::DegenerateFeature {
                    feature: schema.name(dim).to_string(),
                });
            }

            debug!("Scaling '{}': mean={:.4}, std={:.4}", schema.name(dim), mean, std);
            means.push(mean);
            std_devs.push(std);
        }

        Ok(ScalingStatistics { means, std_devs })
    }

    /// `(value - mean) / std` per dimension.
    pub fn transform(row: &[f64], stats: &ScalingStatistics) -> Result<Vec<f64>> {
        if row.len() != stats.len() {
            return Err(IndexError::schema_mismatch("scaler input", stats.len(), row.len()));
        }

        Ok(row
            .iter()
            .zip(stats.means.iter().zip(&stats.std_devs))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect())
    }

    /// Map a standardized vector back to the original units.
    pub fn inverse_transform(row: &[f64], stats: &ScalingStatistics) -> Result<Vec<f64>> {
        if row.len() != stats.len() {
            return Err(IndexError::schema_mismatch("scaler input", stats.len(), row.len()));
        }

        Ok(row
            .iter()
            .zip(stats.means.iter().zip(&stats.std_devs))
            .map(|(value, (mean, std))| value * std + mean)
            .collect())
    }
}
