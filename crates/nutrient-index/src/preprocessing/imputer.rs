//! Median imputation of missing feature values.

use crate::error::{IndexError, Result};
use crate::types::{FeatureSchema, RawValue};
use crate::utils::{median, parse_cells};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-dimension fill values learned at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationStatistics {
    fill_values: Vec<f64>,
}

impl ImputationStatistics {
    /// Fill value for dimension `index`.
    pub fn fill_value(&self, index: usize) -> Option<f64> {
        self.fill_values.get(index).copied()
    }

    pub fn fill_values(&self) -> &[f64] {
        &self.fill_values
    }

    pub fn len(&self) -> usize {
        self.fill_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fill_values.is_empty()
    }
}

/// Fills missing values with the median of the observed training values.
pub struct FeatureImputer;

impl FeatureImputer {
    /// Compute the median of every dimension over the non-missing values.
    ///
    /// Fails with [`IndexError::InsufficientData`] when a dimension has no
    /// observed value at all.
    pub fn fit(matrix: &[Vec<Option<f64>>], schema: &FeatureSchema) -> Result<ImputationStatistics> {
        for (row_idx, row) in matrix.iter().enumerate() {
            schema.check_width(format!("training row {}", row_idx), row.len())?;
        }

        let mut fill_values = Vec::with_capacity(schema.len());
        for dim in 0..schema.len() {
            let mut observed: Vec<f64> = matrix
                .iter()
                .filter_map(|row| row[dim])
                .filter(|v| v.is_finite())
                .collect();

            let missing = matrix.len() - observed.len();
            let fill = median(&mut observed).ok_or_else(|| IndexError::InsufficientData {
                feature: schema.name(dim).to_string(),
            })?;

            debug!(
                "Median for '{}': {:.4} ({} missing of {})",
                schema.name(dim),
                fill,
                missing,
                matrix.len()
            );
            fill_values.push(fill);
        }

        Ok(ImputationStatistics { fill_values })
    }

    /// Replace every missing or non-finite entry with its dimension's fill value.
    pub fn transform(row: &[Option<f64>], stats: &ImputationStatistics) -> Result<Vec<f64>> {
        if row.len() != stats.len() {
            return Err(IndexError::schema_mismatch("imputer input", stats.len(), row.len()));
        }

        Ok(row
            .iter()
            .zip(&stats.fill_values)
            .map(|(value, fill)| match value {
                Some(v) if v.is_finite() => *v,
                _ => *fill,
            })
            .collect())
    }

    /// Parse raw cells and impute them in one step.
    pub fn transform_raw(row: &[RawValue], stats: &ImputationStatistics) -> Result<Vec<f64>> {
        Self::transform(&parse_cells(row), stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(n: usize) -> FeatureSchema {
        FeatureSchema::new((0..n).map(|i| format!("f{}", i)))
    }

    // ========================================================================
    // fit() tests
    // ========================================================================

    #[test]
    fn test_fit_even_count_median() {
        let matrix = vec![vec![Some(1.0)], vec![Some(2.0)], vec![Some(3.0)], vec![Some(4.0)]];
        let stats = FeatureImputer::fit(&matrix, &schema(1)).unwrap();
        assert_eq!(stats.fill_value(0), Some(2.5));
    }

    #[test]
    fn test_fit_ignores_missing_values() {
        let matrix = vec![
            vec![Some(1.0), None],
            vec![None, Some(10.0)],
            vec![Some(5.0), Some(30.0)],
            vec![Some(9.0), None],
        ];
        let stats = FeatureImputer::fit(&matrix, &schema(2)).unwrap();
        assert_eq!(stats.fill_values(), &[5.0, 20.0]);
    }

    #[test]
    fn test_fit_all_missing_dimension_fails() {
        let matrix = vec![vec![Some(1.0), None], vec![Some(2.0), None]];
        let err = FeatureImputer::fit(&matrix, &schema(2)).unwrap_err();
        match err {
            IndexError::InsufficientData { feature } => assert_eq!(feature, "f1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fit_rejects_wrong_width() {
        let matrix = vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0)]];
        let err = FeatureImputer::fit(&matrix, &schema(2)).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    // ========================================================================
    // transform() tests
    // ========================================================================

    #[test]
    fn test_transform_fills_only_missing() {
        let matrix = vec![vec![Some(2.0), Some(4.0)], vec![Some(4.0), Some(8.0)]];
        let stats = FeatureImputer::fit(&matrix, &schema(2)).unwrap();

        let out = FeatureImputer::transform(&[None, Some(1.0)], &stats).unwrap();
        assert_eq!(out, vec![3.0, 1.0]);

        let out = FeatureImputer::transform(&[Some(f64::NAN), None], &stats).unwrap();
        assert_eq!(out, vec![3.0, 6.0]);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let matrix = vec![vec![Some(1.0), Some(7.0)], vec![Some(3.0), None]];
        let stats = FeatureImputer::fit(&matrix, &schema(2)).unwrap();

        let once = FeatureImputer::transform(&[None, None], &stats).unwrap();
        let lifted: Vec<Option<f64>> = once.iter().copied().map(Some).collect();
        let twice = FeatureImputer::transform(&lifted, &stats).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, FeatureImputer::transform(&[None, None], &stats).unwrap());
    }

    #[test]
    fn test_transform_raw_parses_cells() {
        let matrix = vec![vec![Some(10.0), Some(1.0)], vec![Some(20.0), Some(3.0)]];
        let stats = FeatureImputer::fit(&matrix, &schema(2)).unwrap();

        let row = [RawValue::from("12.5±0.3"), RawValue::from("n/a")];
        let out = FeatureImputer::transform_raw(&row, &stats).unwrap();
        assert_eq!(out, vec![12.5, 2.0]);
    }

    #[test]
    fn test_transform_wrong_width() {
        let matrix = vec![vec![Some(1.0), Some(2.0)]];
        let stats = FeatureImputer::fit(&matrix, &schema(2)).unwrap();
        assert!(FeatureImputer::transform(&[Some(1.0)], &stats).is_err());
    }
}
