//! Exhaustive Euclidean scan over the standardized training rows.

use crate::error::{IndexError, Result};
use crate::index::NeighborSearch;
use crate::types::Neighbor;
use crate::utils::squared_euclidean;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Standardized training matrix and its labels, scanned exhaustively per query.
///
/// Rows are stored row-major in one flat buffer in their original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedIndex {
    dimensions: usize,
    values: Vec<f64>,
    labels: Vec<String>,
}

impl FittedIndex {
    /// Store scaled rows and their labels in parallel.
    ///
    /// No deduplication: identical rows and repeated labels are kept.
    pub fn build(rows: Vec<Vec<f64>>, labels: Vec<String>, dimensions: usize) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(IndexError::InvalidArgument(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let mut values = Vec::with_capacity(rows.len() * dimensions);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != dimensions {
                return Err(IndexError::schema_mismatch(
                    format!("index row {}", row_idx),
                    dimensions,
                    row.len(),
                ));
            }
            values.extend(row);
        }

        let index = Self {
            dimensions,
            values,
            labels,
        };
        index.validate()?;
        debug!("Built index with {} rows of {} dimensions", index.len(), dimensions);
        Ok(index)
    }

    /// Check internal consistency (used after deserialization).
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(IndexError::CorruptModel(
                "index has zero dimensions".to_string(),
            ));
        }
        if self.values.len() != self.labels.len() * self.dimensions {
            return Err(IndexError::CorruptModel(format!(
                "index holds {} values for {} labels of width {}",
                self.values.len(),
                self.labels.len(),
                self.dimensions
            )));
        }
        if let Some(pos) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(IndexError::CorruptModel(format!(
                "non-finite value in row {}",
                pos / self.dimensions
            )));
        }
        Ok(())
    }

    /// Stored rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.dimensions)
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows().nth(index)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Ascending distance, then ascending insertion index.
fn by_distance_then_row(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

impl NeighborSearch for FittedIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn search(&self, vector: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.dimensions {
            return Err(IndexError::schema_mismatch(
                "index query",
                self.dimensions,
                vector.len(),
            ));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidArgument(
                "query vector contains non-finite values".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f64)> = self
            .rows()
            .enumerate()
            .map(|(row, values)| (row, squared_euclidean(vector, values)))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_row);
            scored.truncate(k);
        }
        scored.sort_by(by_distance_then_row);

        Ok(scored
            .into_iter()
            .map(|(row, squared)| Neighbor {
                row,
                label: self.labels[row].clone(),
                distance: squared.sqrt(),
            })
            .collect())
    }
}
