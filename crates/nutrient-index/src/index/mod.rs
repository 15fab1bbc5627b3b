//! Exact k-nearest-neighbor search over standardized feature vectors.
//!
//! Every implementation of [`NeighborSearch`] must return neighbors in
//! ascending distance with ties resolved by the lower insertion index, so a
//! tree-based index can replace the brute-force scan without changing results.

mod brute_force;

pub use brute_force::FittedIndex;

use crate::error::{IndexError, Result};
use crate::types::Neighbor;

/// Validate a caller-supplied neighbor count.
///
/// Zero is valid and yields an empty result; negative values are rejected.
pub fn validate_k(k: i64) -> Result<usize> {
    if k < 0 {
        return Err(IndexError::InvalidArgument(format!(
            "k must be non-negative, got {}",
            k
        )));
    }
    usize::try_from(k).map_err(|_| IndexError::InvalidArgument(format!("k is too large: {}", k)))
}

/// Exact nearest-neighbor search contract.
pub trait NeighborSearch: Send + Sync {
    /// Width of the stored vectors.
    fn dimensions(&self) -> usize;

    /// Number of stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest rows to `vector`, nearest first.
    ///
    /// Returns fewer than `k` neighbors when the index holds fewer rows.
    fn search(&self, vector: &[f64], k: usize) -> Result<Vec<Neighbor>>;

    /// Like [`NeighborSearch::search`] but with a signed, validated `k`.
    fn query_neighbors(&self, vector: &[f64], k: i64) -> Result<Vec<Neighbor>> {
        let k = validate_k(k)?;
        self.search(vector, k)
    }

    /// Labels of the `k` nearest rows, nearest first.
    fn query(&self, vector: &[f64], k: i64) -> Result<Vec<String>> {
        Ok(self
            .query_neighbors(vector, k)?
            .into_iter()
            .map(|n| n.label)
            .collect())
    }
}
