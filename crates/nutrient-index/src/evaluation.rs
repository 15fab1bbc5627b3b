//! Holdout evaluation of a fitted model.
//!
//! Rows are shuffled with a seeded RNG and split into a training and a test
//! part; the model is fitted on the training part only and each test sample
//! is queried against it.

use crate::error::{IndexError, Result};
use crate::model::FittedModel;
use crate::types::Dataset;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of querying every test sample against a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Neighbors requested per query
    pub k: usize,
    /// Test samples that were queried
    pub evaluated: usize,
    /// Test samples skipped because their width did not match the schema
    pub skipped: usize,
    /// Share of evaluated samples whose own label appears among their neighbors
    pub recall_at_k: f64,
    /// Mean standardized distance to the nearest training row
    pub mean_nearest_distance: f64,
}

/// Split `dataset` into `(train, test)` with a seeded shuffle.
///
/// The test part holds `ceil(len * test_fraction)` samples. Both parts keep
/// the original relative order of their rows, so the split only depends on
/// `seed` and the dataset size.
pub fn train_test_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(IndexError::InvalidArgument(format!(
            "test fraction must be in [0.0, 1.0), got {}",
            test_fraction
        )));
    }

    let n = dataset.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test >= n && n > 0 {
        return Err(IndexError::InvalidArgument(format!(
            "holding out {} of {} samples leaves nothing to train on",
            n_test, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut is_test = vec![false; n];
    for &i in &indices[..n_test] {
        is_test[i] = true;
    }

    let mut train = Dataset::new();
    let mut test = Dataset::new();
    for (sample, &held_out) in dataset.iter().zip(&is_test) {
        if held_out {
            test.push(sample.clone());
        } else {
            train.push(sample.clone());
        }
    }

    debug!("Split {} samples into {} train / {} test", n, train.len(), test.len());
    Ok((train, test))
}

/// Query every test sample and summarize how well the model recovers it.
pub fn evaluate(model: &FittedModel, test: &Dataset, k: i64) -> Result<EvaluationReport> {
    let k_usize = crate::index::validate_k(k)?;
    let width = model.schema().len();

    let mut evaluated = 0usize;
    let mut skipped = 0usize;
    let mut hits = 0usize;
    let mut nearest_sum = 0.0;

    for sample in test.iter() {
        if sample.features.len() != width {
            skipped += 1;
            continue;
        }

        let neighbors = model.recommend_neighbors(&sample.features, k)?;
        evaluated += 1;
        if neighbors.iter().any(|n| n.label == sample.label) {
            hits += 1;
        }
        if let Some(nearest) = neighbors.first() {
            nearest_sum += nearest.distance;
        }
    }

    if skipped > 0 {
        warn!("Skipped {} test samples with the wrong width", skipped);
    }

    let (recall_at_k, mean_nearest_distance) = if evaluated == 0 {
        (0.0, 0.0)
    } else {
        (
            hits as f64 / evaluated as f64,
            nearest_sum / evaluated as f64,
        )
    };

    Ok(EvaluationReport {
        k: k_usize,
        evaluated,
        skipped,
        recall_at_k,
        mean_nearest_distance,
    })
}
