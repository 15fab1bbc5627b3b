//! The recommendation engine: fit once, query many times.

use crate::config::EngineConfig;
use crate::error::{IndexError, Result};
use crate::index::FittedIndex;
use crate::model::FittedModel;
use crate::preprocessing::{FeatureImputer, FeatureScaler};
use crate::types::{Dataset, FeatureSchema, Neighbor, RawValue};
use crate::utils::parse_cells;
use std::time::Instant;
use tracing::{info, warn};

/// Fits [`FittedModel`]s and answers queries against them.
///
/// The engine itself holds only configuration; every fit returns a new,
/// independent model.
///
/// # Example
///
/// ```rust
/// use nutrient_index::{Dataset, RawValue, RecommendationEngine, TrainingSample};
///
/// let dataset = Dataset::from_samples(vec![
///     TrainingSample::new("A", [100.0, 5.0, 10.0, 2.0, 1.0, 50.0, 1.0]),
///     TrainingSample::new("B", [110.0, 6.0, 11.0, 2.0, 1.0, 55.0, 1.0]),
///     TrainingSample::new("C", [500.0, 20.0, 60.0, 30.0, 5.0, 200.0, 10.0]),
/// ]);
///
/// let engine = RecommendationEngine::default();
/// let model = engine.fit(&dataset).unwrap();
///
/// let query: Vec<RawValue> = [105.0, 5.0, 10.0, 2.0, 1.0, 52.0, 1.0]
///     .into_iter()
///     .map(RawValue::from)
///     .collect();
/// assert_eq!(engine.recommend(&model, &query, 2).unwrap(), vec!["A", "B"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: EngineConfig,
}

impl RecommendationEngine {
    /// Create an engine from a configuration, validating it first.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schema(&self) -> FeatureSchema {
        self.config.schema()
    }

    /// Fit imputer, scaler and index on `dataset` in one pass.
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyDataset`] for a dataset without samples
    /// - [`IndexError::SchemaMismatch`] when a sample has the wrong width
    /// - [`IndexError::InsufficientData`] when a feature is never observed
    /// - [`IndexError::DegenerateFeature`] when a feature is constant
    ///
    /// These variants are returned as-is, never wrapped in
    /// [`IndexError::WithContext`].
    pub fn fit(&self, dataset: &Dataset) -> Result<FittedModel> {
        let start = Instant::now();
        let schema = self.schema();

        if dataset.is_empty() {
            return Err(IndexError::EmptyDataset);
        }
        for (row_idx, sample) in dataset.iter().enumerate() {
            schema.check_width(
                format!("sample {} ('{}')", row_idx, sample.label),
                sample.features.len(),
            )?;
        }

        let parsed: Vec<Vec<Option<f64>>> = dataset
            .iter()
            .map(|sample| parse_cells(&sample.features))
            .collect();

        let imputation = FeatureImputer::fit(&parsed, &schema)
            .inspect_err(|e| warn!("Imputation failed: {}", e))?;
        let imputed = parsed
            .iter()
            .map(|row| FeatureImputer::transform(row, &imputation))
            .collect::<Result<Vec<_>>>()?;

        let scaling = FeatureScaler::fit(&imputed, &schema)
            .inspect_err(|e| warn!("Scaling failed: {}", e))?;
        let scaled = imputed
            .iter()
            .map(|row| FeatureScaler::transform(row, &scaling))
            .collect::<Result<Vec<_>>>()?;

        let index = FittedIndex::build(scaled, dataset.labels(), schema.len())?;

        info!(
            "Fitted model on {} samples x {} features in {:?}",
            dataset.len(),
            schema.len(),
            start.elapsed()
        );
        Ok(FittedModel::new(schema, imputation, scaling, index))
    }

    /// Labels of the `k` foods nearest to `raw`, nearest first.
    ///
    /// Uses the model's own statistics; nothing is refitted.
    pub fn recommend(&self, model: &FittedModel, raw: &[RawValue], k: i64) -> Result<Vec<String>> {
        model.recommend(raw, k)
    }

    /// [`RecommendationEngine::recommend`] with the configured default k.
    pub fn recommend_default(&self, model: &FittedModel, raw: &[RawValue]) -> Result<Vec<String>> {
        model.recommend(raw, self.default_k())
    }

    /// Neighbors with distances, nearest first.
    pub fn recommend_neighbors(
        &self,
        model: &FittedModel,
        raw: &[RawValue],
        k: i64,
    ) -> Result<Vec<Neighbor>> {
        model.recommend_neighbors(raw, k)
    }

    fn default_k(&self) -> i64 {
        i64::try_from(self.config.default_k).unwrap_or(i64::MAX)
    }
}
