//! The fitted model bundle and its persistence.
//!
//! A [`FittedModel`] holds everything one call to
//! [`RecommendationEngine::fit`](crate::RecommendationEngine::fit) produced:
//! the feature schema, the imputation and scaling statistics, and the index
//! with its labels. The three are never mixed across fits, so the bundle is
//! also the unit of persistence.

use crate::error::{IndexError, Result, ResultExt};
use crate::index::{FittedIndex, NeighborSearch};
use crate::preprocessing::{FeatureImputer, FeatureScaler, ImputationStatistics, ScalingStatistics};
use crate::types::{FeatureSchema, Neighbor, RawValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Version of the persisted model layout.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Provenance of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub fitted_at: DateTime<Utc>,
    /// Number of training samples the model was fitted on
    pub n_samples: usize,
}

/// Immutable result of one fit: statistics plus index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    schema: FeatureSchema,
    imputation: ImputationStatistics,
    scaling: ScalingStatistics,
    index: FittedIndex,
    metadata: ModelMetadata,
}

// Models are shared read-only between query threads
static_assertions::assert_impl_all!(FittedModel: Send, Sync);

impl FittedModel {
    pub(crate) fn new(
        schema: FeatureSchema,
        imputation: ImputationStatistics,
        scaling: ScalingStatistics,
        index: FittedIndex,
    ) -> Self {
        let metadata = ModelMetadata {
            format_version: MODEL_FORMAT_VERSION,
            fitted_at: Utc::now(),
            n_samples: index.len(),
        };
        Self {
            schema,
            imputation,
            scaling,
            index,
            metadata,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn imputation(&self) -> &ImputationStatistics {
        &self.imputation
    }

    pub fn scaling(&self) -> &ScalingStatistics {
        &self.scaling
    }

    pub fn index(&self) -> &FittedIndex {
        &self.index
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Check that the statistics and the index belong together.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.format_version != MODEL_FORMAT_VERSION {
            return Err(IndexError::CorruptModel(format!(
                "unsupported format version {} (expected {})",
                self.metadata.format_version, MODEL_FORMAT_VERSION
            )));
        }

        let width = self.schema.len();
        if width == 0 {
            return Err(IndexError::CorruptModel("schema has no features".to_string()));
        }
        if self.imputation.len() != width {
            return Err(IndexError::CorruptModel(format!(
                "{} fill values for {} features",
                self.imputation.len(),
                width
            )));
        }
        if self.imputation.fill_values().iter().any(|v| !v.is_finite()) {
            return Err(IndexError::CorruptModel(
                "non-finite imputation fill value".to_string(),
            ));
        }
        if self.scaling.len() != width || !self.scaling.is_consistent() {
            return Err(IndexError::CorruptModel(
                "scaling statistics do not match the schema".to_string(),
            ));
        }
        if self.index.dimensions() != width {
            return Err(IndexError::CorruptModel(format!(
                "index width {} does not match schema width {}",
                self.index.dimensions(),
                width
            )));
        }
        self.index.validate()?;
        if self.index.is_empty() {
            return Err(IndexError::CorruptModel("index holds no rows".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Querying
    // ========================================================================

    /// Impute then standardize a raw query vector with this model's statistics.
    pub fn preprocess(&self, raw: &[RawValue]) -> Result<Vec<f64>> {
        self.schema.check_width("query vector", raw.len())?;
        let imputed = FeatureImputer::transform_raw(raw, &self.imputation)?;
        FeatureScaler::transform(&imputed, &self.scaling)
    }

    /// The `k` nearest training rows with their distances, nearest first.
    pub fn recommend_neighbors(&self, raw: &[RawValue], k: i64) -> Result<Vec<Neighbor>> {
        let scaled = self.preprocess(raw)?;
        self.index.query_neighbors(&scaled, k)
    }

    /// Labels of the `k` nearest training rows, nearest first.
    pub fn recommend(&self, raw: &[RawValue], k: i64) -> Result<Vec<String>> {
        let scaled = self.preprocess(raw)?;
        self.index.query(&scaled, k)
    }

    /// Nutrient profile of a stored row in original units (after imputation).
    pub fn profile(&self, row: usize) -> Option<Vec<f64>> {
        let scaled = self.index.row(row)?;
        FeatureScaler::inverse_transform(scaled, &self.scaling).ok()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate a model.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: FittedModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Write the model as JSON.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so readers never see a partially written model.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");

        let written = self
            .write_json(&tmp_path)
            .and_then(|()| {
                fs::rename(&tmp_path, path).context(format!("Failed to write {}", path.display()))
            });
        if let Err(e) = written {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }

        info!(
            "Model saved: {} ({} rows)",
            path.display(),
            self.metadata.n_samples
        );
        Ok(())
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).context(format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read and validate a model written by [`FittedModel::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
        let model: FittedModel = serde_json::from_reader(BufReader::new(file))?;
        model
            .validate()
            .map_err(|e| e.with_context(format!("Invalid model file {}", path.display())))?;

        debug!(
            "Loaded model fitted at {} with {} rows",
            model.metadata.fitted_at, model.metadata.n_samples
        );
        Ok(model)
    }
}
