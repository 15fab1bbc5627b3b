//! Nutrient Similarity Index
//!
//! Exact k-nearest-neighbor food recommendations over nutrient profiles.
//!
//! # Overview
//!
//! A food composition table is reduced to seven nutrient dimensions (energy,
//! protein, available carbohydrate, fat, total dietary fiber, ash and
//! insoluble fiber). Fitting the engine:
//!
//! - **Parses** every raw cell into a number or a missing value
//!   (`NA`, blanks and `value ± uncertainty` readings are understood)
//! - **Imputes** missing values with the per-feature median
//! - **Standardizes** every feature to zero mean and unit variance
//! - **Indexes** the standardized rows together with their food names
//!
//! Queries go through the exact same imputation and scaling, using the
//! statistics stored in the model, and return the nearest foods by Euclidean
//! distance. Ties are broken by the original row order.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use nutrient_index::{EngineConfig, RecommendationEngine, RawValue, ingest};
//!
//! let config = EngineConfig::default();
//! let dataset = ingest::load_dataset("foods.csv", &config)?;
//!
//! let engine = RecommendationEngine::new(config)?;
//! let model = engine.fit(&dataset)?;
//! model.save("model.json")?;
//!
//! let query: Vec<RawValue> = [200.0, 10.0, 30.0, 5.0, 15.0, 900.0, 20.0]
//!     .into_iter()
//!     .map(RawValue::from)
//!     .collect();
//! let foods = engine.recommend_default(&model, &query)?;
//! ```
//!
//! # Sharing a model between threads
//!
//! [`ModelHandle`] publishes one immutable [`FittedModel`] at a time. Queries
//! clone the current `Arc`; a refit swaps in a complete new model, so readers
//! never see statistics and index from different fits.
//!
//! ```rust,ignore
//! use nutrient_index::{ModelHandle, RecommendationEngine};
//!
//! let handle = ModelHandle::new();
//! handle.refit(&RecommendationEngine::default(), &dataset)?;
//! let foods = handle.recommend(&query, 5)?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod handle;
pub mod index;
pub mod ingest;
pub mod model;
pub mod preprocessing;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, DEFAULT_K, EngineConfig, EngineConfigBuilder};
pub use engine::RecommendationEngine;
pub use error::{IndexError, Result as IndexResult, ResultExt};
pub use evaluation::{EvaluationReport, evaluate, train_test_split};
pub use handle::{ModelHandle, ModelState};
pub use index::{FittedIndex, NeighborSearch};
pub use model::{FittedModel, MODEL_FORMAT_VERSION, ModelMetadata};
pub use preprocessing::{FeatureImputer, FeatureScaler, ImputationStatistics, ScalingStatistics};
pub use types::{
    Dataset, FeatureSchema, NUTRIENT_COLUMNS, NUTRIENT_DESCRIPTIONS, Neighbor, RawValue,
    TrainingSample,
};
pub use utils::{is_missing_marker, parse_cell, parse_numeric_cell};
