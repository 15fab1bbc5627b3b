//! A shared slot holding the current fitted model.
//!
//! The slot is either unfitted or holds one immutable [`FittedModel`] behind
//! an [`Arc`]. Replacing the model swaps the whole `Arc` under a write lock,
//! so a reader always queries statistics and index from the same fit.

use crate::engine::RecommendationEngine;
use crate::error::{IndexError, Result};
use crate::model::FittedModel;
use crate::types::{Dataset, Neighbor, RawValue};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle state of a [`ModelHandle`].
#[derive(Debug, Clone)]
pub enum ModelState {
    /// No model has been published yet
    Unfitted,
    /// An immutable model ready for queries
    Fitted(Arc<FittedModel>),
}

impl ModelState {
    pub fn is_fitted(&self) -> bool {
        matches!(self, ModelState::Fitted(_))
    }
}

/// Thread-safe holder of the currently published model.
#[derive(Debug, Default)]
pub struct ModelHandle {
    current: RwLock<Option<Arc<FittedModel>>>,
}

// Shared across query threads while a retrain publishes a new model
static_assertions::assert_impl_all!(ModelHandle: Send, Sync);

impl ModelHandle {
    /// An unfitted handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that starts out fitted.
    pub fn with_model(model: FittedModel) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(model))),
        }
    }

    pub fn state(&self) -> ModelState {
        match self.current.read().as_ref() {
            Some(model) => ModelState::Fitted(Arc::clone(model)),
            None => ModelState::Unfitted,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.current.read().is_some()
    }

    /// The published model, or [`IndexError::NotFitted`].
    pub fn current(&self) -> Result<Arc<FittedModel>> {
        self.current.read().clone().ok_or(IndexError::NotFitted)
    }

    /// Publish a new model, returning the one it replaces.
    pub fn publish(&self, model: FittedModel) -> Option<Arc<FittedModel>> {
        let model = Arc::new(model);
        let previous = self.current.write().replace(model);
        info!(
            "Published model ({}replacing a previous one)",
            if previous.is_some() { "" } else { "not " }
        );
        previous
    }

    /// Fit a new model and publish it on success.
    ///
    /// Fitting happens outside the lock; on failure the current model stays
    /// in place untouched.
    pub fn refit(&self, engine: &RecommendationEngine, dataset: &Dataset) -> Result<Arc<FittedModel>> {
        match engine.fit(dataset) {
            Ok(model) => {
                let model = Arc::new(model);
                *self.current.write() = Some(Arc::clone(&model));
                info!("Refitted and published model on {} samples", dataset.len());
                Ok(model)
            }
            Err(e) => {
                warn!("Refit failed, keeping current model: {}", e);
                Err(e)
            }
        }
    }

    /// Query the published model.
    pub fn recommend(&self, raw: &[RawValue], k: i64) -> Result<Vec<String>> {
        self.current()?.recommend(raw, k)
    }

    pub fn recommend_neighbors(&self, raw: &[RawValue], k: i64) -> Result<Vec<Neighbor>> {
        self.current()?.recommend_neighbors(raw, k)
    }
}
