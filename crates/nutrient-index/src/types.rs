//! Core data types: raw cells, the feature schema, samples and datasets.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nutrient columns of the food composition table, in schema order.
pub const NUTRIENT_COLUMNS: [&str; 7] = [
    "ENERC", "PROTCNT", "CHOAVLDF", "FATCE", "FIBTG", "ASH", "FIBINS",
];

/// Human readable names for [`NUTRIENT_COLUMNS`].
pub const NUTRIENT_DESCRIPTIONS: [&str; 7] = [
    "energy",
    "protein",
    "available carbohydrate",
    "fat",
    "total dietary fiber",
    "ash",
    "insoluble fiber",
];

/// A raw cell as handed over by ingestion, before any cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Empty cell
    Null,
    /// Cell already typed as a number
    Number(f64),
    /// Textual cell, e.g. `"12.3±0.4"` or `"NA"`
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawValue::Null, RawValue::Number)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Ordered names of the feature dimensions shared by fit and query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from an ordered list of dimension names.
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    /// The seven-dimension nutrient schema.
    pub fn nutrients() -> Self {
        Self::new(NUTRIENT_COLUMNS)
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Name of the dimension at `index`.
    pub fn name(&self, index: usize) -> &str {
        self.features.get(index).map_or("<unknown>", String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.features
    }

    /// Fail with [`IndexError::SchemaMismatch`] unless `actual` equals the
    /// schema width.
    pub fn check_width(&self, context: impl Into<String>, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(IndexError::schema_mismatch(context, self.len(), actual));
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::nutrients()
    }
}

/// One labelled row of raw training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub label: String,
    pub features: Vec<RawValue>,
}

impl TrainingSample {
    pub fn new<I, V>(label: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        Self {
            label: label.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered collection of training samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    samples: Vec<TrainingSample>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: TrainingSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingSample> {
        self.samples.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.label.clone()).collect()
    }
}

impl FromIterator<TrainingSample> for Dataset {
    fn from_iter<T: IntoIterator<Item = TrainingSample>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// A neighbor returned by an index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Insertion position of the row in the training data
    pub row: usize,
    pub label: String,
    /// Euclidean distance in standardized space
    pub distance: f64,
}
