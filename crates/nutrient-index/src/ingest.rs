//! Conversion of tabular food composition data into a [`Dataset`].
//!
//! Tables are read with Polars. CSV files are loaded with every column as
//! text, so a marker such as `NA` or a reading like `12.3±0.4` anywhere in a
//! column reaches the cell parser instead of breaking dtype inference. Numeric
//! columns of in-memory frames become number cells.

use crate::config::EngineConfig;
use crate::error::{IndexError, Result, ResultExt};
use crate::types::{Dataset, RawValue, TrainingSample};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Load a CSV file with a header row, keeping every column as strings.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    info!("Loading dataset from: {}", path.display());

    // No inference: all columns are read as String
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

/// Read one column as raw cells.
fn column_cells(df: &DataFrame, name: &str) -> Result<Vec<RawValue>> {
    let column = df
        .column(name)
        .map_err(|_| IndexError::ColumnNotFound(name.to_string()))?;
    let series = column.as_materialized_series();

    if is_numeric_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        Ok(floats.f64()?.into_iter().map(RawValue::from).collect())
    } else {
        let strings = series.cast(&DataType::String)?;
        Ok(strings
            .str()?
            .into_iter()
            .map(|cell| cell.map_or(RawValue::Null, RawValue::from))
            .collect())
    }
}

/// Build a dataset from the configured feature and label columns.
///
/// Rows without a label (null or blank) are dropped. Feature cells are kept
/// raw; missing and malformed values are resolved later by the imputer.
pub fn dataset_from_dataframe(df: &DataFrame, config: &EngineConfig) -> Result<Dataset> {
    let label_column = df
        .column(&config.label_column)
        .map_err(|_| IndexError::ColumnNotFound(config.label_column.clone()))?;
    let labels = label_column
        .as_materialized_series()
        .cast(&DataType::String)
        .context("Failed to read label column")?;
    let labels = labels.str()?;

    let columns = config
        .feature_columns
        .iter()
        .map(|name| column_cells(df, name))
        .collect::<Result<Vec<_>>>()?;

    let mut dataset = Dataset::new();
    let mut dropped = 0usize;
    for row in 0..df.height() {
        let label = match labels.get(row).map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => {
                dropped += 1;
                continue;
            }
        };
        let features = columns.iter().map(|cells| cells[row].clone()).collect();
        dataset.push(TrainingSample {
            label: label.to_string(),
            features,
        });
    }

    if dropped > 0 {
        warn!("Dropped {} rows without '{}'", dropped, config.label_column);
    }
    debug!(
        "Built dataset of {} samples from {} rows",
        dataset.len(),
        df.height()
    );
    Ok(dataset)
}

/// Load a CSV file and convert it into a dataset in one step.
pub fn load_dataset(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Dataset> {
    let df = load_csv(path)?;
    dataset_from_dataframe(&df, config)
}
