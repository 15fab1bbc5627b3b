//! Integration tests for the nutrient similarity index.
//!
//! These tests exercise ingestion, fitting, querying and persistence through
//! the public API only.

use nutrient_index::{
    Dataset, EngineConfig, FittedModel, IndexError, ModelHandle, RawValue, RecommendationEngine,
    TrainingSample, evaluate, ingest, train_test_split,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_foods() -> Dataset {
    ingest::load_dataset(fixtures_path().join("foods.csv"), &EngineConfig::default())
        .expect("Failed to load fixture")
}

fn temp_model_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nutrient_index_{}_{}.json", name, std::process::id()))
}

fn numbers(values: [f64; 7]) -> Vec<RawValue> {
    values.into_iter().map(RawValue::from).collect()
}

fn texts(values: [&str; 7]) -> Vec<RawValue> {
    values.into_iter().map(RawValue::from).collect()
}

// ============================================================================
// Ingestion
// ============================================================================

#[test]
fn test_fixture_loads_and_drops_unnamed_rows() {
    let dataset = load_foods();

    assert_eq!(dataset.len(), 13);
    assert_eq!(dataset.samples()[0].label, "Amaranth seed, black");
    assert_eq!(dataset.samples()[12].label, "Milk, whole, cow");
    assert!(dataset.iter().all(|s| s.features.len() == 7));
}

#[test]
fn test_markers_after_numeric_rows_are_missing_values() {
    let config = EngineConfig::default();
    let dataset = ingest::load_dataset(fixtures_path().join("late_markers.csv"), &config)
        .expect("Late markers must not break loading");

    assert_eq!(dataset.len(), 121);
    let late = &dataset.samples()[120];
    assert_eq!(late.label, "late");
    assert_eq!(late.features[2], RawValue::from("12±1"));
    assert_eq!(late.features[6], RawValue::from("NA"));

    let engine = RecommendationEngine::new(config).unwrap();
    let model = engine.fit(&dataset).unwrap();
    // FIBINS cycles 1..=6 over the 120 complete rows
    assert_eq!(model.imputation().fill_value(6), Some(3.5));

    let query = texts(["150", "2", "12±1", "4", "1", "2", "NA"]);
    let neighbors = engine.recommend_neighbors(&model, &query, 1).unwrap();
    assert_eq!(neighbors[0].label, "late");
    assert_eq!(neighbors[0].distance, 0.0);
}

#[test]
fn test_missing_label_column_is_reported() {
    let config = EngineConfig::builder().label_column("Name").build().unwrap();
    let err = ingest::load_dataset(fixtures_path().join("foods.csv"), &config).unwrap_err();
    assert!(matches!(err, IndexError::ColumnNotFound(ref c) if c == "Name"));
}

// ============================================================================
// Fit and Recommend
// ============================================================================

#[test]
fn test_three_food_scenario() {
    let dataset = Dataset::from_samples(vec![
        TrainingSample::new("A", [100.0, 5.0, 10.0, 2.0, 1.0, 50.0, 1.0]),
        TrainingSample::new("B", [110.0, 6.0, 11.0, 2.0, 1.0, 55.0, 1.0]),
        TrainingSample::new("C", [500.0, 20.0, 60.0, 30.0, 5.0, 200.0, 10.0]),
    ]);

    let engine = RecommendationEngine::default();
    let model = engine.fit(&dataset).unwrap();
    let result = engine
        .recommend(&model, &numbers([105.0, 5.0, 10.0, 2.0, 1.0, 52.0, 1.0]), 2)
        .unwrap();

    assert_eq!(result, vec!["A", "B"]);
}

#[test]
fn test_fixture_model_imputes_medians() {
    let model = RecommendationEngine::default().fit(&load_foods()).unwrap();

    // FIBINS is observed for 11 of 13 foods
    let fibins: Vec<f64> = {
        let mut v = vec![
            5.64, 9.14, 9.98, 11.29, 9.71, 12.85, 6.98, 8.09, 1.93, 3.06, 1.72,
        ];
        v.sort_by(f64::total_cmp);
        v
    };
    assert_eq!(model.imputation().fill_value(6), Some(fibins[5]));
}

#[test]
fn test_exact_training_profile_ranks_itself_first() {
    let engine = RecommendationEngine::default();
    let model = engine.fit(&load_foods()).unwrap();

    let lentil = texts([
        "1329±14",
        "24.35±0.87",
        "48.49±1.50",
        "0.75±0.10",
        "10.43±0.41",
        "2.13±0.12",
        "8.09±0.44",
    ]);
    let neighbors = engine.recommend_neighbors(&model, &lentil, 5).unwrap();

    assert_eq!(neighbors.len(), 5);
    assert_eq!(neighbors[0].label, "Lentil dal");
    assert_eq!(neighbors[0].distance, 0.0);
    assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_leafy_vegetable_query() {
    let engine = RecommendationEngine::default();
    let model = engine.fit(&load_foods()).unwrap();

    let query = numbers([110.0, 2.5, 3.0, 0.5, 3.0, 2.0, 2.0]);
    let top: HashSet<String> = engine.recommend(&model, &query, 3).unwrap().into_iter().collect();

    let expected: HashSet<String> = ["Spinach", "Amaranth leaves, green", "Cabbage"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(top, expected);
}

#[test]
fn test_default_k_is_five() {
    let engine = RecommendationEngine::default();
    let model = engine.fit(&load_foods()).unwrap();
    let query = numbers([1400.0, 10.0, 60.0, 3.0, 10.0, 1.5, 9.0]);
    assert_eq!(engine.recommend_default(&model, &query).unwrap().len(), 5);
}

#[test]
fn test_query_errors() {
    let engine = RecommendationEngine::default();
    let model = engine.fit(&load_foods()).unwrap();

    let short: Vec<RawValue> = numbers([1.0; 7]).into_iter().take(6).collect();
    assert_eq!(
        engine.recommend(&model, &short, 5).unwrap_err().error_code(),
        "SCHEMA_MISMATCH"
    );
    assert_eq!(
        engine
            .recommend(&model, &numbers([1.0; 7]), -1)
            .unwrap_err()
            .error_code(),
        "INVALID_ARGUMENT"
    );
    assert!(engine.recommend(&model, &numbers([1.0; 7]), 0).unwrap().is_empty());
    assert_eq!(engine.recommend(&model, &numbers([1.0; 7]), 100).unwrap().len(), 13);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_and_load_gives_identical_results() {
    let engine = RecommendationEngine::default();
    let model = engine.fit(&load_foods()).unwrap();

    let path = temp_model_path("roundtrip");
    model.save(&path).expect("Save should succeed");
    assert!(path.exists());

    let loaded = FittedModel::load(&path).expect("Load should succeed");
    assert_eq!(loaded, model);

    let queries = [
        numbers([200.0, 10.0, 30.0, 5.0, 15.0, 900.0, 20.0]),
        numbers([1400.0, 10.0, 60.0, 3.0, 10.0, 1.5, 9.0]),
        texts(["NA", "3.1", "", "4±1", "-", "0.7", "n/a"]),
    ];
    for query in &queries {
        let expected = model.recommend_neighbors(query, 13).unwrap();
        let actual = loaded.recommend_neighbors(query, 13).unwrap();
        assert_eq!(actual, expected);
        for (a, e) in actual.iter().zip(&expected) {
            assert_eq!(a.distance.to_bits(), e.distance.to_bits());
        }
    }

    fs::remove_file(&path).ok();
}

#[test]
fn test_json_round_trip_keeps_labels() {
    let model = RecommendationEngine::default().fit(&load_foods()).unwrap();
    let json = model.to_json().unwrap();
    let restored = FittedModel::from_json(&json).unwrap();

    assert_eq!(restored.index().labels(), model.index().labels());
    assert_eq!(restored.metadata(), model.metadata());
}

#[test]
fn test_load_rejects_inconsistent_model() {
    let model = RecommendationEngine::default().fit(&load_foods()).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
    value["imputation"]["fill_values"]
        .as_array_mut()
        .unwrap()
        .pop();

    let err = FittedModel::from_json(&value.to_string()).unwrap_err();
    assert_eq!(err.error_code(), "CORRUPT_MODEL");
}

#[test]
fn test_load_missing_file() {
    let err = FittedModel::load(temp_model_path("does_not_exist")).unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
}

// ============================================================================
// Model Handle and Evaluation
// ============================================================================

#[test]
fn test_handle_lifecycle() {
    let engine = RecommendationEngine::default();
    let handle = ModelHandle::new();
    let query = numbers([110.0, 2.5, 3.0, 0.5, 3.0, 2.0, 2.0]);

    assert_eq!(handle.recommend(&query, 3).unwrap_err().error_code(), "NOT_FITTED");

    handle.refit(&engine, &load_foods()).unwrap();
    assert_eq!(handle.recommend(&query, 3).unwrap().len(), 3);

    // A failed refit leaves the published model in place
    let broken = Dataset::from_samples(vec![TrainingSample::new("only", [1.0; 7])]);
    assert!(handle.refit(&engine, &broken).is_err());
    assert_eq!(handle.current().unwrap().metadata().n_samples, 13);
}

#[test]
fn test_holdout_evaluation() {
    let config = EngineConfig::default();
    let dataset = load_foods();
    let (train, test) =
        train_test_split(&dataset, config.holdout_fraction, config.seed).unwrap();
    assert_eq!(train.len() + test.len(), 13);
    assert_eq!(test.len(), 3);

    let model = RecommendationEngine::new(config).unwrap().fit(&train).unwrap();
    let report = evaluate(&model, &test, 5).unwrap();

    assert_eq!(report.evaluated, 3);
    assert_eq!(report.skipped, 0);
    assert!(report.mean_nearest_distance > 0.0);
    assert!((0.0..=1.0).contains(&report.recall_at_k));
}
