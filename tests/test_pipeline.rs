//! Integration test: processing, training, tracking and the full pipeline

use booking_pipeline::config::{ArtifactPaths, ModelTrainingConfig};
use booking_pipeline::error::{ErrorKind, PipelineError};
use booking_pipeline::storage::LocalBlobStore;
use booking_pipeline::tracking::{LocalTracker, RunStatus};
use booking_pipeline::training::{
    Classifier, HyperParams, LGBMClassifier, ModelTrainer, ParamDistribution, RandomizedSearch, SearchControls,
    SearchSpace, TrainingStage,
};
use booking_pipeline::utils::{load_csv, split_features_label, LABEL_COLUMN};
use booking_pipeline::TrainingPipeline;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BUCKET: &str = "hotel-data";
const OBJECT: &str = "Hotel_Reservations.csv";

fn raw_csv(rows: usize, with_label: bool) -> String {
    let mut csv = String::from("Booking_ID,lead_time,avg_price_per_room,room_type_reserved,no_of_special_requests");
    if with_label {
        csv.push_str(",booking_status");
    }
    csv.push('\n');
    for i in 0..rows {
        let lead_time = (i * 37) % 250;
        csv.push_str(&format!(
            "INN{:05},{},{:.2},Room_Type {},{}",
            i,
            lead_time,
            70.0 + i as f64 * 0.75,
            1 + i % 3,
            i % 4
        ));
        if with_label {
            let status = if lead_time > 120 { "Canceled" } else { "Not_Canceled" };
            csv.push_str(&format!(",{}", status));
        }
        csv.push('\n');
    }
    csv
}

fn pipeline_yaml() -> String {
    format!(
        r#"
data_ingestion:
  bucket_name: {}
  bucket_file_name: {}
  train_ratio: 0.8
data_processing:
  categorical_columns: [room_type_reserved, booking_status]
  no_of_features: 3
model_training:
  params:
    n_estimators: {{type: randint, low: 5, high: 15}}
    num_leaves: {{type: randint, low: 4, high: 8}}
    learning_rate: {{type: uniform, loc: 0.1, scale: 0.1}}
    min_child_samples: {{type: choice, values: [5]}}
  random_search:
    n_iter: 2
    cv: 2
    n_jobs: 1
    verbose: 0
tracking:
  experiment_name: it-booking
"#,
        BUCKET, OBJECT
    )
}

struct Workspace {
    _store_dir: TempDir,
    _work_dir: TempDir,
    store_root: std::path::PathBuf,
    config_path: std::path::PathBuf,
    paths: ArtifactPaths,
}

fn workspace(raw: &str, yaml: &str) -> Workspace {
    let store_dir = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let bucket = store_dir.path().join(BUCKET);
    fs::create_dir_all(&bucket).unwrap();
    fs::write(bucket.join(OBJECT), raw).unwrap();

    let config_path = work_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();
    Workspace {
        store_root: store_dir.path().to_path_buf(),
        paths: ArtifactPaths::new(work_dir.path()),
        config_path,
        _store_dir: store_dir,
        _work_dir: work_dir,
    }
}

fn pipeline(ws: &Workspace) -> TrainingPipeline {
    TrainingPipeline::new(&ws.config_path, ws.paths.clone()).with_blob_store(Box::new(LocalBlobStore::new(&ws.store_root)))
}

/// Processed tables written straight to their artifact locations
fn write_processed(paths: &ArtifactPaths, train_labels: &[f64], test_labels: &[f64]) {
    fs::create_dir_all(&paths.processed_dir).unwrap();
    for (path, labels) in [
        (&paths.processed_train_file, train_labels),
        (&paths.processed_test_file, test_labels),
    ] {
        let mut csv = format!("lead_time,avg_price_per_room,{}\n", LABEL_COLUMN);
        for (i, label) in labels.iter().enumerate() {
            let lead_time = if *label == 1.0 { 150.0 + i as f64 } else { 10.0 + i as f64 };
            csv.push_str(&format!("{},{},{}\n", lead_time, 80.0 + (i % 7) as f64, label));
        }
        fs::write(path, csv).unwrap();
    }
}

fn small_training(n_iter: usize, cv: usize) -> ModelTrainingConfig {
    ModelTrainingConfig {
        search_space: SearchSpace::new()
            .with("n_estimators", ParamDistribution::randint(3, 10))
            .with("num_leaves", ParamDistribution::randint(2, 6))
            .with("learning_rate", ParamDistribution::uniform(0.05, 0.2))
            .with("min_child_samples", ParamDistribution::choice([3i64])),
        controls: SearchControls {
            n_iter,
            cv,
            n_jobs: 1,
            verbose: 0,
            ..SearchControls::default()
        },
    }
}

fn alternating(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i % 2) as f64).collect()
}

#[test]
fn test_full_pipeline_run() {
    let ws = workspace(&raw_csv(150, true), &pipeline_yaml());
    let report = pipeline(&ws).run().unwrap();

    assert_eq!(report.split.total_rows, 150);
    assert_eq!(report.split.train_rows, 120);
    assert_eq!(report.split.test_rows, 30);
    assert_eq!(report.processed_train, ws.paths.processed_train_file);
    assert_eq!(report.training.model_path, ws.paths.model_output);

    let processed = load_csv(&ws.paths.processed_train_file).unwrap();
    let names: Vec<String> = processed.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names.len(), 4);
    assert_eq!(names.last().map(String::as_str), Some(LABEL_COLUMN));

    let metrics = &report.training.metrics;
    for value in [metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score] {
        assert!((0.0..=1.0).contains(&value));
    }

    let model = LGBMClassifier::load(&ws.paths.model_output).unwrap();
    let test = load_csv(&ws.paths.processed_test_file).unwrap();
    let (x_test, _, _) = split_features_label(&test, LABEL_COLUMN).unwrap();
    assert_eq!(model.predict(&x_test).unwrap().len(), 30);

    let tracker = LocalTracker::new(&ws.paths.tracking_dir, "it-booking");
    let runs = tracker.list_runs().unwrap();
    assert_eq!(runs, vec![report.training.run_id.clone()]);
    let record = tracker.load_run(&runs[0]).unwrap();
    assert_eq!(record.status, RunStatus::Finished);
    assert_eq!(record.metrics["accuracy"], metrics.accuracy);
    assert_eq!(record.params, report.training.best_params.to_param_map());
    assert!(record.artifacts.contains(&"models/lgbm_model.pkl".to_string()));
    assert!(record.artifacts.contains(&"datasets/train_processed.csv".to_string()));
    assert!(record.artifacts.contains(&"datasets/test_processed.csv".to_string()));
}

#[test]
fn test_stages_can_run_separately() {
    let ws = workspace(&raw_csv(150, true), &pipeline_yaml());
    let pipeline = pipeline(&ws);

    let split = pipeline.ingest().unwrap();
    assert_eq!(split.train_rows, 120);
    let (train, test) = pipeline.process().unwrap();
    assert!(train.is_file() && test.is_file());
    let report = pipeline.train().unwrap();
    assert!(report.model_path.is_file());
}

#[test]
fn test_missing_config_creates_nothing() {
    let ws = workspace(&raw_csv(10, true), "");
    let pipeline = TrainingPipeline::new(ws.paths.root().join("absent.yaml"), ws.paths.clone())
        .with_blob_store(Box::new(LocalBlobStore::new(&ws.store_root)));

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::ConfigNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(!ws.paths.artifacts_dir().exists());
    assert!(!ws.paths.tracking_dir.exists());
}

#[test]
fn test_missing_label_stops_before_training() {
    let ws = workspace(&raw_csv(60, false), &pipeline_yaml());
    let err = pipeline(&ws).run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DataLoad);
    assert!(ws.paths.train_file.is_file());
    assert!(!ws.paths.processed_train_file.exists());
    assert!(!ws.paths.model_output.exists());
    assert!(!ws.paths.tracking_dir.exists());
}

#[test]
fn test_constant_label_scores_perfectly() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path());
    write_processed(&paths, &[1.0; 40], &[1.0; 10]);

    let mut tracker = LocalTracker::new(&paths.tracking_dir, "constant");
    let mut trainer = ModelTrainer::with_config(small_training(1, 2), &paths);
    let report = trainer.run(&mut tracker).unwrap();

    assert_eq!(trainer.stage(), TrainingStage::Logged);
    assert_eq!(report.metrics.accuracy, 1.0);
    assert_eq!(report.metrics.precision, 1.0);
    assert_eq!(report.metrics.recall, 1.0);
    assert_eq!(report.metrics.f1_score, 1.0);
}

#[test]
fn test_single_candidate_is_selected() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path());
    write_processed(&paths, &alternating(40), &alternating(10));

    let training = small_training(1, 3);
    let candidates = RandomizedSearch::new(training.search_space.clone(), training.controls.clone()).sample_candidates();
    assert_eq!(candidates.len(), 1);
    let mut expected = HyperParams::default();
    expected.random_state = training.controls.random_state;
    let expected = expected.with_overrides(&candidates[0]).unwrap();

    let mut tracker = LocalTracker::new(&paths.tracking_dir, "single");
    let report = ModelTrainer::with_config(training, &paths).run(&mut tracker).unwrap();
    assert_eq!(report.best_params, expected);

    let saved = LGBMClassifier::load(&paths.model_output).unwrap();
    assert_eq!(saved.params(), &expected);
}

#[test]
fn test_failed_training_marks_run_failed() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path());
    write_processed(&paths, &alternating(12), &alternating(4));

    let mut tracker = LocalTracker::new(&paths.tracking_dir, "failing");
    let mut trainer = ModelTrainer::with_config(small_training(1, 10), &paths);
    let err = trainer.run(&mut tracker).unwrap_err();
    assert!(matches!(err, PipelineError::TrainingError(_)));
    assert_eq!(trainer.stage(), TrainingStage::Loaded);
    assert!(!paths.model_output.exists());
    assert!(tracker.active_run_id().is_none());

    let runs = tracker.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    let record = tracker.load_run(&runs[0]).unwrap();
    assert_eq!(record.status, RunStatus::Failed);
    assert!(record.end_time.is_some());
    assert!(record.metrics.is_empty());
}

#[test]
fn test_training_is_reproducible() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path());
    write_processed(&paths, &alternating(40), &alternating(10));

    let mut tracker = LocalTracker::new(&paths.tracking_dir, "repro");
    let first = ModelTrainer::with_config(small_training(3, 2), &paths).run(&mut tracker).unwrap();
    let first_model = fs::read(&paths.model_output).unwrap();
    let second = ModelTrainer::with_config(small_training(3, 2), &paths).run(&mut tracker).unwrap();

    assert_eq!(first.best_params, second.best_params);
    assert_eq!(first.cv_score, second.cv_score);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first_model, fs::read(&paths.model_output).unwrap());
    assert_ne!(first.run_id, second.run_id);
    assert!(Path::new(&tracker.run_dir(&second.run_id)).join("meta.json").is_file());
}

#[test]
fn test_processed_artifact_without_label_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path());
    fs::create_dir_all(&paths.processed_dir).unwrap();
    fs::write(&paths.processed_train_file, "lead_time,avg_price_per_room\n1,2\n3,4\n").unwrap();
    fs::write(&paths.processed_test_file, "lead_time,avg_price_per_room\n5,6\n").unwrap();

    let mut tracker = LocalTracker::new(&paths.tracking_dir, "no-label");
    let mut trainer = ModelTrainer::with_config(small_training(1, 2), &paths);
    let err = trainer.run(&mut tracker).unwrap_err();

    assert!(matches!(err, PipelineError::DataLoadError(_)));
    assert_eq!(trainer.stage(), TrainingStage::Started);
    assert!(!paths.model_output.exists());
    assert!(!paths.root().join("artifacts/models").exists());
}
