//! Model training stage
//!
//! The stage moves through `Loaded → Searched → Evaluated → Saved → Logged`
//! exactly once and in that order. The tracking run is opened before the data
//! is loaded and is closed on every exit path.

use super::metrics::EvaluationMetrics;
use super::model::{Classifier, LGBMClassifier};
use super::params::HyperParams;
use super::search::{RandomizedSearch, SearchOutcome};
use crate::config::{ArtifactPaths, Configuration, ModelTrainingConfig};
use crate::error::{PipelineError, Result};
use crate::tracking::{TrackingRun, TrackingSink};
use crate::utils::{load_csv, split_features_label, LABEL_COLUMN};
use ndarray::{Array1, Array2};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

/// Progress of a [`ModelTrainer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrainingStage {
    Started,
    Loaded,
    Searched,
    Evaluated,
    Saved,
    Logged,
}

impl TrainingStage {
    fn next(self) -> Option<Self> {
        match self {
            TrainingStage::Started => Some(TrainingStage::Loaded),
            TrainingStage::Loaded => Some(TrainingStage::Searched),
            TrainingStage::Searched => Some(TrainingStage::Evaluated),
            TrainingStage::Evaluated => Some(TrainingStage::Saved),
            TrainingStage::Saved => Some(TrainingStage::Logged),
            TrainingStage::Logged => None,
        }
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingStage::Started => "STARTED",
            TrainingStage::Loaded => "LOADED",
            TrainingStage::Searched => "SEARCHED",
            TrainingStage::Evaluated => "EVALUATED",
            TrainingStage::Saved => "SAVED",
            TrainingStage::Logged => "LOGGED",
        };
        f.write_str(name)
    }
}

/// Feature matrices and labels of both partitions
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
    pub feature_names: Vec<String>,
}

/// What a successful training run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: String,
    pub best_params: HyperParams,
    pub cv_score: f64,
    pub metrics: EvaluationMetrics,
    pub model_path: PathBuf,
}

pub struct ModelTrainer<'a> {
    paths: &'a ArtifactPaths,
    training: ModelTrainingConfig,
    stage: TrainingStage,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(config: &Configuration, paths: &'a ArtifactPaths) -> Result<Self> {
        Ok(Self::with_config(config.model_training()?, paths))
    }

    pub fn with_config(training: ModelTrainingConfig, paths: &'a ArtifactPaths) -> Self {
        Self {
            paths,
            training,
            stage: TrainingStage::Started,
        }
    }

    pub fn stage(&self) -> TrainingStage {
        self.stage
    }

    fn advance(&mut self, to: TrainingStage) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(PipelineError::TrainingError(format!(
                "cannot move from {} to {}",
                self.stage, to
            )));
        }
        self.stage = to;
        Ok(())
    }

    /// Read the processed artifacts and split off the label
    pub fn load_split_data(&mut self) -> Result<TrainingData> {
        info!("Loading training and testing data");
        let train_df = load_csv(&self.paths.processed_train_file)?;
        let test_df = load_csv(&self.paths.processed_test_file)?;

        let (x_train, y_train, feature_names) = split_features_label(&train_df, LABEL_COLUMN)?;
        let (x_test, y_test, test_names) = split_features_label(&test_df, LABEL_COLUMN)?;
        if feature_names != test_names {
            return Err(PipelineError::DataLoadError(format!(
                "train features {:?} differ from test features {:?}",
                feature_names, test_names
            )));
        }

        self.advance(TrainingStage::Loaded)?;
        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            features = feature_names.len(),
            "Data loaded successfully"
        );
        Ok(TrainingData {
            x_train,
            y_train,
            x_test,
            y_test,
            feature_names,
        })
    }

    /// Randomized search on the training partition only
    pub fn train_lgbm(&mut self, data: &TrainingData) -> Result<SearchOutcome<LGBMClassifier>> {
        info!("Starting hyperparameter tuning");
        let search = RandomizedSearch::new(self.training.search_space.clone(), self.training.controls.clone());
        let mut outcome = search.search_best::<LGBMClassifier>(&data.x_train, &data.y_train)?;
        outcome.model.set_feature_names(data.feature_names.clone());

        self.advance(TrainingStage::Searched)?;
        info!(
            best_params = ?outcome.best_params.to_param_map(),
            cv_score = outcome.best_score,
            "Model training completed successfully"
        );
        Ok(outcome)
    }

    /// Score `model` once on the held-out partition
    pub fn evaluate_model<M: Classifier>(&mut self, model: &M, data: &TrainingData) -> Result<EvaluationMetrics> {
        info!("Evaluating the model");
        let y_pred = model.predict(&data.x_test)?;
        let metrics = EvaluationMetrics::compute(&data.y_test, &y_pred)?;

        self.advance(TrainingStage::Evaluated)?;
        info!(
            "Accuracy: {:.2}, Precision: {:.2}, Recall: {:.2}, F1 Score: {:.2}",
            metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score
        );
        Ok(metrics)
    }

    pub fn save_model(&mut self, model: &LGBMClassifier) -> Result<PathBuf> {
        let path = self.paths.model_output.clone();
        info!(path = %path.display(), "Saving the model");
        model.save(&path)?;
        self.advance(TrainingStage::Saved)?;
        info!("Model saved successfully");
        Ok(path)
    }

    /// Run every step inside one tracking run
    pub fn run(&mut self, tracker: &mut dyn TrackingSink) -> Result<TrainingReport> {
        info!("Starting model training process");
        let outcome = self.run_tracked(tracker);
        match &outcome {
            Ok(report) => info!(run_id = %report.run_id, "Model training process completed successfully"),
            Err(e) => error!(stage = %self.stage, error = %e, "Model training process failed"),
        }
        outcome
    }

    fn run_tracked(&mut self, tracker: &mut dyn TrackingSink) -> Result<TrainingReport> {
        let mut run = TrackingRun::start(tracker, Some("lgbm-training"))?;
        let run_id = run.run_id().to_string();

        let data = self.load_split_data()?;
        let outcome = self.train_lgbm(&data)?;
        let metrics = self.evaluate_model(&outcome.model, &data)?;
        let model_path = self.save_model(&outcome.model)?;

        info!("Logging datasets, model, parameters and metrics");
        run.log_artifact(&self.paths.processed_train_file, "datasets")?;
        run.log_artifact(&self.paths.processed_test_file, "datasets")?;
        run.log_artifact(&model_path, "models")?;
        run.log_params(&outcome.model.params().to_param_map())?;
        run.log_metrics(&metrics.to_map())?;
        self.advance(TrainingStage::Logged)?;
        run.finish()?;

        Ok(TrainingReport {
            run_id,
            best_params: outcome.best_params,
            cv_score: outcome.best_score,
            metrics,
            model_path,
        })
    }
}
