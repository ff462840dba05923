//! Model training
//!
//! - [`model`]: the `Classifier` capability and the gradient boosting learner
//! - [`search_space`], [`search`], [`cross_validation`]: randomized search
//! - [`metrics`]: held-out evaluation
//! - [`trainer`]: the training stage state machine

pub mod cross_validation;
pub mod metrics;
pub mod model;
pub mod params;
pub mod search;
pub mod search_space;
pub mod trainer;

pub use cross_validation::{CVSplit, StratifiedKFold};
pub use metrics::EvaluationMetrics;
pub use model::{Classifier, LGBMClassifier};
pub use params::{BoostingType, HyperParams};
pub use search::{CandidateResult, RandomizedSearch, Scoring, SearchControls, SearchOutcome};
pub use search_space::{ParamDistribution, ParamSet, ParamValue, SearchSpace};
pub use trainer::{ModelTrainer, TrainingData, TrainingReport, TrainingStage};
