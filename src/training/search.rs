//! Randomized hyperparameter search with cross-validation
//!
//! Candidates are drawn from a [`SearchSpace`] with a seeded RNG, each one is
//! scored by stratified k-fold cross-validation on the training set, and the
//! best-scoring candidate is refit on the whole training set. Candidate fits
//! run on a dedicated rayon pool; selection happens after every worker has
//! joined.

use super::cross_validation::{CVSplit, StratifiedKFold};
use super::metrics;
use super::model::Classifier;
use super::params::HyperParams;
use super::search_space::{ParamSet, SearchSpace};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// Metric a candidate is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    #[default]
    Accuracy,
    PrecisionWeighted,
    RecallWeighted,
    F1Weighted,
}

impl Scoring {
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            Scoring::Accuracy => metrics::accuracy(y_true, y_pred),
            Scoring::PrecisionWeighted => metrics::precision_weighted(y_true, y_pred),
            Scoring::RecallWeighted => metrics::recall_weighted(y_true, y_pred),
            Scoring::F1Weighted => metrics::f1_weighted(y_true, y_pred),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scoring::Accuracy => "accuracy",
            Scoring::PrecisionWeighted => "precision_weighted",
            Scoring::RecallWeighted => "recall_weighted",
            Scoring::F1Weighted => "f1_weighted",
        };
        f.write_str(name)
    }
}

/// Controls of the randomized search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchControls {
    /// Number of sampled candidates
    pub n_iter: usize,
    /// Number of cross-validation folds
    pub cv: usize,
    /// Worker threads; -1 uses every core
    pub n_jobs: i32,
    /// 0 is silent, 1 logs the summary, 2 logs every candidate, 3 every fold
    pub verbose: u8,
    pub random_state: u64,
    pub scoring: Scoring,
}

impl Default for SearchControls {
    fn default() -> Self {
        Self {
            n_iter: 4,
            cv: 2,
            n_jobs: -1,
            verbose: 2,
            random_state: 42,
            scoring: Scoring::Accuracy,
        }
    }
}

impl SearchControls {
    pub fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(PipelineError::TrainingError("n_iter must be at least 1".into()));
        }
        if self.cv < 2 {
            return Err(PipelineError::TrainingError(format!(
                "cv must be at least 2, got {}",
                self.cv
            )));
        }
        Ok(())
    }

    /// Worker count for the candidate pool
    pub fn threads(&self) -> usize {
        match self.n_jobs {
            n if n < 0 => rayon::current_num_threads().max(1),
            0 => 1,
            n => n as usize,
        }
    }
}

/// Cross-validated result of one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
    pub index: usize,
    pub params: ParamSet,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Outcome of a search: the winning candidate refit on all training rows
#[derive(Debug)]
pub struct SearchOutcome<M> {
    pub best_index: usize,
    pub best_params: HyperParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateResult>,
    pub model: M,
}

pub struct RandomizedSearch {
    space: SearchSpace,
    controls: SearchControls,
    base_params: HyperParams,
}

impl RandomizedSearch {
    pub fn new(space: SearchSpace, controls: SearchControls) -> Self {
        Self {
            space,
            controls,
            base_params: HyperParams::default(),
        }
    }

    /// Parameters that candidates override; `random_state` follows the controls
    pub fn with_base_params(mut self, params: HyperParams) -> Self {
        self.base_params = params;
        self
    }

    pub fn controls(&self) -> &SearchControls {
        &self.controls
    }

    /// The `n_iter` candidates, in sampling order
    pub fn sample_candidates(&self) -> Vec<ParamSet> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.controls.random_state);
        (0..self.controls.n_iter)
            .map(|_| self.space.sample(&mut rng))
            .collect()
    }

    fn candidate_params(&self, set: &ParamSet) -> Result<HyperParams> {
        let mut base = self.base_params.clone();
        base.random_state = self.controls.random_state;
        base.with_overrides(set)
    }

    /// Score every candidate and refit the best one on `x`/`y`
    pub fn search_best<M: Classifier>(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome<M>> {
        self.controls.validate()?;
        self.space.validate()?;
        if x.nrows() != y.len() {
            return Err(PipelineError::TrainingError(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let folds = StratifiedKFold::new(self.controls.cv).split(y)?;
        let candidates = self.sample_candidates();
        let verbose = self.controls.verbose;
        if verbose >= 1 {
            info!(
                folds = folds.len(),
                candidates = candidates.len(),
                fits = folds.len() * candidates.len(),
                scoring = %self.controls.scoring,
                "Starting randomized search"
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.controls.threads())
            .build()
            .map_err(|e| PipelineError::TrainingError(format!("failed to build worker pool: {}", e)))?;

        let start = Instant::now();
        let results: Vec<CandidateResult> = pool.install(|| {
            candidates
                .par_iter()
                .enumerate()
                .map(|(index, set)| self.evaluate_candidate::<M>(index, set, x, y, &folds))
                .collect::<Result<Vec<_>>>()
        })?;

        let best_index = select_best(&results)
            .ok_or_else(|| PipelineError::TrainingError("search produced no candidates".into()))?;
        let best = &results[best_index];
        if verbose >= 1 {
            info!(
                best_index,
                best_score = best.mean_score,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Randomized search finished"
            );
        }

        let best_params = self.candidate_params(&best.params)?;
        let mut model = M::with_params(best_params.clone());
        model.fit(x, y)?;

        Ok(SearchOutcome {
            best_index,
            best_params,
            best_score: best.mean_score,
            candidates: results,
            model,
        })
    }

    fn evaluate_candidate<M: Classifier>(
        &self,
        index: usize,
        set: &ParamSet,
        x: &Array2<f64>,
        y: &Array1<f64>,
        folds: &[CVSplit],
    ) -> Result<CandidateResult> {
        let params = self.candidate_params(set)?;
        let mut fold_scores = Vec::with_capacity(folds.len());

        for fold in folds {
            let x_train = x.select(Axis(0), &fold.train_indices);
            let y_train = y.select(Axis(0), &fold.train_indices);
            let x_val = x.select(Axis(0), &fold.test_indices);
            let y_val = y.select(Axis(0), &fold.test_indices);

            let mut model = M::with_params(params.clone());
            model.fit(&x_train, &y_train)?;
            let score = self.controls.scoring.score(&y_val, &model.predict(&x_val)?);
            if self.controls.verbose >= 3 {
                debug!(candidate = index, fold = fold.fold_idx, score, "Fold scored");
            }
            fold_scores.push(score);
        }

        let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        if self.controls.verbose >= 2 {
            info!(candidate = index, params = ?set, mean_score, "Candidate scored");
        }
        Ok(CandidateResult {
            index,
            params: set.clone(),
            fold_scores,
            mean_score,
        })
    }
}

/// Index of the highest mean score; the earliest candidate wins ties and NaN
/// never wins.
fn select_best(results: &[CandidateResult]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for r in results {
        let score = if r.mean_score.is_nan() { f64::NEG_INFINITY } else { r.mean_score };
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((r.index, score)),
        }
    }
    best.map(|(i, _)| i)
}
