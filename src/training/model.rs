//! LightGBM-style gradient boosting classifier
//!
//! Trees are grown leaf-wise (best-first) on histograms of quantized
//! features. Binary problems fit one logistic booster; more than two classes
//! fit one booster per class and predict the class with the largest score.

use super::params::{BoostingType, HyperParams};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs;
use std::path::Path;

/// Upper bound on histogram bins per feature (fits in a `u8`)
const MAX_BIN: usize = 255;
const MIN_SUM_HESSIAN: f64 = 1e-3;

/// Capability the search and training stage need from a learner
pub trait Classifier: Send + Sized {
    /// Unfitted model configured with `params`
    fn with_params(params: HyperParams) -> Self;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    fn params(&self) -> &HyperParams;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Missing values (NaN) always go right
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

// ---- Feature quantization ----

/// Feature matrix quantized into per-feature histogram bins
struct BinnedMatrix {
    /// `bins[feature][row]`
    bins: Vec<Vec<u8>>,
    /// `upper_bounds[feature][bin]`, the last bound is always +inf
    upper_bounds: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    fn from_features(x: &Array2<f64>) -> Self {
        let (bins, upper_bounds): (Vec<Vec<u8>>, Vec<Vec<f64>>) = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let column = x.column(j);
                let bounds = bin_bounds(column.iter().copied());
                let bins: Vec<u8> = column.iter().map(|&v| bin_of(&bounds, v)).collect();
                (bins, bounds)
            })
            .unzip();
        Self { bins, upper_bounds }
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.upper_bounds[feature].len()
    }
}

fn bin_bounds(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();

    let mut bounds = Vec::new();
    if distinct.len() <= MAX_BIN {
        bounds.extend(distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    } else {
        // Quantile cuts, each placed halfway to the next distinct value
        let n = sorted.len();
        for k in 1..MAX_BIN {
            let v = sorted[k * n / MAX_BIN];
            let pos = distinct.partition_point(|&d| d <= v);
            if pos < distinct.len() {
                let cut = (v + distinct[pos]) / 2.0;
                if bounds.last().map_or(true, |&last| cut > last) {
                    bounds.push(cut);
                }
            }
        }
    }
    bounds.push(f64::INFINITY);
    bounds
}

fn bin_of(bounds: &[f64], value: f64) -> u8 {
    if value.is_nan() {
        return (bounds.len() - 1) as u8;
    }
    bounds.partition_point(|&b| b < value) as u8
}

// ---- Split finding ----

#[derive(Debug, Clone, Copy, Default)]
struct BinStats {
    grad: f64,
    hess: f64,
    count: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    threshold: f64,
    gain: f64,
}

struct PendingSplit {
    node: usize,
    split: SplitCandidate,
}

impl PartialEq for PendingSplit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingSplit {}

impl PartialOrd for PendingSplit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingSplit {
    // Highest gain first, older node first on ties
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .gain
            .total_cmp(&other.split.gain)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g.abs() <= alpha {
        0.0
    } else {
        g - alpha * g.signum()
    }
}

fn leaf_objective(g: f64, h: f64, params: &HyperParams) -> f64 {
    let denom = h + params.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    let g = soft_threshold(g, params.reg_alpha);
    g * g / denom
}

fn leaf_value(g: f64, h: f64, params: &HyperParams) -> f64 {
    let denom = h + params.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    -soft_threshold(g, params.reg_alpha) / denom
}

fn sums(rows: &[usize], grad: &[f64], hess: &[f64]) -> (f64, f64) {
    rows.iter().fold((0.0, 0.0), |(g, h), &r| (g + grad[r], h + hess[r]))
}

fn best_split(
    data: &BinnedMatrix,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    features: &[usize],
    params: &HyperParams,
) -> Option<SplitCandidate> {
    if rows.len() < params.min_child_samples * 2 {
        return None;
    }
    let (g_total, h_total) = sums(rows, grad, hess);
    let parent = leaf_objective(g_total, h_total, params);

    let per_feature: Vec<Option<SplitCandidate>> = features
        .par_iter()
        .map(|&feature| {
            best_split_for_feature(data, grad, hess, rows, feature, (g_total, h_total, parent), params)
        })
        .collect();

    // Features are scanned in a fixed order; the first best one wins
    let mut best: Option<SplitCandidate> = None;
    for candidate in per_feature.into_iter().flatten() {
        if best.map_or(true, |b| candidate.gain > b.gain) {
            best = Some(candidate);
        }
    }
    best
}

fn best_split_for_feature(
    data: &BinnedMatrix,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    feature: usize,
    (g_total, h_total, parent): (f64, f64, f64),
    params: &HyperParams,
) -> Option<SplitCandidate> {
    let n_bins = data.n_bins(feature);
    if n_bins < 2 {
        return None;
    }

    let bins = &data.bins[feature];
    let mut hist = vec![BinStats::default(); n_bins];
    for &r in rows {
        let slot = &mut hist[bins[r] as usize];
        slot.grad += grad[r];
        slot.hess += hess[r];
        slot.count += 1;
    }

    let mut left = BinStats::default();
    let mut best: Option<(usize, f64)> = None;
    for (bin, stats) in hist.iter().enumerate().take(n_bins - 1) {
        left.grad += stats.grad;
        left.hess += stats.hess;
        left.count += stats.count;

        if stats.count == 0 || left.count < params.min_child_samples {
            continue;
        }
        let right_count = rows.len() - left.count;
        if right_count < params.min_child_samples {
            break;
        }
        let right_grad = g_total - left.grad;
        let right_hess = h_total - left.hess;
        if left.hess < MIN_SUM_HESSIAN || right_hess < MIN_SUM_HESSIAN {
            continue;
        }

        let gain = leaf_objective(left.grad, left.hess, params)
            + leaf_objective(right_grad, right_hess, params)
            - parent;
        if gain > best.map_or(0.0, |(_, g)| g) {
            best = Some((bin, gain));
        }
    }

    best.map(|(bin, gain)| SplitCandidate {
        feature,
        bin,
        threshold: data.upper_bounds[feature][bin],
        gain,
    })
}

// ---- Tree growth ----

enum Slot {
    Leaf(Vec<usize>),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Leaf-wise growth: always split the leaf with the largest gain next
fn grow_tree(
    data: &BinnedMatrix,
    grad: &[f64],
    hess: &[f64],
    rows: Vec<usize>,
    features: &[usize],
    params: &HyperParams,
) -> TreeNode {
    let max_depth = params.max_depth.unwrap_or(usize::MAX);
    let mut heap = BinaryHeap::new();
    if let Some(split) = best_split(data, grad, hess, &rows, features, params) {
        heap.push(PendingSplit { node: 0, split });
    }

    let mut slots = vec![Slot::Leaf(rows)];
    let mut depths = vec![0usize];
    let mut n_leaves = 1;

    while n_leaves < params.num_leaves {
        let Some(PendingSplit { node, split }) = heap.pop() else {
            break;
        };
        let rows = match std::mem::replace(&mut slots[node], Slot::Leaf(Vec::new())) {
            Slot::Leaf(rows) => rows,
            other => {
                slots[node] = other;
                continue;
            }
        };

        let bins = &data.bins[split.feature];
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| (bins[r] as usize) <= split.bin);

        let depth = depths[node] + 1;
        let left = slots.len();
        slots[node] = Slot::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right: left + 1,
        };

        for child_rows in [left_rows, right_rows] {
            let id = slots.len();
            if depth < max_depth {
                if let Some(split) = best_split(data, grad, hess, &child_rows, features, params) {
                    heap.push(PendingSplit { node: id, split });
                }
            }
            slots.push(Slot::Leaf(child_rows));
            depths.push(depth);
        }
        n_leaves += 1;
    }

    assemble(&slots, 0, grad, hess, params)
}

fn assemble(slots: &[Slot], id: usize, grad: &[f64], hess: &[f64], params: &HyperParams) -> TreeNode {
    match &slots[id] {
        Slot::Leaf(rows) => {
            let (g, h) = sums(rows, grad, hess);
            TreeNode::Leaf {
                value: leaf_value(g, h, params) * params.learning_rate,
            }
        }
        Slot::Split { feature, threshold, left, right } => TreeNode::Split {
            feature: *feature,
            threshold: *threshold,
            left: Box::new(assemble(slots, *left, grad, hess, params)),
            right: Box::new(assemble(slots, *right, grad, hess, params)),
        },
    }
}

// ---- Row and column sampling ----

/// Gradient-based one-side sampling: keep the largest gradients, sample the
/// rest and up-weight the sampled small-gradient rows.
fn goss_rows(grad: &[f64], params: &HyperParams, rng: &mut Xoshiro256PlusPlus) -> (Vec<usize>, Vec<f64>) {
    let n = grad.len();
    let n_top = ((n as f64 * params.top_rate).ceil() as usize).min(n);
    let n_other = ((n as f64 * params.other_rate).ceil() as usize).min(n - n_top);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| grad[b].abs().total_cmp(&grad[a].abs()).then(a.cmp(&b)));
    let mut rest = order.split_off(n_top);
    rest.shuffle(rng);
    rest.truncate(n_other);

    let mut weights = vec![1.0; n];
    if n_other > 0 && params.other_rate > 0.0 {
        let amplify = (1.0 - params.top_rate) / params.other_rate;
        for &r in &rest {
            weights[r] = amplify;
        }
    }

    order.extend(rest);
    order.sort_unstable();
    (order, weights)
}

fn bagging_rows(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = ((n as f64 * fraction).ceil() as usize).clamp(1, n);
    let mut rows: Vec<usize> = (0..n).collect();
    rows.shuffle(rng);
    rows.truncate(k);
    rows.sort_unstable();
    rows
}

fn sample_features(n_features: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let mut features: Vec<usize> = (0..n_features).collect();
    if fraction < 1.0 {
        let k = ((n_features as f64 * fraction).ceil() as usize).clamp(1, n_features);
        features.shuffle(rng);
        features.truncate(k);
        features.sort_unstable();
    }
    features
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// ---- Logistic booster ----

/// One-vs-rest logistic booster over a 0/1 target
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinaryBooster {
    base_score: f64,
    trees: Vec<TreeNode>,
}

impl BinaryBooster {
    fn fit(data: &BinnedMatrix, x: &Array2<f64>, target: &[f64], params: &HyperParams) -> Result<Self> {
        let n = target.len();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.random_state);

        let p = (target.iter().sum::<f64>() / n as f64).clamp(1e-7, 1.0 - 1e-7);
        let base_score = (p / (1.0 - p)).ln();
        let mut raw = vec![base_score; n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for (&score, &t) in raw.iter().zip(target) {
                let prob = sigmoid(score);
                grad.push(prob - t);
                hess.push((prob * (1.0 - prob)).max(1e-16));
            }

            let rows = match params.boosting_type {
                BoostingType::Goss => {
                    let (rows, weights) = goss_rows(&grad, params, &mut rng);
                    for &r in &rows {
                        grad[r] *= weights[r];
                        hess[r] *= weights[r];
                    }
                    rows
                }
                BoostingType::Gbdt if params.subsample < 1.0 => bagging_rows(n, params.subsample, &mut rng),
                BoostingType::Gbdt => (0..n).collect(),
            };
            let features = sample_features(x.ncols(), params.colsample_bytree, &mut rng);

            let tree = grow_tree(data, &grad, &hess, rows, &features, params);
            for (score, row) in raw.iter_mut().zip(x.rows()) {
                *score += tree.predict(row);
            }
            if raw.iter().any(|v| !v.is_finite()) {
                return Err(PipelineError::TrainingError(format!(
                    "boosting diverged at round {}: non-finite raw scores",
                    round
                )));
            }
            trees.push(tree);
        }

        Ok(Self { base_score, trees })
    }

    fn raw_score(&self, row: ArrayView1<f64>) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

// ============ Classifier ============

/// Gradient boosted decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LGBMClassifier {
    params: HyperParams,
    classes: Vec<f64>,
    boosters: Vec<BinaryBooster>,
    n_features: usize,
    feature_names: Vec<String>,
}

impl LGBMClassifier {
    pub fn new(params: HyperParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            boosters: Vec::new(),
            n_features: 0,
            feature_names: Vec::new(),
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }

    pub fn set_feature_names(&mut self, names: Vec<String>) {
        self.feature_names = names;
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Sorted distinct labels seen during `fit`
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.boosters.iter().map(|b| b.trees.len()).sum()
    }

    /// Write the fitted model as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let save_err = |source: std::io::Error| PipelineError::SaveError {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(save_err)?;
        }
        let json = serde_json::to_vec(self).map_err(|e| save_err(std::io::Error::other(e)))?;
        fs::write(path, json).map_err(save_err)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| PipelineError::DataLoadError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::DataLoadError(format!("{}: {}", path.display(), e)))
    }
}

fn distinct_labels(y: &Array1<f64>) -> Result<Vec<f64>> {
    if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
        return Err(PipelineError::TrainingError(format!("non-finite label {}", bad)));
    }
    // `+ 0.0` folds -0.0 into 0.0
    let mut classes: Vec<f64> = y.iter().map(|&v| v + 0.0).collect();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    Ok(classes)
}

impl Classifier for LGBMClassifier {
    fn with_params(params: HyperParams) -> Self {
        Self::new(params)
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(PipelineError::TrainingError("empty training set".into()));
        }
        if x.ncols() == 0 {
            return Err(PipelineError::TrainingError("training set has no features".into()));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::TrainingError(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        self.params.validate()?;

        let classes = distinct_labels(y)?;
        let data = BinnedMatrix::from_features(x);
        let indicator = |class: f64| -> Vec<f64> {
            y.iter().map(|&v| if v + 0.0 == class { 1.0 } else { 0.0 }).collect()
        };

        let boosters = match classes.len() {
            1 => Vec::new(),
            2 => vec![BinaryBooster::fit(&data, x, &indicator(classes[1]), &self.params)?],
            _ => classes
                .iter()
                .map(|&c| BinaryBooster::fit(&data, x, &indicator(c), &self.params))
                .collect::<Result<Vec<_>>>()?,
        };

        self.classes = classes;
        self.boosters = boosters;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(PipelineError::TrainingError("model not fitted".into()));
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::TrainingError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let labels = x
            .rows()
            .into_iter()
            .map(|row| match self.boosters.len() {
                0 => self.classes[0],
                1 => {
                    if self.boosters[0].raw_score(row) >= 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                }
                _ => {
                    let mut best = 0;
                    let mut best_score = f64::NEG_INFINITY;
                    for (k, booster) in self.boosters.iter().enumerate() {
                        let score = booster.raw_score(row);
                        if score > best_score {
                            best = k;
                            best_score = score;
                        }
                    }
                    self.classes[best]
                }
            })
            .collect();
        Ok(labels)
    }

    fn params(&self) -> &HyperParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| (i as f64) / 100.0).collect()).unwrap();
        let y = Array1::from_vec((0..100).map(|i| if i < 50 { 0.0 } else { 1.0 }).collect());
        (x, y)
    }

    fn small_params() -> HyperParams {
        HyperParams {
            n_estimators: 30,
            num_leaves: 8,
            min_child_samples: 2,
            ..Default::default()
        }
    }

    fn accuracy(pred: &Array1<f64>, y: &Array1<f64>) -> f64 {
        pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count() as f64 / y.len() as f64
    }

    #[test]
    fn test_binary_classifier() {
        let (x, y) = make_classification_data();
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        let acc = accuracy(&preds, &y);
        assert!(acc > 0.9, "Accuracy too low: {}", acc);
    }

    #[test]
    fn test_goss_classifier() {
        let (x, y) = make_classification_data();
        let params = HyperParams {
            boosting_type: BoostingType::Goss,
            top_rate: 0.3,
            other_rate: 0.2,
            ..small_params()
        };
        let mut model = LGBMClassifier::new(params);
        model.fit(&x, &y).unwrap();
        assert!(accuracy(&model.predict(&x).unwrap(), &y) > 0.8);
    }

    #[test]
    fn test_multiclass_one_vs_rest() {
        let x = Array2::from_shape_vec((90, 1), (0..90).map(|i| i as f64).collect()).unwrap();
        let y = Array1::from_vec((0..90).map(|i| (i / 30) as f64).collect());
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        assert_eq!(model.classes(), &[0.0, 1.0, 2.0]);
        assert!(accuracy(&model.predict(&x).unwrap(), &y) > 0.9);
    }

    #[test]
    fn test_single_class_predicts_constant() {
        let (x, _) = make_classification_data();
        let y = Array1::from_elem(100, 1.0);
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 0);
        assert!(model.predict(&x).unwrap().iter().all(|&p| p == 1.0));
    }

    #[test]
    fn test_string_like_labels_are_preserved() {
        let (x, y) = make_classification_data();
        let y = y.mapv(|v| if v > 0.5 { 7.0 } else { 3.0 });
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(preds.iter().all(|&p| p == 3.0 || p == 7.0));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = make_classification_data();
        let mut a = LGBMClassifier::new(small_params());
        let mut b = LGBMClassifier::new(small_params());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let (x, _) = make_classification_data();
        let model = LGBMClassifier::new(small_params());
        assert!(matches!(model.predict(&x), Err(PipelineError::TrainingError(_))));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let (x, y) = make_classification_data();
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        let wrong = Array2::zeros((3, 5));
        assert!(model.predict(&wrong).is_err());
    }

    #[test]
    fn test_invalid_params_fail_fit() {
        let (x, y) = make_classification_data();
        let params = HyperParams { num_leaves: 1, ..small_params() };
        let mut model = LGBMClassifier::new(params);
        assert!(matches!(model.fit(&x, &y), Err(PipelineError::TrainingError(_))));
    }

    #[test]
    fn test_missing_values_route_right() {
        let x = Array2::from_shape_vec(
            (40, 1),
            (0..40).map(|i| if i % 10 == 0 { f64::NAN } else { i as f64 }).collect(),
        )
        .unwrap();
        let y = Array1::from_vec((0..40).map(|i| if i < 20 { 0.0 } else { 1.0 }).collect());
        let mut model = LGBMClassifier::new(small_params());
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap().len(), 40);
    }

    #[test]
    fn test_save_and_load() {
        let (x, y) = make_classification_data();
        let mut model = LGBMClassifier::new(small_params()).with_feature_names(vec!["a".into(), "b".into()]);
        model.fit(&x, &y).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("lgbm_model.pkl");
        model.save(&path).unwrap();
        let restored = LGBMClassifier::load(&path).unwrap();
        assert_eq!(restored.feature_names(), model.feature_names());
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_bin_bounds_cap() {
        let bounds = bin_bounds((0..10_000).map(|i| i as f64));
        assert!(bounds.len() <= MAX_BIN);
        assert_eq!(*bounds.last().unwrap(), f64::INFINITY);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
    }
}
