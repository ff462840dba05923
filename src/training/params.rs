//! Gradient boosting hyperparameters

use super::search_space::{ParamSet, ParamValue};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How rows are chosen for each boosting round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingType {
    /// Classic gradient boosting (optionally row-subsampled)
    Gbdt,
    /// Gradient-based one-side sampling
    Goss,
}

impl fmt::Display for BoostingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoostingType::Gbdt => f.write_str("gbdt"),
            BoostingType::Goss => f.write_str("goss"),
        }
    }
}

impl std::str::FromStr for BoostingType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gbdt" => Ok(BoostingType::Gbdt),
            "goss" => Ok(BoostingType::Goss),
            other => Err(PipelineError::TrainingError(format!("unknown boosting_type '{}'", other))),
        }
    }
}

/// Full hyperparameter set of the leaf-wise booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub num_leaves: usize,
    /// `None` means unlimited depth
    pub max_depth: Option<usize>,
    pub min_child_samples: usize,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub top_rate: f64,
    pub other_rate: f64,
    pub boosting_type: BoostingType,
    pub random_state: u64,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            num_leaves: 31,
            max_depth: None,
            min_child_samples: 20,
            reg_lambda: 0.0,
            reg_alpha: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            top_rate: 0.2,
            other_rate: 0.1,
            boosting_type: BoostingType::Gbdt,
            random_state: 42,
        }
    }
}

impl HyperParams {
    /// Copy of `self` with every entry of `set` applied
    pub fn with_overrides(&self, set: &ParamSet) -> Result<Self> {
        let mut params = self.clone();
        for (name, value) in set {
            params.set(name, value)?;
        }
        params.validate()?;
        Ok(params)
    }

    /// Set one parameter by name
    pub fn set(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        let bad = || {
            PipelineError::TrainingError(format!("invalid value '{}' for hyperparameter '{}'", value, name))
        };
        let as_count = || value.as_i64().filter(|v| *v >= 0).map(|v| v as usize).ok_or_else(bad);
        let as_float = || value.as_f64().filter(|v| v.is_finite()).ok_or_else(bad);

        match name {
            "n_estimators" => self.n_estimators = as_count()?,
            "learning_rate" => self.learning_rate = as_float()?,
            "num_leaves" => self.num_leaves = as_count()?,
            "max_depth" => {
                let depth = value.as_i64().ok_or_else(bad)?;
                self.max_depth = if depth <= 0 { None } else { Some(depth as usize) };
            }
            "min_child_samples" => self.min_child_samples = as_count()?,
            "reg_lambda" => self.reg_lambda = as_float()?,
            "reg_alpha" => self.reg_alpha = as_float()?,
            "subsample" => self.subsample = as_float()?,
            "colsample_bytree" => self.colsample_bytree = as_float()?,
            "top_rate" => self.top_rate = as_float()?,
            "other_rate" => self.other_rate = as_float()?,
            "boosting_type" => self.boosting_type = value.as_str().ok_or_else(bad)?.parse()?,
            "random_state" => self.random_state = value.as_i64().ok_or_else(bad)? as u64,
            _ => {
                return Err(PipelineError::TrainingError(format!("unknown hyperparameter '{}'", name)));
            }
        }
        Ok(())
    }

    /// Reject combinations the booster cannot train with
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PipelineError::TrainingError(msg.to_string()));

        if self.n_estimators == 0 {
            return fail("n_estimators must be positive");
        }
        if !(self.learning_rate > 0.0) {
            return fail("learning_rate must be positive");
        }
        if self.num_leaves < 2 {
            return fail("num_leaves must be at least 2");
        }
        if self.min_child_samples == 0 {
            return fail("min_child_samples must be positive");
        }
        if self.reg_lambda < 0.0 || self.reg_alpha < 0.0 {
            return fail("regularization terms must be non-negative");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return fail("subsample must be in (0, 1]");
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return fail("colsample_bytree must be in (0, 1]");
        }
        if self.boosting_type == BoostingType::Goss
            && !(self.top_rate > 0.0 && self.other_rate >= 0.0 && self.top_rate + self.other_rate <= 1.0)
        {
            return fail("goss requires top_rate > 0, other_rate >= 0 and top_rate + other_rate <= 1");
        }
        Ok(())
    }

    /// Every parameter rendered as text, in the shape the tracker stores
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("n_estimators".into(), self.n_estimators.to_string());
        map.insert("learning_rate".into(), self.learning_rate.to_string());
        map.insert("num_leaves".into(), self.num_leaves.to_string());
        map.insert(
            "max_depth".into(),
            self.max_depth.map(|d| d.to_string()).unwrap_or_else(|| "-1".into()),
        );
        map.insert("min_child_samples".into(), self.min_child_samples.to_string());
        map.insert("reg_lambda".into(), self.reg_lambda.to_string());
        map.insert("reg_alpha".into(), self.reg_alpha.to_string());
        map.insert("subsample".into(), self.subsample.to_string());
        map.insert("colsample_bytree".into(), self.colsample_bytree.to_string());
        map.insert("top_rate".into(), self.top_rate.to_string());
        map.insert("other_rate".into(), self.other_rate.to_string());
        map.insert("boosting_type".into(), self.boosting_type.to_string());
        map.insert("random_state".into(), self.random_state.to_string());
        map
    }
}
