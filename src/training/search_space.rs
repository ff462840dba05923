//! Hyperparameter search space definition

use crate::error::{PipelineError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A concrete hyperparameter value drawn from a distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

/// Distribution a single hyperparameter is sampled from.
///
/// In YAML these read as `{type: randint, low: 100, high: 500}`,
/// `{type: uniform, loc: 0.01, scale: 0.2}` or
/// `{type: choice, values: [gbdt, goss]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamDistribution {
    /// Integers in `[low, high)`
    RandInt { low: i64, high: i64 },
    /// Floats in `[loc, loc + scale)`
    Uniform { loc: f64, scale: f64 },
    /// One of a fixed set of values, each equally likely
    Choice { values: Vec<ParamValue> },
}

impl ParamDistribution {
    pub fn randint(low: i64, high: i64) -> Self {
        ParamDistribution::RandInt { low, high }
    }

    pub fn uniform(loc: f64, scale: f64) -> Self {
        ParamDistribution::Uniform { loc, scale }
    }

    pub fn choice<V: Into<ParamValue>>(values: impl IntoIterator<Item = V>) -> Self {
        ParamDistribution::Choice {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let ok = match self {
            ParamDistribution::RandInt { low, high } => low < high,
            ParamDistribution::Uniform { loc, scale } => loc.is_finite() && scale.is_finite() && *scale >= 0.0,
            ParamDistribution::Choice { values } => !values.is_empty(),
        };
        if ok {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "empty or malformed distribution for '{}': {:?}",
                name, self
            )))
        }
    }

    /// Draw one value
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            ParamDistribution::RandInt { low, high } => ParamValue::Int(rng.gen_range(*low..*high)),
            ParamDistribution::Uniform { loc, scale } => ParamValue::Float(loc + rng.gen::<f64>() * scale),
            ParamDistribution::Choice { values } => values[rng.gen_range(0..values.len())].clone(),
        }
    }
}

/// One sampled candidate: parameter name to value
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Ordered collection of named distributions.
///
/// Order matters: sampling walks the parameters in insertion order, so the
/// same seed always yields the same candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    params: Vec<(String, ParamDistribution)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add or replace a parameter
    pub fn with(mut self, name: impl Into<String>, dist: ParamDistribution) -> Self {
        self.insert(name, dist);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, dist: ParamDistribution) {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = dist,
            None => self.params.push((name, dist)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamDistribution> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamDistribution)> {
        self.params.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.params.iter().try_for_each(|(name, dist)| dist.validate(name))
    }

    /// Draw one candidate
    pub fn sample(&self, rng: &mut impl Rng) -> ParamSet {
        self.params
            .iter()
            .map(|(name, dist)| (name.clone(), dist.sample(rng)))
            .collect()
    }
}
