//! Default hyperparameter space and random-search controls

use crate::training::search::{Scoring, SearchControls};
use crate::training::search_space::{ParamDistribution, SearchSpace};

pub fn default_search_space() -> SearchSpace {
    SearchSpace::new()
        .with("n_estimators", ParamDistribution::randint(100, 500))
        .with("max_depth", ParamDistribution::randint(5, 50))
        .with("learning_rate", ParamDistribution::uniform(0.01, 0.2))
        .with("num_leaves", ParamDistribution::randint(20, 100))
        .with("boosting_type", ParamDistribution::choice(["gbdt", "goss"]))
}

pub fn default_search_controls() -> SearchControls {
    SearchControls {
        n_iter: 4,
        cv: 2,
        n_jobs: -1,
        verbose: 2,
        random_state: 42,
        scoring: Scoring::Accuracy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let space = default_search_space();
        assert_eq!(space.len(), 5);
        space.validate().unwrap();
        assert_eq!(default_search_controls(), SearchControls::default());
    }
}
