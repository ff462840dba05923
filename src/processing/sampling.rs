//! Class balancing

use crate::training::cross_validation::class_indices;
use ndarray::Array1;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Random oversampler: duplicates minority rows up to the majority count
#[derive(Debug, Clone, Copy)]
pub struct RandomOverSampler {
    seed: u64,
}

impl RandomOverSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Row indices of the balanced set.
    ///
    /// Every original row comes first, in order, followed by the drawn
    /// duplicates of each minority class in ascending label order.
    pub fn resample_indices(&self, labels: &Array1<f64>) -> Vec<usize> {
        let by_class = class_indices(labels);
        let target = by_class.iter().map(|(_, idx)| idx.len()).max().unwrap_or(0);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut rows: Vec<usize> = (0..labels.len()).collect();
        for (_, members) in &by_class {
            for _ in members.len()..target {
                rows.push(members[rng.gen_range(0..members.len())]);
            }
        }
        rows
    }
}
