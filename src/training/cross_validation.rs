//! Stratified k-fold splitting

use crate::error::{PipelineError, Result};
use ndarray::Array1;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold without shuffling.
///
/// Each class's rows are cut, in their original order, into `n_splits`
/// contiguous chunks, and fold `i` takes chunk `i` of every class. Every fold
/// therefore keeps the class proportions of `y`, and the split depends only
/// on `y`.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate the train/test splits for labels `y`
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits;
        if n_splits < 2 {
            return Err(PipelineError::TrainingError(format!(
                "cv must be at least 2, got {}",
                n_splits
            )));
        }

        let by_class = class_indices(y);
        let smallest = by_class.iter().map(|(_, idx)| idx.len()).min().unwrap_or(0);
        if smallest < n_splits {
            return Err(PipelineError::TrainingError(format!(
                "cv={} is larger than the smallest class ({} rows)",
                n_splits, smallest
            )));
        }

        let mut fold_of = vec![0usize; y.len()];
        for (_, indices) in &by_class {
            let base = indices.len() / n_splits;
            let remainder = indices.len() % n_splits;
            let mut current = 0;
            for fold in 0..n_splits {
                let size = if fold < remainder { base + 1 } else { base };
                for &idx in &indices[current..current + size] {
                    fold_of[idx] = fold;
                }
                current += size;
            }
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| fold_of[i] == fold_idx);
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();
        Ok(splits)
    }
}

/// Row indices per class, classes in ascending label order
pub(crate) fn class_indices(y: &Array1<f64>) -> Vec<(f64, Vec<usize>)> {
    let mut classes: Vec<(f64, Vec<usize>)> = Vec::new();
    for (idx, &val) in y.iter().enumerate() {
        let val = val + 0.0;
        match classes.binary_search_by(|(c, _)| c.total_cmp(&val)) {
            Ok(pos) => classes[pos].1.push(idx),
            Err(pos) => classes.insert(pos, (val, vec![idx])),
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_rows() {
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let splits = StratifiedKFold::new(3).split(&y).unwrap();
        assert_eq!(splits.len(), 3);

        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 10);
            assert!(split.test_indices.iter().all(|i| !split.train_indices.contains(i)));
        }
    }

    #[test]
    fn test_class_balance_preserved() {
        let mut labels = vec![0.0; 60];
        labels.extend(vec![1.0; 40]);
        let y = Array1::from_vec(labels);
        for split in StratifiedKFold::new(4).split(&y).unwrap() {
            let ones = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(split.test_indices.len(), 25);
            assert_eq!(ones, 10);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let y = Array1::from_vec((0..50).map(|i| (i % 3) as f64).collect());
        let a = StratifiedKFold::new(5).split(&y).unwrap();
        let b = StratifiedKFold::new(5).split(&y).unwrap();
        for (x, z) in a.iter().zip(b.iter()) {
            assert_eq!(x.test_indices, z.test_indices);
        }
    }

    #[test]
    fn test_single_class_allowed() {
        let y = Array1::from_vec(vec![1.0; 8]);
        let splits = StratifiedKFold::new(2).split(&y).unwrap();
        assert_eq!(splits[0].test_indices, vec![0, 1, 2, 3]);
        assert_eq!(splits[1].test_indices, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0]);
        assert!(StratifiedKFold::new(1).split(&y).is_err());
        assert!(matches!(
            StratifiedKFold::new(2).split(&y),
            Err(PipelineError::TrainingError(_))
        ));
    }
}
