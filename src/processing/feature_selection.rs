//! Correlation-based feature selection

use super::transforms::pearson;

/// Indices of the `k` columns most correlated (in absolute value) with
/// `target`, returned in their original order. Ties keep the earlier column.
pub fn top_k_by_correlation(columns: &[&[f64]], target: &[f64], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| (i, pearson(col, target).abs()))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut keep: Vec<usize> = scored.into_iter().take(k).map(|(i, _)| i).collect();
    keep.sort_unstable();
    keep
}
