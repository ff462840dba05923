//! Numeric column statistics and transforms

/// Median of the non-NaN values, `None` when there are none
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    Some(if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    })
}

/// Replace NaN with `fill`; returns how many values were filled
pub fn fill_nan(values: &mut [f64], fill: f64) -> usize {
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_nan()) {
        *v = fill;
        filled += 1;
    }
    filled
}

/// Sample skewness with the adjusted Fisher-Pearson correction.
///
/// Zero for fewer than three values or a constant column.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let (m2, m3) = (m2 / nf, m3 / nf);
    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1
}

/// `ln(1 + x)` is only defined for `x > -1`
pub fn can_log1p(values: &[f64]) -> bool {
    values.iter().all(|v| *v > -1.0)
}

pub fn log1p_in_place(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = v.ln_1p();
    }
}

/// Pearson correlation, 0 when either side is constant
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let mx = x[..n].iter().sum::<f64>() / nf;
    let my = y[..n].iter().sum::<f64>() / nf;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom > 0.0 && denom.is_finite() {
        sxy / denom
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_ignores_nan() {
        assert_eq!(median(&[3.0, f64::NAN, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn test_skewness_matches_reference() {
        // pandas: pd.Series([1, 2, 3, 10]).skew()
        let s = skewness(&[1.0, 2.0, 3.0, 10.0]);
        assert!((s - 1.763_632_6).abs() < 1e-6, "{}", s);
        assert_eq!(skewness(&[5.0, 5.0, 5.0]), 0.0);
        assert!(skewness(&[1.0, 2.0, 3.0]).abs() < 1e-12);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_log1p_domain() {
        assert!(can_log1p(&[0.0, 3.0]));
        assert!(!can_log1p(&[-1.0, 3.0]));
        let mut v = [0.0, std::f64::consts::E - 1.0];
        log1p_in_place(&mut v);
        assert!((v[1] - 1.0).abs() < 1e-12);
    }
}
