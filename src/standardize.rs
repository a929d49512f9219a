// src/standardize.rs

//! Column statistics, standardization, and the covariance estimate used by
//! [`crate::fit_pca`].

use crate::error::PcaError;
use log::warn;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Relative tolerance of the zero-variance test: a feature whose standard
/// deviation is at most this fraction of its mean magnitude is constant up to
/// rounding. Features on any absolute scale are accepted otherwise.
pub const ZERO_VARIANCE_EPS: f64 = 1e-12;

/// Per-feature arithmetic mean of `x` (n_samples x n_features).
///
/// # Errors
/// `Dimension` if `x` has no rows.
pub fn column_means(x: ArrayView2<f64>) -> Result<Array1<f64>, PcaError> {
    x.mean_axis(Axis(0))
        .ok_or_else(|| PcaError::Dimension("Cannot compute the mean of a matrix with zero samples.".to_string()))
}

/// Per-feature sample standard deviation (denominator `n - 1`).
///
/// # Errors
/// `Dimension` if `x` has fewer than 2 rows.
pub fn column_std(x: ArrayView2<f64>) -> Result<Array1<f64>, PcaError> {
    if x.nrows() < 2 {
        return Err(PcaError::Dimension(format!(
            "Sample standard deviation needs at least 2 samples, got {}.",
            x.nrows()
        )));
    }
    Ok(x.std_axis(Axis(0), 1.0))
}

/// Fails with `Numerical` on the first feature whose standard deviation is
/// not finite, or zero relative to its mean (see [`ZERO_VARIANCE_EPS`]).
pub fn check_positive_scale(mean: ArrayView1<f64>, std: ArrayView1<f64>) -> Result<(), PcaError> {
    let degenerate = std
        .iter()
        .zip(mean.iter())
        .position(|(&s, &m)| !s.is_finite() || s <= ZERO_VARIANCE_EPS * m.abs());
    if let Some(idx) = degenerate {
        let s = std[idx];
        warn!("Feature {} has standard deviation {}; refusing to standardize.", idx, s);
        return Err(PcaError::Numerical(format!(
            "Feature {} has zero variance (standard deviation {}); standardization is undefined.",
            idx, s
        )));
    }
    Ok(())
}

/// Returns `(x - mean) / std`, feature-wise.
///
/// # Errors
/// `Dimension` if `mean`/`std` do not match the number of columns of `x`,
/// `Numerical` if any feature fails [`check_positive_scale`].
pub fn standardize_with(
    x: ArrayView2<f64>,
    mean: ArrayView1<f64>,
    std: ArrayView1<f64>,
) -> Result<Array2<f64>, PcaError> {
    if mean.len() != x.ncols() || std.len() != x.ncols() {
        return Err(PcaError::Dimension(format!(
            "Input has {} features but the stored mean/std have lengths {}/{}.",
            x.ncols(),
            mean.len(),
            std.len()
        )));
    }
    check_positive_scale(mean, std)?;

    let mut standardized = x.to_owned();
    for mut row in standardized.axis_iter_mut(Axis(0)) {
        Zip::from(&mut row)
            .and(&mean)
            .and(&std)
            .for_each(|val, &m, &s| *val = (*val - m) / s);
    }
    Ok(standardized)
}

/// Sample covariance `x^T x / (n - 1)` of an already centered matrix.
///
/// The result is symmetrized as `(C + C^T) / 2` so downstream symmetric
/// solvers see an exactly symmetric matrix.
pub fn covariance(centered: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
    let n_samples = centered.nrows();
    if n_samples < 2 {
        return Err(PcaError::Dimension(format!(
            "Covariance needs at least 2 samples, got {}.",
            n_samples
        )));
    }
    let mut cov = centered.t().dot(&centered);
    cov /= (n_samples - 1) as f64;
    let symmetric = (&cov + &cov.t()) * 0.5;
    Ok(symmetric)
}
