// Principal component analysis (PCA) on the correlation matrix

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{PcaError, NOT_FITTED};
use crate::linalg_backends::{BackendEigh, LinAlgBackendProvider};
use crate::model::{project, PcaModel};
use crate::standardize::{column_means, column_std, covariance, standardize_with};
use log::{debug, info, trace, warn};

/// Eigenvectors shorter than this after decomposition are considered degenerate.
const MIN_EIGENVECTOR_NORM: f64 = 1e-12;

/// Everything learned by one call to [`fit_pca`].
///
/// A `FitResult` is immutable: a new fit produces a new value rather than
/// updating an old one. Eigen-quantities are kept in the order the solver
/// returned them; `ranking` maps rank positions back into that order.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Per-feature mean of the training data. Shape: (n_features)
    mean: Array1<f64>,
    /// Per-feature sample standard deviation (n - 1). Shape: (n_features)
    std: Array1<f64>,
    /// Covariance of the standardized data, i.e. the correlation matrix of the
    /// raw data. Shape: (n_features, n_features)
    covariance: Array2<f64>,
    /// Eigenvalues in solver order. Shape: (n_features)
    eigenvalues: Array1<f64>,
    /// Unit-norm eigenvectors as columns, in solver order, sign-normalized so
    /// the largest-magnitude entry of each is positive. Shape: (n_features, n_features)
    eigenvectors: Array2<f64>,
    /// Solver indices ordered by descending |eigenvalue|; ties keep solver order.
    ranking: Vec<usize>,
    /// Top-k ranked eigenvectors stacked as rows. Shape: (k, n_features)
    projection: Array2<f64>,
    /// Standardized training data expressed in the component basis. Shape: (n_samples, k)
    projected: Array2<f64>,
    /// Percentage of total variance per component, in ranked order. Shape: (n_features)
    explained_variance: Array1<f64>,
    /// Running sum of `explained_variance`. Shape: (n_features)
    cumulative_explained_variance: Array1<f64>,
}

impl FitResult {
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn std(&self) -> ArrayView1<'_, f64> {
        self.std.view()
    }

    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.covariance.view()
    }

    /// Eigenvalues of the covariance matrix in the order the solver produced them.
    pub fn eigenvalues(&self) -> ArrayView1<'_, f64> {
        self.eigenvalues.view()
    }

    /// Eigenvectors as columns; `eigenvectors().column(i)` pairs with `eigenvalues()[i]`.
    pub fn eigenvectors(&self) -> ArrayView2<'_, f64> {
        self.eigenvectors.view()
    }

    /// Solver indices of the eigenpairs, best first.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// Eigenvalues sorted by rank (descending magnitude).
    pub fn ranked_eigenvalues(&self) -> Array1<f64> {
        self.ranking.iter().map(|&i| self.eigenvalues[i]).collect()
    }

    /// The projection basis: one retained component per row. Shape: (k, n_features)
    pub fn components(&self) -> ArrayView2<'_, f64> {
        self.projection.view()
    }

    pub fn projected(&self) -> ArrayView2<'_, f64> {
        self.projected.view()
    }

    pub fn n_components(&self) -> usize {
        self.projection.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Explained variance percentages, one per component in ranked order.
    /// Sums to 100 over all components.
    pub fn explained_variance(&self) -> ArrayView1<'_, f64> {
        self.explained_variance.view()
    }

    /// Explained variance percentages in solver order, matching [`FitResult::eigenvalues`].
    pub fn explained_variance_by_eigenvalue(&self) -> Array1<f64> {
        let mut by_eigenvalue = Array1::zeros(self.ranking.len());
        for (rank, &idx) in self.ranking.iter().enumerate() {
            by_eigenvalue[idx] = self.explained_variance[rank];
        }
        by_eigenvalue
    }

    pub fn cumulative_explained_variance(&self) -> ArrayView1<'_, f64> {
        self.cumulative_explained_variance.view()
    }

    /// Number of components whose eigenvalue exceeds 1 (Kaiser's rule).
    /// Reported only; the fitted component count is not changed by it.
    pub fn kaiser_component_count(&self) -> usize {
        self.eigenvalues.iter().filter(|&&lambda| lambda > 1.0).count()
    }

    /// Smallest number of ranked components whose cumulative explained
    /// variance reaches `percent` (0..=100). Returns `n_features` when the
    /// threshold is above what the components can explain.
    pub fn components_for_variance(&self, percent: f64) -> usize {
        self.cumulative_explained_variance
            .iter()
            .position(|&c| c + 1e-9 >= percent)
            .map_or(self.cumulative_explained_variance.len(), |pos| pos + 1)
    }

    /// The minimal persisted state: mean, std, projection, and component count.
    pub fn model(&self) -> PcaModel {
        PcaModel::new(self.mean.clone(), self.std.clone(), self.projection.clone())
    }
}

/// Orders eigenpair indices by descending |eigenvalue|.
///
/// The sort is stable, so equal magnitudes keep ascending index order.
pub fn rank_eigenpairs(eigenvalues: ArrayView1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigenvalues[b].abs().total_cmp(&eigenvalues[a].abs()));
    order
}

/// Flips `v` in place so that its largest-magnitude entry is positive.
/// On ties the first such entry decides.
pub fn normalize_sign(mut v: ndarray::ArrayViewMut1<f64>) {
    let mut pivot = 0.0f64;
    for &x in v.iter() {
        if x.abs() > pivot.abs() {
            pivot = x;
        }
    }
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

/// Fits PCA on `x` and returns the full, immutable result.
///
/// The data is standardized with its per-feature mean and sample standard
/// deviation, the covariance of the standardized data is decomposed with
/// `backend`, eigenpairs are ranked by descending |eigenvalue|, and the
/// standardized data is projected onto the top `n_components` eigenvectors
/// (all of them when `None`).
///
/// * `x` - Input data, shape (n_samples, n_features). Not modified.
/// * `n_components` - Number of components to retain, `1..=n_features`.
/// * `backend` - Symmetric eigensolver.
///
/// # Errors
/// - `Dimension` if `n_samples < 2`, `n_features == 0`, or `n_components`
///   is 0 or larger than `n_features`.
/// - `Numerical` if `x` contains non-finite values, a feature has zero
///   variance, or the eigendecomposition fails or is degenerate.
pub fn fit_pca<B: BackendEigh<f64>>(
    x: ArrayView2<f64>,
    n_components: Option<usize>,
    backend: &B,
) -> Result<FitResult, PcaError> {
    let (n_samples, n_features) = x.dim();

    if n_features == 0 {
        return Err(PcaError::Dimension("Input matrix has zero features.".to_string()));
    }
    if n_samples < 2 {
        return Err(PcaError::Dimension(format!(
            "Input matrix must have at least 2 samples, got {}.",
            n_samples
        )));
    }
    let k = n_components.unwrap_or(n_features);
    if k == 0 {
        return Err(PcaError::Dimension("n_components must be at least 1.".to_string()));
    }
    if k > n_features {
        return Err(PcaError::Dimension(format!(
            "n_components={} cannot be larger than n_features={}.",
            k, n_features
        )));
    }
    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(PcaError::Numerical(format!(
            "Input contains a non-finite value at row {}, column {}.",
            row, col
        )));
    }

    let mean = column_means(x)?;
    let std = column_std(x)?;
    let standardized = standardize_with(x, mean.view(), std.view())?;
    let cov = covariance(standardized.view())?;
    debug!("Standardized {}x{} input; covariance is {}x{}.", n_samples, n_features, cov.nrows(), cov.ncols());

    let decomposition = backend
        .eigh_upper(&cov)
        .map_err(|e| PcaError::Numerical(format!("Eigendecomposition of covariance matrix failed: {}", e)))?;
    let eigenvalues = decomposition.eigenvalues;
    let mut eigenvectors = decomposition.eigenvectors;
    if eigenvalues.len() != n_features || eigenvectors.dim() != (n_features, n_features) {
        return Err(PcaError::Numerical(format!(
            "Eigensolver returned {} eigenvalues and a {:?} eigenvector matrix for a {}x{} covariance.",
            eigenvalues.len(),
            eigenvectors.dim(),
            n_features,
            n_features
        )));
    }
    if eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(PcaError::Numerical("Eigensolver returned non-finite eigenvalues.".to_string()));
    }
    trace!("Eigenvalues in solver order: {:?}", eigenvalues);

    for (i, mut column) in eigenvectors.axis_iter_mut(Axis(1)).enumerate() {
        let norm = column.dot(&column).sqrt();
        if !norm.is_finite() || norm <= MIN_EIGENVECTOR_NORM {
            return Err(PcaError::Numerical(format!("Eigenvector {} is degenerate (norm {}).", i, norm)));
        }
        column.mapv_inplace(|v| v / norm);
        normalize_sign(column);
    }

    let ranking = rank_eigenpairs(eigenvalues.view());
    debug!("Eigenpair ranking (solver indices, best first): {:?}", ranking);

    let mut projection = Array2::<f64>::zeros((k, n_features));
    for (row, &idx) in ranking.iter().take(k).enumerate() {
        projection.row_mut(row).assign(&eigenvectors.column(idx));
    }
    let projected = standardized.dot(&projection.t());

    let total_variance: f64 = eigenvalues.sum();
    if !total_variance.is_finite() || total_variance <= 0.0 {
        return Err(PcaError::Numerical(format!(
            "Total variance {} is not positive; explained variance is undefined.",
            total_variance
        )));
    }
    let explained_variance: Array1<f64> = ranking
        .iter()
        .map(|&i| 100.0 * eigenvalues[i] / total_variance)
        .collect();
    let mut running = 0.0;
    let cumulative_explained_variance: Array1<f64> = explained_variance
        .iter()
        .map(|&pct| {
            running += pct;
            running
        })
        .collect();

    let result = FitResult {
        mean,
        std,
        covariance: cov,
        eigenvalues,
        eigenvectors,
        ranking,
        projection,
        projected,
        explained_variance,
        cumulative_explained_variance,
    };

    let kaiser = result.kaiser_component_count();
    if k < kaiser {
        warn!(
            "Retaining {} components although {} eigenvalues exceed 1 (Kaiser's rule).",
            k, kaiser
        );
    }
    info!(
        "Fitted PCA on {}x{} data with {} components; retained components explain {:.2}% of variance.",
        n_samples,
        n_features,
        k,
        result.cumulative_explained_variance[k - 1]
    );
    Ok(result)
}

/// Principal component analysis reducer with a fit/transform lifecycle.
///
/// The reducer is Unfitted until [`PCA::fit`] succeeds and holds only the
/// most recent [`FitResult`]. A failed fit drops any previous result.
#[derive(Debug, Clone)]
pub struct PCA<B = LinAlgBackendProvider<f64>> {
    n_components: Option<usize>,
    backend: B,
    fitted: Option<FitResult>,
}

impl Default for PCA {
    fn default() -> Self {
        Self::new()
    }
}

impl PCA {
    /// Creates an unfitted reducer that keeps every component.
    ///
    /// # Examples
    ///
    /// ```
    /// use correlation_pca::PCA;
    /// let pca = PCA::new();
    /// assert!(!pca.is_fitted());
    /// ```
    pub fn new() -> Self {
        Self::with_backend(LinAlgBackendProvider::new())
    }

    /// Creates an unfitted reducer that keeps the top `n_components` components.
    pub fn with_components(n_components: usize) -> Self {
        Self::new().n_components(Some(n_components))
    }
}

impl<B: BackendEigh<f64>> PCA<B> {
    /// Creates an unfitted reducer that decomposes with `backend`.
    pub fn with_backend(backend: B) -> Self {
        Self {
            n_components: None,
            backend,
            fitted: None,
        }
    }

    /// Sets the number of components to keep; `None` keeps all of them.
    /// Takes effect at the next `fit`.
    pub fn n_components(mut self, n_components: Option<usize>) -> Self {
        self.n_components = n_components;
        self
    }

    pub fn requested_components(&self) -> Option<usize> {
        self.n_components
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fits the reducer to `x` (n_samples x n_features), replacing any earlier fit.
    ///
    /// Returns `self` so calls can be chained.
    ///
    /// # Errors
    /// See [`fit_pca`]. On error the reducer is left unfitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use correlation_pca::PCA;
    ///
    /// let data = array![
    ///     [1.0, 2.0, 0.5],
    ///     [3.0, 3.5, 0.1],
    ///     [5.0, 7.0, 0.4],
    ///     [2.0, 1.0, 0.9]
    /// ];
    ///
    /// let mut pca = PCA::with_components(2);
    /// let projected = pca.fit(data.view()).unwrap().transform().unwrap();
    /// assert_eq!(projected.dim(), (4, 2));
    /// ```
    pub fn fit(&mut self, x: ArrayView2<f64>) -> Result<&mut Self, PcaError> {
        self.fitted = None;
        let result = fit_pca(x, self.n_components, &self.backend)?;
        self.fitted = Some(result);
        Ok(self)
    }

    /// Returns the training data projected during the last fit. Shape: (n_samples, k)
    ///
    /// # Errors
    /// `State` if the reducer is not fitted.
    pub fn transform(&self) -> Result<ArrayView2<'_, f64>, PcaError> {
        Ok(self.result()?.projected())
    }

    /// Standardizes `z` with the training mean/std and projects it onto the
    /// retained components. Shape of the result: (m_samples, k)
    ///
    /// # Errors
    /// `State` if not fitted, `Dimension` if `z` has a different number of
    /// features than the training data, `Numerical` if `z` is not finite.
    pub fn transform_new(&self, z: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        let result = self.result()?;
        project(z, result.mean(), result.std(), result.components())
    }

    /// Fits on `x` and returns an owned copy of the projected training data.
    pub fn fit_transform(&mut self, x: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        Ok(self.fit(x)?.transform()?.to_owned())
    }

    /// The complete result of the last successful fit.
    pub fn result(&self) -> Result<&FitResult, PcaError> {
        self.fitted.as_ref().ok_or(PcaError::State(NOT_FITTED))
    }

    pub fn explained_variance(&self) -> Result<ArrayView1<'_, f64>, PcaError> {
        Ok(self.result()?.explained_variance())
    }

    pub fn cumulative_explained_variance(&self) -> Result<ArrayView1<'_, f64>, PcaError> {
        Ok(self.result()?.cumulative_explained_variance())
    }

    pub fn covariance(&self) -> Result<ArrayView2<'_, f64>, PcaError> {
        Ok(self.result()?.covariance())
    }

    pub fn components(&self) -> Result<ArrayView2<'_, f64>, PcaError> {
        Ok(self.result()?.components())
    }

    pub fn mean(&self) -> Result<ArrayView1<'_, f64>, PcaError> {
        Ok(self.result()?.mean())
    }

    pub fn std(&self) -> Result<ArrayView1<'_, f64>, PcaError> {
        Ok(self.result()?.std())
    }

    /// Extracts the persistable model (mean, std, projection).
    pub fn model(&self) -> Result<PcaModel, PcaError> {
        Ok(self.result()?.model())
    }
}
