// src/model.rs

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::PcaError;
use crate::standardize::{check_positive_scale, standardize_with};

/// Standardizes `z` with `mean`/`std` and projects it onto the rows of
/// `projection` (k x n_features). Returns an (m_samples x k) matrix.
pub(crate) fn project(
    z: ArrayView2<f64>,
    mean: ArrayView1<f64>,
    std: ArrayView1<f64>,
    projection: ArrayView2<f64>,
) -> Result<Array2<f64>, PcaError> {
    let n_model_features = mean.len();
    if z.ncols() != n_model_features {
        return Err(PcaError::Dimension(format!(
            "Input data feature dimension ({}) does not match model's feature dimension ({}).",
            z.ncols(),
            n_model_features
        )));
    }
    if let Some(((row, col), _)) = z.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(PcaError::Numerical(format!(
            "Input contains a non-finite value at row {}, column {}.",
            row, col
        )));
    }
    if z.nrows() == 0 {
        return Ok(Array2::zeros((0, projection.nrows())));
    }
    let standardized = standardize_with(z, mean, std)?;
    Ok(standardized.dot(&projection.t()))
}

/// The fitted state needed to transform new data without refitting:
/// training mean and standard deviation plus the projection basis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcaModel {
    /// Shape: (n_features)
    mean: Array1<f64>,
    /// Strictly positive sample standard deviations. Shape: (n_features)
    std: Array1<f64>,
    /// Retained components as rows. Shape: (n_components, n_features)
    projection: Array2<f64>,
    n_components: usize,
}

impl PcaModel {
    pub(crate) fn new(mean: Array1<f64>, std: Array1<f64>, projection: Array2<f64>) -> Self {
        let n_components = projection.nrows();
        Self {
            mean,
            std,
            projection,
            n_components,
        }
    }

    /// Builds a model from externally computed parameters.
    ///
    /// # Errors
    /// `Dimension` if the lengths of `mean`, `std`, and the columns of
    /// `projection` disagree or `projection` has no rows; `Numerical` if
    /// any standard deviation would be rejected when standardizing.
    pub fn from_parts(mean: Array1<f64>, std: Array1<f64>, projection: Array2<f64>) -> Result<Self, PcaError> {
        let model = Self::new(mean, std, projection);
        model.validate()?;
        Ok(model)
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn std(&self) -> ArrayView1<'_, f64> {
        self.std.view()
    }

    pub fn projection(&self) -> ArrayView2<'_, f64> {
        self.projection.view()
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Applies the stored standardization and projection to `z` (m_samples x n_features).
    ///
    /// # Errors
    /// `Dimension` if `z` does not have `n_features` columns, `Numerical` if
    /// `z` contains NaN or infinite values.
    pub fn transform(&self, z: ArrayView2<f64>) -> Result<Array2<f64>, PcaError> {
        project(z, self.mean.view(), self.std.view(), self.projection.view())
    }

    fn validate(&self) -> Result<(), PcaError> {
        let d_mean = self.mean.len();
        let d_std = self.std.len();
        let d_proj = self.projection.ncols();
        if !(d_mean == d_std && d_std == d_proj) {
            return Err(PcaError::Dimension(format!(
                "Inconsistent feature dimensions: mean={}, std={}, projection columns={}.",
                d_mean, d_std, d_proj
            )));
        }
        if self.projection.nrows() == 0 || self.projection.nrows() > d_proj {
            return Err(PcaError::Dimension(format!(
                "Projection has {} components for {} features.",
                self.projection.nrows(),
                d_proj
            )));
        }
        if self.n_components != self.projection.nrows() {
            return Err(PcaError::Dimension(format!(
                "n_components ({}) does not match projection rows ({}).",
                self.n_components,
                self.projection.nrows()
            )));
        }
        if self.mean.iter().chain(self.projection.iter()).any(|v| !v.is_finite()) {
            return Err(PcaError::Numerical("Model contains non-finite values.".to_string()));
        }
        check_positive_scale(self.mean.view(), self.std.view())
    }

    /// Saves the model to `path` using bincode.
    ///
    /// # Errors
    /// `Io` if the file cannot be created, `Serialization` if encoding fails.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), PcaError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| PcaError::Serialization(format!("Failed to serialize PCA model: {}", e)))?;
        Ok(())
    }

    /// Loads a model previously written by [`PcaModel::save_model`] and checks
    /// that it is internally consistent.
    ///
    /// # Errors
    /// `Io` / `Serialization` on read or decode failure; `Dimension` /
    /// `Numerical` if the decoded model is inconsistent.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self, PcaError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let model: PcaModel = bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
            .map_err(|e| PcaError::Serialization(format!("Failed to deserialize PCA model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }
}
