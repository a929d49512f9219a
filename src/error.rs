// src/error.rs

use std::error::Error;
use std::fmt;

/// Errors produced while fitting, applying, or persisting a PCA model.
///
/// Every failure is a deterministic function of the input, so none of these
/// are retried or recovered internally.
#[derive(Debug)]
pub enum PcaError {
    /// Shapes do not line up: too few samples, no features, a component
    /// count outside `1..=n_features`, or a feature-count mismatch against a
    /// fitted model.
    Dimension(String),
    /// The data cannot be standardized or decomposed: a zero-variance
    /// feature, non-finite input, or an eigensolver failure.
    Numerical(String),
    /// The model was used before a successful `fit`.
    State(&'static str),
    /// Reading or writing a persisted model failed.
    Io(std::io::Error),
    /// A persisted model could not be encoded or decoded.
    Serialization(String),
}

impl fmt::Display for PcaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcaError::Dimension(msg) => write!(f, "dimension error: {msg}"),
            PcaError::Numerical(msg) => write!(f, "numerical error: {msg}"),
            PcaError::State(msg) => write!(f, "state error: {msg}"),
            PcaError::Io(err) => write!(f, "i/o error: {err}"),
            PcaError::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl Error for PcaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PcaError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PcaError {
    fn from(err: std::io::Error) -> Self {
        PcaError::Io(err)
    }
}

/// Message used by every accessor that requires a fitted model.
pub(crate) const NOT_FITTED: &str = "PCA model is not fitted. Call fit() first.";
