// Principal component analysis (PCA) via the correlation matrix

#![doc = include_str!("../README.md")]

pub mod error;
pub mod linalg_backends;
pub mod model;
pub mod pca;
pub mod standardize;


pub use error::PcaError;
pub use linalg_backends::{BackendEigh, EighOutput, LinAlgBackendProvider, NdarrayLinAlgBackend};
#[cfg(feature = "backend_faer")]
pub use linalg_backends::FaerLinAlgBackend;
pub use model::PcaModel;
pub use pca::{fit_pca, FitResult, PCA};
pub use standardize::ZERO_VARIANCE_EPS;
