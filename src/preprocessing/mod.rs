//! Data preprocessing module
//!
//! Feature standardization for the linear and kernel models. Centering is
//! skipped for sparse matrices so that zeros stay zeros.

mod scaler;

pub use scaler::{density, is_sparse, StandardScaler, SPARSE_DENSITY_THRESHOLD};
