use nalgebra::{DVector, RealField};

use crate::error::Result;
use crate::utils::state::GaussianState;

/// Recursive Gaussian estimator driven by inputs and measurements.
///
/// A call that returns an error leaves the estimate as it was.
pub trait BayesianFilter<T: RealField> {
    /// Time update with input `u` over `dt`.
    fn predict(&mut self, u: &DVector<T>, dt: T) -> Result<()>;

    /// Measurement update with measurement `z`.
    fn update(&mut self, z: &DVector<T>) -> Result<()>;

    /// Prediction followed by update, both or neither are applied.
    fn update_estimate(&mut self, u: &DVector<T>, z: &DVector<T>, dt: T) -> Result<()>;

    fn gaussian_estimate(&self) -> &GaussianState<T>;
}
