use nalgebra::{DVector, RealField};

use crate::error::Result;
use crate::utils::state::GaussianState;

mod point_set;
mod unscented;

pub(crate) use point_set::weighted_product;
pub use point_set::PointSet;
pub use unscented::UnscentedQuadrature;

/// Deterministic quadrature used to push a Gaussian through a nonlinear function.
pub trait Quadrature<T: RealField>: Send + Sync {
    /// Number of points needed for a Gaussian of the given dimension
    fn number_of_points(&self, dimension: usize) -> usize;

    /// Points of the joint Gaussian over `[state; noise]`, split back into a
    /// state point set and a noise point set sharing the same weights.
    fn transform_to_points(
        &self,
        prior: &GaussianState<T>,
        noise: &GaussianState<T>,
    ) -> Result<(PointSet<T>, PointSet<T>)>;

    /// Points of `prior` alone.
    fn transform_state_to_points(&self, prior: &GaussianState<T>) -> Result<PointSet<T>>;

    /// Applies `f` to every pair of (state, noise) points. The weights are
    /// carried over unchanged.
    fn propagate_points<F>(
        &self,
        f: F,
        state_points: &PointSet<T>,
        noise_points: &PointSet<T>,
    ) -> Result<PointSet<T>>
    where
        F: Fn(&DVector<T>, &DVector<T>) -> DVector<T>;
}
