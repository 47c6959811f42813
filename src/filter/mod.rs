use nalgebra::RealField;

use crate::error::Result;
use crate::models::NoiseKind;
use crate::quadrature::{PointSet, Quadrature};
use crate::utils::state::GaussianState;

mod bayesian_filter;
mod multi_sensor_gaussian_filter;
mod multi_sensor_update;
mod sigma_point_prediction;
mod sigma_point_update;
mod unscented_kalman_filter;

pub use bayesian_filter::BayesianFilter;
pub use multi_sensor_gaussian_filter::MultiSensorGaussianFilter;
pub use multi_sensor_update::{Accumulation, MultiSensorSigmaPointUpdate};
pub use sigma_point_prediction::SigmaPointPrediction;
pub use sigma_point_update::SigmaPointUpdate;
pub use unscented_kalman_filter::UnscentedKalmanFilter;

/// State and noise points for a model with the given noise kind.
///
/// Non-additive noise is part of the augmented Gaussian. Additive noise gets
/// points at its mean only, its covariance is added by the caller.
fn sigma_points<T: RealField + Copy, Q: Quadrature<T>>(
    quadrature: &Q,
    prior: &GaussianState<T>,
    noise: &GaussianState<T>,
    noise_kind: NoiseKind,
) -> Result<(PointSet<T>, PointSet<T>)> {
    match noise_kind {
        NoiseKind::NonAdditive => quadrature.transform_to_points(prior, noise),
        NoiseKind::Additive => {
            let p_x = quadrature.transform_state_to_points(prior)?;
            let p_q = PointSet::repeated(&noise.x, &p_x);
            Ok((p_x, p_q))
        }
    }
}
