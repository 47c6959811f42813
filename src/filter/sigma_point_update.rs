use nalgebra::{DVector, RealField};

use crate::error::{check_dimension, Result};
use crate::filter::sigma_points;
use crate::models::measurement::ObservationModel;
use crate::models::NoiseKind;
use crate::quadrature::Quadrature;
use crate::utils::linalg::{spd_inverse, symmetrize};
use crate::utils::state::GaussianState;

/// Measurement update of a single observation model in Kalman gain form.
#[derive(Debug, Clone)]
pub struct SigmaPointUpdate<T: RealField> {
    noise: GaussianState<T>,
    noise_kind: NoiseKind,
}

impl<T: RealField + Copy> SigmaPointUpdate<T> {
    pub fn new(noise: GaussianState<T>, noise_kind: NoiseKind) -> SigmaPointUpdate<T> {
        SigmaPointUpdate { noise, noise_kind }
    }

    /// Takes the noise kind from `model` and checks the noise against it.
    pub fn for_model<O: ObservationModel<T> + ?Sized>(
        model: &O,
        noise: GaussianState<T>,
    ) -> Result<SigmaPointUpdate<T>> {
        noise.check_dimension("observation noise", model.noise_dimension())?;
        Ok(SigmaPointUpdate::new(noise, model.noise_kind()))
    }

    pub fn noise(&self) -> &GaussianState<T> {
        &self.noise
    }

    pub fn update<O: ObservationModel<T> + ?Sized, Q: Quadrature<T>>(
        &self,
        model: &O,
        quadrature: &Q,
        prior: &GaussianState<T>,
        y: &DVector<T>,
    ) -> Result<GaussianState<T>> {
        let dy = model.observation_dimension();
        prior.check_dimension("prior", model.state_dimension())?;
        self.noise.check_dimension("observation noise", model.noise_dimension())?;
        check_dimension("measurement", dy, y.len())?;
        if self.noise_kind.is_additive() {
            check_dimension("additive observation noise", dy, self.noise.dimension())?;
        }

        let (p_x, p_q) = sigma_points(quadrature, prior, &self.noise, self.noise_kind)?;
        let p_y = quadrature.propagate_points(|x, w| model.observation(x, w), &p_x, &p_q)?;
        check_dimension("observation", dy, p_y.dimension())?;

        let mean_x = p_x.mean();
        let mean_y = p_y.mean();
        let c_xx = p_x.covariance();
        let mut c_yy = p_y.covariance();
        if self.noise_kind.is_additive() {
            c_yy += &self.noise.cov;
        }
        let c_xy = p_x.cross_covariance(&p_y)?;

        let kalman_gain = c_xy * spd_inverse(&c_yy, "innovation covariance")?;
        let x_est = mean_x + &kalman_gain * (y - mean_y);
        let p_est = symmetrize(&(c_xx - &kalman_gain * c_yy * kalman_gain.transpose()));
        log::debug!(
            "sigma point update: state dimension {}, observation dimension {}",
            prior.dimension(),
            dy
        );
        GaussianState::new(x_est, p_est)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::filter::test_models::*;
    use crate::models::measurement::LinearObservationModel;
    use crate::quadrature::UnscentedQuadrature;
    use nalgebra::DMatrix;

    #[test]
    fn linear_update_matches_kalman_filter() -> Result<()> {
        #[rustfmt::skip]
        let h = DMatrix::from_row_slice(2, 2, &[
            1.0, 0.0,
            0.5, 1.0,
        ]);
        let r = DMatrix::from_row_slice(2, 2, &[0.4, 0.1, 0.1, 0.3]);
        let prior = planar_prior();
        let y = DVector::from_vec(vec![1.4, 2.1]);

        let s = &h * &prior.cov * h.transpose() + &r;
        let k = &prior.cov * h.transpose() * s.clone().try_inverse().unwrap();
        let expected_x = &prior.x + &k * (&y - &h * &prior.x);
        let expected_cov = &prior.cov - &k * s * k.transpose();

        for kind in [NoiseKind::Additive, NoiseKind::NonAdditive] {
            let model = LinearObservationModel::new(h.clone(), kind);
            let update = SigmaPointUpdate::for_model(&model, GaussianState::zero_mean(r.clone())?)?;
            let posterior = update.update(&model, &UnscentedQuadrature::default(), &prior, &y)?;
            approx::assert_relative_eq!(posterior.x, expected_x, epsilon = 1e-9);
            approx::assert_relative_eq!(posterior.cov, expected_cov, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn measurement_size_is_checked() -> Result<()> {
        let model = identity_model(NoiseKind::Additive);
        let update = SigmaPointUpdate::for_model(&model, GaussianState::zero_mean(DMatrix::identity(1, 1))?)?;
        let prior = GaussianState::new(DVector::zeros(1), DMatrix::identity(1, 1))?;
        let result = update.update(&model, &UnscentedQuadrature::default(), &prior, &DVector::zeros(2));
        assert!(matches!(result, Err(FilterError::DimensionMismatch { context: "measurement", .. })));
        Ok(())
    }
}
