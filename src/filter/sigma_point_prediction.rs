use nalgebra::{DVector, RealField};

use crate::error::{check_dimension, Result};
use crate::filter::sigma_points;
use crate::models::motion::ProcessModel;
use crate::models::NoiseKind;
use crate::quadrature::Quadrature;
use crate::utils::state::GaussianState;

/// Time update: pushes the belief through the process model with sigma points.
#[derive(Debug, Clone)]
pub struct SigmaPointPrediction<T: RealField> {
    noise: GaussianState<T>,
    noise_kind: NoiseKind,
}

impl<T: RealField + Copy> SigmaPointPrediction<T> {
    pub fn new(noise: GaussianState<T>, noise_kind: NoiseKind) -> SigmaPointPrediction<T> {
        SigmaPointPrediction { noise, noise_kind }
    }

    /// Takes the noise kind from `model` and checks the noise against it.
    pub fn for_model<P: ProcessModel<T> + ?Sized>(
        model: &P,
        noise: GaussianState<T>,
    ) -> Result<SigmaPointPrediction<T>> {
        noise.check_dimension("process noise", model.noise_dimension())?;
        Ok(SigmaPointPrediction::new(noise, model.noise_kind()))
    }

    pub fn noise(&self) -> &GaussianState<T> {
        &self.noise
    }

    pub fn predict<P: ProcessModel<T> + ?Sized, Q: Quadrature<T>>(
        &self,
        model: &P,
        quadrature: &Q,
        prior: &GaussianState<T>,
        u: &DVector<T>,
        dt: T,
    ) -> Result<GaussianState<T>> {
        let dx = model.state_dimension();
        prior.check_dimension("prior", dx)?;
        self.noise.check_dimension("process noise", model.noise_dimension())?;
        check_dimension("input", model.input_dimension(), u.len())?;
        if self.noise_kind.is_additive() {
            check_dimension("additive process noise", dx, self.noise.dimension())?;
        }

        let (p_x, p_q) = sigma_points(quadrature, prior, &self.noise, self.noise_kind)?;
        let p_xpred = quadrature.propagate_points(|x, w| model.prediction(x, w, u, dt), &p_x, &p_q)?;
        check_dimension("predicted state", dx, p_xpred.dimension())?;

        let mut cov_xpred = p_xpred.covariance();
        if self.noise_kind.is_additive() {
            cov_xpred += &self.noise.cov;
        }
        log::debug!(
            "sigma point prediction: state dimension {}, {} points",
            dx,
            p_xpred.count()
        );
        GaussianState::new(p_xpred.mean(), cov_xpred)
    }
}
