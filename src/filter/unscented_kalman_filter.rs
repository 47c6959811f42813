use nalgebra::{DVector, RealField};

use crate::error::{check_dimension, Result};
use crate::filter::{BayesianFilter, SigmaPointPrediction, SigmaPointUpdate};
use crate::models::measurement::ObservationModel;
use crate::models::motion::ProcessModel;
use crate::quadrature::UnscentedQuadrature;
use crate::utils::state::GaussianState;

/// Unscented Kalman filter for one process model and one observation model.
///
/// `q` is the process noise, `r` the observation noise; whether each is
/// additive is read from its model.
pub struct UnscentedKalmanFilter<T: RealField> {
    motion_model: Box<dyn ProcessModel<T>>,
    observation_model: Box<dyn ObservationModel<T>>,
    quadrature: UnscentedQuadrature<T>,
    prediction: SigmaPointPrediction<T>,
    correction: SigmaPointUpdate<T>,
    estimate: GaussianState<T>,
}

impl<T: RealField + Copy> UnscentedKalmanFilter<T> {
    pub fn new(
        q: GaussianState<T>,
        r: GaussianState<T>,
        motion_model: Box<dyn ProcessModel<T>>,
        observation_model: Box<dyn ObservationModel<T>>,
        quadrature: UnscentedQuadrature<T>,
        initial_state: GaussianState<T>,
    ) -> Result<UnscentedKalmanFilter<T>> {
        check_dimension(
            "observation model state",
            motion_model.state_dimension(),
            observation_model.state_dimension(),
        )?;
        initial_state.check_dimension("initial state", motion_model.state_dimension())?;
        let prediction = SigmaPointPrediction::for_model(motion_model.as_ref(), q)?;
        let correction = SigmaPointUpdate::for_model(observation_model.as_ref(), r)?;
        Ok(UnscentedKalmanFilter {
            motion_model,
            observation_model,
            quadrature,
            prediction,
            correction,
            estimate: initial_state,
        })
    }

    /// Replaces the estimate, e.g. after a track is re-initialized.
    pub fn reset(&mut self, state: GaussianState<T>) -> Result<()> {
        state.check_dimension("reset state", self.motion_model.state_dimension())?;
        self.estimate = state;
        Ok(())
    }

    fn predicted(&self, u: &DVector<T>, dt: T) -> Result<GaussianState<T>> {
        self.prediction
            .predict(self.motion_model.as_ref(), &self.quadrature, &self.estimate, u, dt)
    }
}

impl<T: RealField + Copy> BayesianFilter<T> for UnscentedKalmanFilter<T> {
    fn predict(&mut self, u: &DVector<T>, dt: T) -> Result<()> {
        self.estimate = self.predicted(u, dt)?;
        Ok(())
    }

    fn update(&mut self, z: &DVector<T>) -> Result<()> {
        self.estimate = self.correction.update(
            self.observation_model.as_ref(),
            &self.quadrature,
            &self.estimate,
            z,
        )?;
        Ok(())
    }

    fn update_estimate(&mut self, u: &DVector<T>, z: &DVector<T>, dt: T) -> Result<()> {
        let prediction = self.predicted(u, dt)?;
        self.estimate = self.correction.update(
            self.observation_model.as_ref(),
            &self.quadrature,
            &prediction,
            z,
        )?;
        Ok(())
    }

    fn gaussian_estimate(&self) -> &GaussianState<T> {
        &self.estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::measurement::LinearObservationModel;
    use crate::models::motion::UnicycleProcessModel;
    use crate::models::NoiseKind;
    use nalgebra::DMatrix;

    fn position_observation() -> Box<dyn ObservationModel<f64>> {
        #[rustfmt::skip]
        let h = DMatrix::from_row_slice(2, 4, &[
            1., 0., 0., 0.,
            0., 1., 0., 0.,
        ]);
        Box::new(LinearObservationModel::new(h, NoiseKind::Additive))
    }

    fn ukf() -> UnscentedKalmanFilter<f64> {
        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![0.1, 0.1, 1.0_f64.to_radians(), 1.0]));
        UnscentedKalmanFilter::new(
            GaussianState::zero_mean(q).unwrap(),
            GaussianState::zero_mean(DMatrix::identity(2, 2)).unwrap(),
            Box::new(UnicycleProcessModel),
            position_observation(),
            UnscentedQuadrature::new(0.5, 2.0, 0.0).unwrap(),
            GaussianState::new(DVector::zeros(4), DMatrix::identity(4, 4)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn ukf_runs() -> Result<()> {
        let dt = 0.1;
        let mut ukf = ukf();
        let u = DVector::from_vec(vec![1.0, 0.1]);
        let z = DVector::from_vec(vec![0.1, 0.0]);
        for _ in 0..10 {
            ukf.update_estimate(&u, &z, dt)?;
        }
        let estimate = ukf.gaussian_estimate();
        assert_eq!(estimate.dimension(), 4);
        // the position is observed, its uncertainty stays below the prior one
        assert!(estimate.cov[(0, 0)] < 1.0);
        assert!(estimate.cov.clone().cholesky().is_some());
        Ok(())
    }

    #[test]
    fn failed_update_keeps_estimate() -> Result<()> {
        let mut ukf = ukf();
        let before = ukf.gaussian_estimate().clone();
        let u = DVector::from_vec(vec![1.0, 0.1]);
        assert!(ukf.update_estimate(&u, &DVector::zeros(3), 0.1).is_err());
        assert_eq!(ukf.gaussian_estimate(), &before);

        ukf.predict(&u, 0.1)?;
        assert_ne!(ukf.gaussian_estimate(), &before);
        Ok(())
    }

    #[test]
    fn mismatched_models_are_rejected() {
        let result = UnscentedKalmanFilter::new(
            GaussianState::<f64>::zero_mean(DMatrix::identity(4, 4)).unwrap(),
            GaussianState::<f64>::zero_mean(DMatrix::identity(1, 1)).unwrap(),
            Box::new(UnicycleProcessModel),
            Box::new(LinearObservationModel::new(DMatrix::identity(1, 1), NoiseKind::Additive)),
            UnscentedQuadrature::default(),
            GaussianState::new(DVector::zeros(4), DMatrix::identity(4, 4)).unwrap(),
        );
        assert!(result.is_err());
    }
}
