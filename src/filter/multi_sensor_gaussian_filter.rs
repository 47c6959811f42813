use nalgebra::{DVector, RealField};

use crate::error::{check_dimension, Result};
use crate::filter::{Accumulation, BayesianFilter, MultiSensorSigmaPointUpdate, SigmaPointPrediction};
use crate::models::factorized::FactorizedIidObservationModel;
use crate::models::measurement::{LocalObservationModel, ObservationModel};
use crate::models::motion::ProcessModel;
use crate::quadrature::{Quadrature, UnscentedQuadrature};
use crate::utils::state::GaussianState;

/// Sigma point Gaussian filter fusing `N` IID sensors per measurement update.
///
/// The prediction is the usual sigma point time update, the correction is
/// [`MultiSensorSigmaPointUpdate`]. `z` passed to [`BayesianFilter::update`] is
/// the concatenation of all sensor measurements.
pub struct MultiSensorGaussianFilter<T, M, Q = UnscentedQuadrature<T>>
where
    T: RealField,
    M: LocalObservationModel<T>,
{
    motion_model: Box<dyn ProcessModel<T>>,
    observation_model: FactorizedIidObservationModel<T, M>,
    quadrature: Q,
    prediction: SigmaPointPrediction<T>,
    correction: MultiSensorSigmaPointUpdate<T>,
    estimate: GaussianState<T>,
}

impl<T, M, Q> MultiSensorGaussianFilter<T, M, Q>
where
    T: RealField + Copy,
    M: LocalObservationModel<T>,
    Q: Quadrature<T>,
{
    pub const NAME: &'static str = "MultiSensorGaussianFilter";
    pub const DESCRIPTION: &'static str =
        "Sigma point Gaussian filter with an information form update over IID sensors";

    /// `q` is the process noise, `r` the noise of a single sensor.
    pub fn new(
        q: GaussianState<T>,
        r: GaussianState<T>,
        motion_model: Box<dyn ProcessModel<T>>,
        observation_model: FactorizedIidObservationModel<T, M>,
        quadrature: Q,
        initial_state: GaussianState<T>,
    ) -> Result<MultiSensorGaussianFilter<T, M, Q>> {
        check_dimension(
            "observation model state",
            motion_model.state_dimension(),
            observation_model.state_dimension(),
        )?;
        initial_state.check_dimension("initial state", motion_model.state_dimension())?;
        let prediction = SigmaPointPrediction::for_model(motion_model.as_ref(), q)?;
        let correction = MultiSensorSigmaPointUpdate::for_model(&observation_model, r)?;
        Ok(MultiSensorGaussianFilter {
            motion_model,
            observation_model,
            quadrature,
            prediction,
            correction,
            estimate: initial_state,
        })
    }

    pub fn with_accumulation(mut self, accumulation: Accumulation) -> Self {
        self.correction = self.correction.with_accumulation(accumulation);
        self
    }

    pub fn observation_model(&self) -> &FactorizedIidObservationModel<T, M> {
        &self.observation_model
    }

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

impl<T, M, Q> BayesianFilter<T> for MultiSensorGaussianFilter<T, M, Q>
where
    T: RealField + Copy,
    M: LocalObservationModel<T>,
    Q: Quadrature<T>,
{
    fn predict(&mut self, u: &DVector<T>, dt: T) -> Result<()> {
        self.estimate = self.predicted(u, dt)?;
        Ok(())
    }

    fn update(&mut self, z: &DVector<T>) -> Result<()> {
        self.correction.update_in_place(
            &self.observation_model,
            &self.quadrature,
            &mut self.estimate,
            z,
        )
    }

    fn update_estimate(&mut self, u: &DVector<T>, z: &DVector<T>, dt: T) -> Result<()> {
        let prediction = self.predicted(u, dt)?;
        self.estimate =
            self.correction
                .update(&self.observation_model, &self.quadrature, &prediction, z)?;
        Ok(())
    }

    fn gaussian_estimate(&self) -> &GaussianState<T> {
        &self.estimate
    }
}
