use std::marker::PhantomData;

use nalgebra::{DMatrix, DVector, RealField};

use crate::error::{check_dimension, FilterError, Result};
use crate::models::measurement::{LocalObservationModel, ObservationModel};
use crate::models::NoiseKind;
use crate::utils::state::GaussianState;

/// Which part of the state each sensor observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLayout {
    /// Sensor `i` observes the `i`-th slice of the state, the state holds one
    /// local state per sensor.
    Sliced,
    /// Every sensor observes the whole state.
    Shared,
}

/// `N` independent, identically distributed copies of one local observation
/// model, presented as a single joint model.
///
/// Observation and noise vectors are the concatenation of the per-sensor ones.
pub struct FactorizedIidObservationModel<T: RealField, M: LocalObservationModel<T>> {
    local_model: M,
    sensors: usize,
    layout: StateLayout,
    _scalar: PhantomData<T>,
}

impl<T: RealField + Copy, M: LocalObservationModel<T>> FactorizedIidObservationModel<T, M> {
    /// Sensor `i` observes the `i`-th slice of the state.
    pub fn new(local_model: M, sensors: usize) -> Result<Self> {
        Self::with_layout(local_model, sensors, StateLayout::Sliced)
    }

    /// Every sensor observes the whole state.
    pub fn with_shared_state(local_model: M, sensors: usize) -> Result<Self> {
        Self::with_layout(local_model, sensors, StateLayout::Shared)
    }

    pub fn with_layout(local_model: M, sensors: usize, layout: StateLayout) -> Result<Self> {
        if sensors == 0 {
            return Err(FilterError::InvalidSensorCount(sensors));
        }
        if let Some(available) = local_model.sensor_count() {
            if available < sensors {
                return Err(FilterError::DimensionMismatch {
                    context: "sensors supported by the local model",
                    expected: sensors,
                    actual: available,
                });
            }
        }
        Ok(FactorizedIidObservationModel {
            local_model,
            sensors,
            layout,
            _scalar: PhantomData,
        })
    }

    pub fn local_model(&self) -> &M {
        &self.local_model
    }

    pub fn count_local_models(&self) -> usize {
        self.sensors
    }

    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    /// Observation of sensor `sensor` alone, `noise` being that sensor's noise.
    ///
    /// `x` is the full state; the local model receives the slice that belongs
    /// to the sensor.
    pub fn local_observation(&self, sensor: usize, x: &DVector<T>, noise: &DVector<T>) -> DVector<T> {
        match self.layout {
            StateLayout::Shared => self.local_model.observation(x, noise, sensor),
            StateLayout::Sliced => {
                let ds = self.local_model.state_dimension();
                let slice = x.rows(sensor * ds, ds).clone_owned();
                self.local_model.observation(&slice, noise, sensor)
            }
        }
    }

    /// Checked version of [`ObservationModel::observation`].
    pub fn predict_observation(&self, x: &DVector<T>, noise: &DVector<T>) -> Result<DVector<T>> {
        check_dimension("joint state", self.state_dimension(), x.len())?;
        check_dimension("joint noise", self.noise_dimension(), noise.len())?;
        let dy = self.local_model.observation_dimension();
        let dw = self.local_model.noise_dimension();

        let mut y = DVector::zeros(self.observation_dimension());
        for i in 0..self.sensors {
            let local_noise = noise.rows(i * dw, dw).clone_owned();
            let y_i = self.local_observation(i, x, &local_noise);
            check_dimension("local observation", dy, y_i.len())?;
            y.rows_mut(i * dy, dy).copy_from(&y_i);
        }
        Ok(y)
    }

    /// Measurement of sensor `sensor` inside the joint measurement `y`.
    pub fn local_measurement(&self, y: &DVector<T>, sensor: usize) -> DVector<T> {
        let dy = self.local_model.observation_dimension();
        y.rows(sensor * dy, dy).clone_owned()
    }

    /// Noise of all sensors, the block diagonal repetition of `local`.
    pub fn joint_noise(&self, local: &GaussianState<T>) -> Result<GaussianState<T>> {
        let dw = self.local_model.noise_dimension();
        local.check_dimension("local noise", dw)?;
        let n = dw * self.sensors;
        let mut x = DVector::zeros(n);
        let mut cov = DMatrix::zeros(n, n);
        for i in 0..self.sensors {
            x.rows_mut(i * dw, dw).copy_from(&local.x);
            cov.view_mut((i * dw, i * dw), (dw, dw)).copy_from(&local.cov);
        }
        GaussianState::new(x, cov)
    }
}

impl<T: RealField + Copy, M: LocalObservationModel<T>> ObservationModel<T>
    for FactorizedIidObservationModel<T, M>
{
    /// Concatenated observations of all sensors. Panics on inconsistent sizes,
    /// use [`FactorizedIidObservationModel::predict_observation`] to get an error.
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>) -> DVector<T> {
        let dy = self.local_model.observation_dimension();
        let dw = self.local_model.noise_dimension();
        let mut y = DVector::zeros(self.observation_dimension());
        for i in 0..self.sensors {
            let local_noise = noise.rows(i * dw, dw).clone_owned();
            y.rows_mut(i * dy, dy)
                .copy_from(&self.local_observation(i, x, &local_noise));
        }
        y
    }

    fn state_dimension(&self) -> usize {
        match self.layout {
            StateLayout::Sliced => self.local_model.state_dimension() * self.sensors,
            StateLayout::Shared => self.local_model.state_dimension(),
        }
    }

    fn noise_dimension(&self) -> usize {
        self.local_model.noise_dimension() * self.sensors
    }

    fn observation_dimension(&self) -> usize {
        self.local_model.observation_dimension() * self.sensors
    }

    fn noise_kind(&self) -> NoiseKind {
        self.local_model.noise_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::measurement::{LinearObservationModel, RangeObservationModel};
    use nalgebra::Vector2;

    fn scale_model() -> LinearObservationModel<f64> {
        // y = [2 x0; x1] + w
        LinearObservationModel::new(
            DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]),
            NoiseKind::NonAdditive,
        )
    }

    #[test]
    fn zero_sensors_is_invalid() {
        let result = FactorizedIidObservationModel::new(scale_model(), 0);
        assert!(matches!(result, Err(FilterError::InvalidSensorCount(0))));
    }

    #[test]
    fn more_sensors_than_stations_is_rejected() {
        let stations = vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 8.0)];
        let local = RangeObservationModel::new(stations.clone(), 2);
        let result = FactorizedIidObservationModel::with_shared_state(local, 3);
        assert!(matches!(
            result,
            Err(FilterError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        let local = RangeObservationModel::new(stations, 2);
        assert!(FactorizedIidObservationModel::with_shared_state(local, 2).is_ok());
    }

    #[test]
    fn dimensions_scale_with_sensor_count() -> Result<()> {
        let sliced = FactorizedIidObservationModel::new(scale_model(), 3)?;
        assert_eq!(sliced.count_local_models(), 3);
        assert_eq!(sliced.state_dimension(), 6);
        assert_eq!(sliced.noise_dimension(), 6);
        assert_eq!(sliced.observation_dimension(), 6);

        let shared = FactorizedIidObservationModel::with_shared_state(scale_model(), 3)?;
        assert_eq!(shared.state_dimension(), 2);
        assert_eq!(shared.observation_dimension(), 6);
        Ok(())
    }

    #[test]
    fn predict_observation_concatenates_slices() -> Result<()> {
        let model = FactorizedIidObservationModel::new(scale_model(), 2)?;
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let w = DVector::from_vec(vec![0.1, 0.2, 0.3, 0.4]);
        let y = model.predict_observation(&x, &w)?;
        approx::assert_abs_diff_eq!(
            y,
            DVector::from_vec(vec![2.1, 2.2, 6.3, 4.4]),
            epsilon = 1e-12
        );
        assert_eq!(ObservationModel::observation(&model, &x, &w), y);
        assert_eq!(model.local_measurement(&y, 1), y.rows(2, 2).clone_owned());
        Ok(())
    }

    #[test]
    fn predict_observation_checks_sizes() -> Result<()> {
        let model = FactorizedIidObservationModel::new(scale_model(), 2)?;
        let result = model.predict_observation(&DVector::zeros(2), &DVector::zeros(4));
        assert!(matches!(result, Err(FilterError::DimensionMismatch { .. })));
        Ok(())
    }

    #[test]
    fn shared_state_passes_sensor_index() -> Result<()> {
        let stations = vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 8.0)];
        let model = FactorizedIidObservationModel::with_shared_state(RangeObservationModel::new(stations, 2), 2)?;
        let x = DVector::from_vec(vec![6.0, 0.0]);
        let y = model.predict_observation(&x, &DVector::zeros(2))?;
        approx::assert_abs_diff_eq!(y, DVector::from_vec(vec![6.0, 10.0]), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn joint_noise_is_block_diagonal() -> Result<()> {
        let model = FactorizedIidObservationModel::new(scale_model(), 2)?;
        let local = GaussianState::new(
            DVector::from_vec(vec![1.0, 2.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 2.0]),
        )?;
        let joint = model.joint_noise(&local)?;
        assert_eq!(joint.x, DVector::from_vec(vec![1.0, 2.0, 1.0, 2.0]));
        assert_eq!(joint.cov.view((2, 2), (2, 2)).clone_owned(), local.cov);
        assert_eq!(joint.cov.view((0, 2), (2, 2)).clone_owned(), DMatrix::zeros(2, 2));
        Ok(())
    }
}
