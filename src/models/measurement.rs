use nalgebra::{DMatrix, DVector, RealField, Vector2};

use crate::models::NoiseKind;

/// Observation model seen as a whole: one observation vector per state.
pub trait ObservationModel<T: RealField>: Send + Sync {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>) -> DVector<T>;
    fn state_dimension(&self) -> usize;
    fn noise_dimension(&self) -> usize;
    fn observation_dimension(&self) -> usize;
    fn noise_kind(&self) -> NoiseKind {
        NoiseKind::NonAdditive
    }
}

/// Observation model of a single sensor among many identical ones.
///
/// The sensor index is passed on every call so the same model can be evaluated
/// for several sensors at once.
pub trait LocalObservationModel<T: RealField>: Send + Sync {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>, sensor: usize) -> DVector<T>;
    fn state_dimension(&self) -> usize;
    fn noise_dimension(&self) -> usize;
    fn observation_dimension(&self) -> usize;
    fn noise_kind(&self) -> NoiseKind {
        NoiseKind::NonAdditive
    }
    /// Number of sensor indices the model can evaluate, `None` when any index works.
    fn sensor_count(&self) -> Option<usize> {
        None
    }
}

/// y = H * x + w
pub struct LinearObservationModel<T: RealField> {
    h: DMatrix<T>,
    noise_kind: NoiseKind,
}

impl<T: RealField + Copy> LinearObservationModel<T> {
    pub fn new(h: DMatrix<T>, noise_kind: NoiseKind) -> LinearObservationModel<T> {
        LinearObservationModel { h, noise_kind }
    }

    pub fn h(&self) -> &DMatrix<T> {
        &self.h
    }

    fn apply(&self, x: &DVector<T>, noise: &DVector<T>) -> DVector<T> {
        &self.h * x + noise
    }
}

impl<T: RealField + Copy> ObservationModel<T> for LinearObservationModel<T> {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>) -> DVector<T> {
        self.apply(x, noise)
    }
    fn state_dimension(&self) -> usize {
        self.h.ncols()
    }
    fn noise_dimension(&self) -> usize {
        self.h.nrows()
    }
    fn observation_dimension(&self) -> usize {
        self.h.nrows()
    }
    fn noise_kind(&self) -> NoiseKind {
        self.noise_kind
    }
}

impl<T: RealField + Copy> LocalObservationModel<T> for LinearObservationModel<T> {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>, _sensor: usize) -> DVector<T> {
        self.apply(x, noise)
    }
    fn state_dimension(&self) -> usize {
        self.h.ncols()
    }
    fn noise_dimension(&self) -> usize {
        self.h.nrows()
    }
    fn observation_dimension(&self) -> usize {
        self.h.nrows()
    }
    fn noise_kind(&self) -> NoiseKind {
        self.noise_kind
    }
}

/// Range from a fixed station to the planar position `[x, y]` held in the
/// first two rows of the state. Sensor `i` is the station `stations[i]`.
///
/// Measurement = [range]
pub struct RangeObservationModel<T: RealField> {
    stations: Vec<Vector2<T>>,
    state_dimension: usize,
    noise_kind: NoiseKind,
}

impl<T: RealField + Copy> RangeObservationModel<T> {
    /// `state_dimension` must be at least 2.
    pub fn new(stations: Vec<Vector2<T>>, state_dimension: usize) -> RangeObservationModel<T> {
        RangeObservationModel {
            stations,
            state_dimension,
            noise_kind: NoiseKind::Additive,
        }
    }

    pub fn with_noise_kind(mut self, noise_kind: NoiseKind) -> RangeObservationModel<T> {
        self.noise_kind = noise_kind;
        self
    }

    pub fn stations(&self) -> &[Vector2<T>] {
        &self.stations
    }
}

impl<T: RealField + Copy> LocalObservationModel<T> for RangeObservationModel<T> {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>, sensor: usize) -> DVector<T> {
        let station = self.stations[sensor];
        let range = ((x[0] - station.x).powi(2) + (x[1] - station.y).powi(2)).sqrt();
        DVector::from_element(1, range + noise[0])
    }
    fn state_dimension(&self) -> usize {
        self.state_dimension
    }
    fn noise_dimension(&self) -> usize {
        1
    }
    fn observation_dimension(&self) -> usize {
        1
    }
    fn noise_kind(&self) -> NoiseKind {
        self.noise_kind
    }
    fn sensor_count(&self) -> Option<usize> {
        Some(self.stations.len())
    }
}

/// Single sensor view of a local model, bound to one sensor index.
pub struct SingleSensor<M> {
    pub model: M,
    pub sensor: usize,
}

impl<T: RealField, M: LocalObservationModel<T>> ObservationModel<T> for SingleSensor<M> {
    fn observation(&self, x: &DVector<T>, noise: &DVector<T>) -> DVector<T> {
        self.model.observation(x, noise, self.sensor)
    }
    fn state_dimension(&self) -> usize {
        self.model.state_dimension()
    }
    fn noise_dimension(&self) -> usize {
        self.model.noise_dimension()
    }
    fn observation_dimension(&self) -> usize {
        self.model.observation_dimension()
    }
    fn noise_kind(&self) -> NoiseKind {
        self.model.noise_kind()
    }
}
