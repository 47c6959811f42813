use nalgebra::{DMatrix, DVector, RealField};

use crate::models::NoiseKind;

pub trait ProcessModel<T: RealField>: Send + Sync {
    fn prediction(&self, x: &DVector<T>, noise: &DVector<T>, u: &DVector<T>, dt: T) -> DVector<T>;
    fn state_dimension(&self) -> usize;
    fn noise_dimension(&self) -> usize;
    fn input_dimension(&self) -> usize;
    fn noise_kind(&self) -> NoiseKind {
        NoiseKind::Additive
    }
}

/// x_{t+1} = A * x_t + B * u_t + w
pub struct LinearProcessModel<T: RealField> {
    a: DMatrix<T>,
    b: DMatrix<T>,
    noise_kind: NoiseKind,
}

impl<T: RealField + Copy> LinearProcessModel<T> {
    pub fn new(a: DMatrix<T>, b: DMatrix<T>, noise_kind: NoiseKind) -> LinearProcessModel<T> {
        LinearProcessModel { a, b, noise_kind }
    }

    /// Random walk, x_{t+1} = x_t + w
    pub fn random_walk(dimension: usize, noise_kind: NoiseKind) -> LinearProcessModel<T> {
        LinearProcessModel {
            a: DMatrix::identity(dimension, dimension),
            b: DMatrix::zeros(dimension, 0),
            noise_kind,
        }
    }

    pub fn a(&self) -> &DMatrix<T> {
        &self.a
    }
}

impl<T: RealField + Copy> ProcessModel<T> for LinearProcessModel<T> {
    fn prediction(&self, x: &DVector<T>, noise: &DVector<T>, u: &DVector<T>, _dt: T) -> DVector<T> {
        &self.a * x + &self.b * u + noise
    }
    fn state_dimension(&self) -> usize {
        self.a.nrows()
    }
    fn noise_dimension(&self) -> usize {
        self.a.nrows()
    }
    fn input_dimension(&self) -> usize {
        self.b.ncols()
    }
    fn noise_kind(&self) -> NoiseKind {
        self.noise_kind
    }
}

/// motion model
///
/// x_{t+1} = x_t + v * dt * cos(yaw)
///
/// y_{t+1} = y_t + v * dt * sin(yaw)
///
/// yaw_{t+1} = yaw_t + omega * dt
///
/// v_{t+1} = v_cmd
///
/// state = [x, y, yaw, v], input = [v_cmd, omega], additive noise on the state
pub struct UnicycleProcessModel;

impl<T: RealField + Copy> ProcessModel<T> for UnicycleProcessModel {
    fn prediction(&self, x: &DVector<T>, noise: &DVector<T>, u: &DVector<T>, dt: T) -> DVector<T> {
        let yaw = x[2];
        let v = x[3];
        DVector::from_vec(vec![
            x[0] + yaw.cos() * v * dt,
            x[1] + yaw.sin() * v * dt,
            yaw + u[1] * dt,
            u[0],
        ]) + noise
    }
    fn state_dimension(&self) -> usize {
        4
    }
    fn noise_dimension(&self) -> usize {
        4
    }
    fn input_dimension(&self) -> usize {
        2
    }
}
