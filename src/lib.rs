//! Sigma point Gaussian filtering with a multi-sensor measurement update.
//!
//! [`MultiSensorSigmaPointUpdate`] fuses `N` identical, independent sensors in
//! information form, [`MultiSensorGaussianFilter`] wraps it together with a
//! sigma point prediction into a recursive filter.

pub mod error;
pub mod filter;
pub mod models;
pub mod quadrature;
pub mod utils;

pub use error::{FilterError, Result};
pub use filter::{
    Accumulation, BayesianFilter, MultiSensorGaussianFilter, MultiSensorSigmaPointUpdate,
    SigmaPointPrediction, SigmaPointUpdate, UnscentedKalmanFilter,
};
pub use models::factorized::{FactorizedIidObservationModel, StateLayout};
pub use models::NoiseKind;
pub use quadrature::{PointSet, Quadrature, UnscentedQuadrature};
pub use utils::state::GaussianState;
