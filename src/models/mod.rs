use serde::{Deserialize, Serialize};

pub mod factorized;
pub mod measurement;
pub mod motion;

/// How a model's noise enters its output.
///
/// Read once when a filter is assembled: additive noise is handled by adding its
/// covariance to the propagated one, non-additive noise is part of the
/// sigma-point augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseKind {
    Additive,
    #[default]
    NonAdditive,
}

impl NoiseKind {
    pub fn is_additive(&self) -> bool {
        matches!(self, NoiseKind::Additive)
    }
}
