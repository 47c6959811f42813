use nalgebra::{DMatrix, DVector, RealField};
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, Result};

/// Gaussian belief over a state, fully described by its mean and covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianState<T: RealField> {
    /// State Vector
    pub x: DVector<T>,
    /// Covariance Matrix
    pub cov: DMatrix<T>,
}

impl<T: RealField + Copy> GaussianState<T> {
    pub fn new(x: DVector<T>, cov: DMatrix<T>) -> Result<GaussianState<T>> {
        check_dimension("covariance columns", cov.nrows(), cov.ncols())?;
        check_dimension("covariance rows", x.len(), cov.nrows())?;
        Ok(GaussianState { x, cov })
    }

    /// Zero mean with `cov` as covariance, the usual shape of a noise model.
    pub fn zero_mean(cov: DMatrix<T>) -> Result<GaussianState<T>> {
        GaussianState::new(DVector::zeros(cov.nrows()), cov)
    }

    pub fn dimension(&self) -> usize {
        self.x.len()
    }

    /// Checks that both the mean and the covariance have size `expected`.
    pub fn check_dimension(&self, context: &'static str, expected: usize) -> Result<()> {
        check_dimension(context, expected, self.x.len())?;
        check_dimension(context, expected, self.cov.nrows())?;
        check_dimension(context, expected, self.cov.ncols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    #[test]
    fn new_rejects_inconsistent_sizes() {
        let err = GaussianState::new(DVector::<f64>::zeros(3), DMatrix::identity(2, 2));
        assert!(matches!(err, Err(FilterError::DimensionMismatch { .. })));

        let err = GaussianState::new(DVector::<f64>::zeros(2), DMatrix::zeros(2, 3));
        assert!(matches!(err, Err(FilterError::DimensionMismatch { .. })));
    }

    #[test]
    fn check_dimension_accepts_matching_belief() -> Result<()> {
        let state = GaussianState::zero_mean(DMatrix::<f64>::identity(4, 4))?;
        assert_eq!(state.dimension(), 4);
        state.check_dimension("prior", 4)?;
        assert!(state.check_dimension("prior", 3).is_err());
        Ok(())
    }

    #[test]
    fn serde_round_trip_keeps_belief() -> Result<()> {
        let state = GaussianState::new(
            DVector::from_vec(vec![1.0, -2.0]),
            DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]),
        )?;
        let json = serde_json::to_string(&state).unwrap();
        let back: GaussianState<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
        Ok(())
    }
}
