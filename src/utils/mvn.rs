use nalgebra::{DMatrix, DVector, RealField};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{check_dimension, Result};
use crate::utils::linalg::{spd_inverse, spd_sqrt};
use crate::utils::state::GaussianState;

pub struct MultiVariateNormal<T: RealField> {
    mean: DVector<T>,
    precision: DMatrix<T>,
    /// lower cholesky factor of the covariance, used for sampling
    sqrt_cov: DMatrix<T>,
    factor: T,
}

impl<T: RealField + Copy> MultiVariateNormal<T> {
    pub fn new(mean: &DVector<T>, covariance: &DMatrix<T>) -> Result<Self> {
        check_dimension("mvn covariance", mean.len(), covariance.nrows())?;
        let sqrt_cov = spd_sqrt(covariance, "mvn covariance")?;
        let precision = spd_inverse(covariance, "mvn covariance")?;
        let det = sqrt_cov.diagonal().product().powi(2);
        let d: T = nalgebra::convert(mean.len() as f64);
        let factor = T::one() / (T::two_pi().powf(d) * det).sqrt();
        Ok(MultiVariateNormal {
            mean: mean.clone(),
            precision,
            sqrt_cov,
            factor,
        })
    }

    pub fn from_state(state: &GaussianState<T>) -> Result<Self> {
        MultiVariateNormal::new(&state.x, &state.cov)
    }

    /// Probability density function
    pub fn pdf(&self, x: &DVector<T>) -> T {
        self.factor * T::exp(self.exponent(x))
    }

    pub fn log_pdf(&self, x: &DVector<T>) -> T {
        self.factor.ln() + self.exponent(x)
    }

    fn exponent(&self, x: &DVector<T>) -> T {
        let dx = &self.mean - x;
        let neg_half: T = nalgebra::convert(-0.5);
        neg_half * dx.dot(&(&self.precision * &dx))
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> DVector<T>
    where
        StandardNormal: Distribution<T>,
    {
        let z = DVector::<T>::from_fn(self.mean.len(), |_, _| rng.sample(StandardNormal));
        &self.mean + &self.sqrt_cov * z
    }
}
