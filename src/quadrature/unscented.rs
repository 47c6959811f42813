use nalgebra::{DMatrix, DVector, RealField};
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, FilterError, Result};
use crate::quadrature::{PointSet, Quadrature};
use crate::utils::linalg::{block_diagonal, spd_sqrt};
use crate::utils::state::GaussianState;

/// Unscented transform with the scaled sigma-point rule, `2n + 1` points.
///
/// `alpha` sets the spread of the points around the mean, `beta` encodes prior
/// knowledge of the distribution (2 is optimal for Gaussians) and `kappa` is the
/// secondary scaling parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnscentedQuadrature<T: RealField> {
    pub alpha: T,
    pub beta: T,
    pub kappa: T,
}

impl<T: RealField> Default for UnscentedQuadrature<T> {
    fn default() -> Self {
        UnscentedQuadrature {
            alpha: T::one(),
            beta: nalgebra::convert(2.0),
            kappa: T::zero(),
        }
    }
}

impl<T: RealField + Copy> UnscentedQuadrature<T> {
    pub fn new(alpha: T, beta: T, kappa: T) -> Result<UnscentedQuadrature<T>> {
        let quadrature = UnscentedQuadrature { alpha, beta, kappa };
        quadrature.validate()?;
        Ok(quadrature)
    }

    fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.beta.is_finite() && self.kappa.is_finite()) {
            return Err(FilterError::InvalidConfiguration(
                "unscented parameters must be finite",
            ));
        }
        if self.alpha <= T::zero() {
            return Err(FilterError::InvalidConfiguration("alpha must be positive"));
        }
        Ok(())
    }

    /// Mean weights, covariance weights and the column scaling `gamma` for a
    /// Gaussian of dimension `n`.
    pub fn sigma_weights(&self, n: usize) -> Result<(DVector<T>, DVector<T>, T)> {
        self.validate()?;
        let n_t: T = nalgebra::convert(n as f64);
        if n_t + self.kappa <= T::zero() {
            return Err(FilterError::InvalidConfiguration(
                "kappa must be greater than minus the dimension",
            ));
        }
        let lambda = self.alpha.powi(2) * (n_t + self.kappa) - n_t;

        let v = T::one() / ((T::one() + T::one()) * (n_t + lambda));
        let mut mw = DVector::from_element(2 * n + 1, v);
        let mut cw = DVector::from_element(2 * n + 1, v);

        // special cases
        let v = lambda / (n_t + lambda);
        mw[0] = v;
        cw[0] = v + T::one() - self.alpha.powi(2) + self.beta;

        let gamma = (n_t + lambda).sqrt();
        Ok((mw, cw, gamma))
    }

    fn sigma_points(
        &self,
        mean: &DVector<T>,
        cov: &DMatrix<T>,
        context: &'static str,
    ) -> Result<PointSet<T>> {
        let n = mean.len();
        let (mw, cw, gamma) = self.sigma_weights(n)?;
        // use cholesky to compute the matrix square root  // cholesky(A) = L * L^T
        let sigma = spd_sqrt(cov, context)? * gamma;
        let mut points = DMatrix::from_columns(&vec![mean.clone(); 2 * n + 1]);
        for i in 0..n {
            let sigma_column = sigma.column(i);
            let mut plus = points.column_mut(i + 1);
            plus += &sigma_column;
            let mut minus = points.column_mut(i + 1 + n);
            minus -= &sigma_column;
        }
        PointSet::for_rule(points, mw, cw, self.number_of_points(n))
    }
}

impl<T: RealField + Copy> Quadrature<T> for UnscentedQuadrature<T> {
    fn number_of_points(&self, dimension: usize) -> usize {
        2 * dimension + 1
    }

    fn transform_to_points(
        &self,
        prior: &GaussianState<T>,
        noise: &GaussianState<T>,
    ) -> Result<(PointSet<T>, PointSet<T>)> {
        let dx = prior.dimension();
        let dw = noise.dimension();
        prior.check_dimension("prior", dx)?;
        noise.check_dimension("noise", dw)?;

        let mut mean = DVector::zeros(dx + dw);
        mean.rows_mut(0, dx).copy_from(&prior.x);
        mean.rows_mut(dx, dw).copy_from(&noise.x);
        let cov = block_diagonal(&prior.cov, &noise.cov);

        let joint = self.sigma_points(&mean, &cov, "joint state and noise covariance")?;

        let state_points = joint.with_points(joint.points().rows(0, dx).clone_owned())?;
        let noise_points = joint.with_points(joint.points().rows(dx, dw).clone_owned())?;
        Ok((state_points, noise_points))
    }

    fn transform_state_to_points(&self, prior: &GaussianState<T>) -> Result<PointSet<T>> {
        prior.check_dimension("prior", prior.dimension())?;
        self.sigma_points(&prior.x, &prior.cov, "state covariance")
    }

    fn propagate_points<F>(
        &self,
        f: F,
        state_points: &PointSet<T>,
        noise_points: &PointSet<T>,
    ) -> Result<PointSet<T>>
    where
        F: Fn(&DVector<T>, &DVector<T>) -> DVector<T>,
    {
        check_dimension("noise points", state_points.count(), noise_points.count())?;
        let columns: Vec<DVector<T>> = (0..state_points.count())
            .map(|i| f(&state_points.point(i), &noise_points.point(i)))
            .collect();
        let Some(dimension) = columns.first().map(|c| c.len()) else {
            return Err(FilterError::InvalidConfiguration("point set is empty"));
        };
        for column in columns.iter() {
            check_dimension("propagated point", dimension, column.len())?;
        }
        state_points.with_points(DMatrix::from_columns(&columns))
    }
}
