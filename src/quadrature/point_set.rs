use nalgebra::{DMatrix, DVector, RealField};

use crate::error::{check_dimension, Result};
use crate::utils::linalg::symmetrize;

/// Weighted sigma points, stored column-wise: `points` is `D x K`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet<T: RealField> {
    points: DMatrix<T>,
    mean_weights: DVector<T>,
    covariance_weights: DVector<T>,
}

impl<T: RealField + Copy> PointSet<T> {
    pub fn new(
        points: DMatrix<T>,
        mean_weights: DVector<T>,
        covariance_weights: DVector<T>,
    ) -> Result<PointSet<T>> {
        check_dimension("mean weights", points.ncols(), mean_weights.len())?;
        check_dimension("covariance weights", points.ncols(), covariance_weights.len())?;
        Ok(PointSet {
            points,
            mean_weights,
            covariance_weights,
        })
    }

    /// Points generated by a quadrature rule that prescribes `expected` points.
    pub fn for_rule(
        points: DMatrix<T>,
        mean_weights: DVector<T>,
        covariance_weights: DVector<T>,
        expected: usize,
    ) -> Result<PointSet<T>> {
        check_dimension("quadrature point count", expected, points.ncols())?;
        PointSet::new(points, mean_weights, covariance_weights)
    }

    /// Every point equal to `point`, sharing the weights of `like`.
    pub fn repeated(point: &DVector<T>, like: &PointSet<T>) -> PointSet<T> {
        let count = like.count();
        PointSet {
            points: DMatrix::from_columns(&vec![point.clone(); count]),
            mean_weights: like.mean_weights.clone(),
            covariance_weights: like.covariance_weights.clone(),
        }
    }

    /// Same weights as `self` with other points, used after propagation.
    pub(crate) fn with_points(&self, points: DMatrix<T>) -> Result<PointSet<T>> {
        PointSet::new(
            points,
            self.mean_weights.clone(),
            self.covariance_weights.clone(),
        )
    }

    /// Dimension of a single point
    pub fn dimension(&self) -> usize {
        self.points.nrows()
    }

    /// Number of points
    pub fn count(&self) -> usize {
        self.points.ncols()
    }

    pub fn points(&self) -> &DMatrix<T> {
        &self.points
    }

    pub fn point(&self, i: usize) -> DVector<T> {
        self.points.column(i).clone_owned()
    }

    pub fn mean_weights(&self) -> &DVector<T> {
        &self.mean_weights
    }

    pub fn covariance_weights(&self) -> &DVector<T> {
        &self.covariance_weights
    }

    /// Weighted mean of the points
    pub fn mean(&self) -> DVector<T> {
        &self.points * &self.mean_weights
    }

    /// Points minus their weighted mean
    pub fn centered_points(&self) -> DMatrix<T> {
        let mean = self.mean();
        let mut centered = self.points.clone();
        for mut column in centered.column_iter_mut() {
            column -= &mean;
        }
        centered
    }

    /// `centered * diag(covariance_weights) * centered^T`
    pub fn covariance(&self) -> DMatrix<T> {
        let centered = self.centered_points();
        symmetrize(&weighted_product(
            &centered,
            &self.covariance_weights,
            &centered,
        ))
    }

    /// Cross covariance with another point set carrying the same weights,
    /// `centered_self * diag(covariance_weights) * centered_other^T`.
    pub fn cross_covariance(&self, other: &PointSet<T>) -> Result<DMatrix<T>> {
        check_dimension("point count", self.count(), other.count())?;
        Ok(weighted_product(
            &self.centered_points(),
            &self.covariance_weights,
            &other.centered_points(),
        ))
    }
}

/// `a * diag(w) * b^T` without materializing the diagonal matrix.
pub(crate) fn weighted_product<T: RealField + Copy>(
    a: &DMatrix<T>,
    w: &DVector<T>,
    b: &DMatrix<T>,
) -> DMatrix<T> {
    let mut aw = a.clone();
    for (mut column, w) in aw.column_iter_mut().zip(w.iter()) {
        column *= *w;
    }
    aw * b.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    fn example() -> PointSet<f64> {
        #[rustfmt::skip]
        let points = DMatrix::from_row_slice(2, 3, &[
            1.0, 2.0, 0.0,
            1.0, 3.0, -1.0,
        ]);
        PointSet::new(
            points,
            DVector::from_vec(vec![0.5, 0.25, 0.25]),
            DVector::from_vec(vec![0.5, 0.25, 0.25]),
        )
        .unwrap()
    }

    #[test]
    fn mean_and_centered_points() {
        let set = example();
        assert_eq!(set.dimension(), 2);
        assert_eq!(set.count(), 3);
        approx::assert_abs_diff_eq!(set.mean(), DVector::from_vec(vec![1.0, 1.0]), epsilon = 1e-12);

        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(2, 3, &[
            0.0, 1.0, -1.0,
            0.0, 2.0, -2.0,
        ]);
        approx::assert_abs_diff_eq!(set.centered_points(), expected, epsilon = 1e-12);
    }

    #[test]
    fn covariance_is_symmetric_and_matches_cross_covariance() -> Result<()> {
        let set = example();
        let cov = set.covariance();
        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(2, 2, &[
            0.5, 1.0,
            1.0, 2.0,
        ]);
        approx::assert_abs_diff_eq!(cov.clone(), expected, epsilon = 1e-12);
        assert_eq!(cov, cov.transpose());
        approx::assert_abs_diff_eq!(set.cross_covariance(&set)?, cov, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn new_rejects_weight_count_mismatch() {
        let result = PointSet::new(
            DMatrix::<f64>::zeros(2, 3),
            DVector::from_element(2, 0.5),
            DVector::from_element(3, 1.0 / 3.0),
        );
        assert!(matches!(result, Err(FilterError::DimensionMismatch { .. })));
    }

    #[test]
    fn for_rule_rejects_count_other_than_prescribed() {
        let result = PointSet::for_rule(
            DMatrix::<f64>::zeros(2, 3),
            DVector::from_element(3, 1.0 / 3.0),
            DVector::from_element(3, 1.0 / 3.0),
            5,
        );
        assert!(matches!(
            result,
            Err(FilterError::DimensionMismatch {
                expected: 5,
                actual: 3,
                ..
            })
        ));
        let set = PointSet::for_rule(
            DMatrix::<f64>::zeros(2, 3),
            DVector::from_element(3, 1.0 / 3.0),
            DVector::from_element(3, 1.0 / 3.0),
            3,
        );
        assert!(set.is_ok());
    }

    #[test]
    fn cross_covariance_rejects_point_count_mismatch() {
        let set = example();
        let other = PointSet::new(
            DMatrix::<f64>::zeros(1, 5),
            DVector::from_element(5, 0.2),
            DVector::from_element(5, 0.2),
        )
        .unwrap();
        assert!(set.cross_covariance(&other).is_err());
    }

    #[test]
    fn repeated_points_have_zero_covariance() {
        let set = example();
        let repeated = PointSet::repeated(&DVector::from_vec(vec![3.0]), &set);
        assert_eq!(repeated.count(), set.count());
        assert_eq!(repeated.mean_weights(), set.mean_weights());
        approx::assert_abs_diff_eq!(repeated.mean(), DVector::from_vec(vec![3.0]), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(repeated.covariance(), DMatrix::zeros(1, 1), epsilon = 1e-12);
    }
}
