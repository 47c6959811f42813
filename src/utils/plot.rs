use nalgebra::{Matrix2, Rotation2, Vector2};

use crate::error::{check_dimension, Result};
use crate::utils::state::GaussianState;

/// Points of the `n_sigma` confidence ellipse of the marginal over state rows `(i, j)`.
pub fn ellipse_series(
    state: &GaussianState<f64>,
    (i, j): (usize, usize),
    n_sigma: f64,
) -> Result<Vec<(f64, f64)>> {
    check_dimension("ellipse row", state.dimension(), state.dimension().max(i.max(j) + 1))?;
    let xy = Vector2::new(state.x[i], state.x[j]);
    #[rustfmt::skip]
    let p_xy = Matrix2::new(
        state.cov[(i, i)], state.cov[(i, j)],
        state.cov[(j, i)], state.cov[(j, j)],
    );

    let eigen = p_xy.symmetric_eigen();
    let eigenvectors = eigen.eigenvectors;
    let eigenvalues = eigen.eigenvalues;

    let (a, b, angle) = if eigenvalues.x >= eigenvalues.y {
        (
            eigenvalues.x.max(0.0).sqrt(),
            eigenvalues.y.max(0.0).sqrt(),
            f64::atan2(eigenvectors.m21, eigenvectors.m11),
        )
    } else {
        (
            eigenvalues.y.max(0.0).sqrt(),
            eigenvalues.x.max(0.0).sqrt(),
            f64::atan2(eigenvectors.m22, eigenvectors.m12),
        )
    };

    let rot_mat = Rotation2::new(angle);
    let ellipse_points = (0..=100)
        .map(|x| x as f64 / 100.0 * std::f64::consts::TAU) // map [0..100] -> [0..2pi]
        .map(|t| rot_mat * Vector2::new(a * t.cos(), b * t.sin()) * n_sigma + xy) //map [0..2pi] -> elipse points
        .map(|xy| (xy.x, xy.y))
        .collect();
    Ok(ellipse_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn ellipse_of_axis_aligned_covariance() -> Result<()> {
        let state = GaussianState::new(
            DVector::from_vec(vec![1.0, 2.0, 0.0]),
            DMatrix::from_diagonal(&DVector::from_vec(vec![4.0, 1.0, 9.0])),
        )?;
        let points = ellipse_series(&state, (0, 1), 1.0)?;
        assert_eq!(points.len(), 101);
        for (x, y) in points {
            let r = ((x - 1.0) / 2.0).powi(2) + (y - 2.0).powi(2);
            approx::assert_abs_diff_eq!(r, 1.0, epsilon = 1e-9);
        }
        assert!(ellipse_series(&state, (0, 3), 1.0).is_err());
        Ok(())
    }
}
