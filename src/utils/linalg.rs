use nalgebra::{DMatrix, RealField};

use crate::error::{check_dimension, FilterError, Result};

pub fn symmetrize<T: RealField + Copy>(m: &DMatrix<T>) -> DMatrix<T> {
    (m + m.transpose()) * nalgebra::convert::<f64, T>(0.5)
}

/// Lower Cholesky factor `L` of a symmetric positive-definite matrix, `m = L * L^T`.
///
/// The factorization is rejected when the squared ratio between the smallest and
/// the largest pivot is below machine epsilon: such a matrix is singular for all
/// practical purposes even if the decomposition itself went through.
pub fn spd_sqrt<T: RealField + Copy>(m: &DMatrix<T>, context: &'static str) -> Result<DMatrix<T>> {
    check_dimension(context, m.nrows(), m.ncols())?;
    let Some(cholesky) = symmetrize(m).cholesky() else {
        return Err(FilterError::SingularCovariance(context));
    };
    let l = cholesky.unpack();
    if l.nrows() > 0 {
        let diagonal = l.diagonal();
        let min = diagonal.min();
        let max = diagonal.max();
        if !(min * min > T::default_epsilon() * max * max) {
            return Err(FilterError::SingularCovariance(context));
        }
    }
    Ok(l)
}

/// Inverse of a symmetric positive-definite matrix through its Cholesky factor.
pub fn spd_inverse<T: RealField + Copy>(
    m: &DMatrix<T>,
    context: &'static str,
) -> Result<DMatrix<T>> {
    let l = spd_sqrt(m, context)?;
    let n = l.nrows();
    let Some(l_inv) = l.solve_lower_triangular(&DMatrix::identity(n, n)) else {
        return Err(FilterError::SingularCovariance(context));
    };
    Ok(symmetrize(&(l_inv.transpose() * l_inv)))
}

/// Block diagonal matrix `diag(a, b)`.
pub fn block_diagonal<T: RealField + Copy>(a: &DMatrix<T>, b: &DMatrix<T>) -> DMatrix<T> {
    let n = a.nrows() + b.nrows();
    let m = a.ncols() + b.ncols();
    let mut out = DMatrix::zeros(n, m);
    out.view_mut((0, 0), a.shape()).copy_from(a);
    out.view_mut((a.nrows(), a.ncols()), b.shape()).copy_from(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spd_inverse_correct() -> Result<()> {
        #[rustfmt::skip]
        let m = DMatrix::from_row_slice(3, 3, &[
            4.0, 2.0, 0.6,
            2.0, 2.0, 0.5,
            0.6, 0.5, 3.0,
        ]);
        let inv = spd_inverse(&m, "test")?;
        approx::assert_abs_diff_eq!(&m * &inv, DMatrix::identity(3, 3), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(inv.clone(), inv.transpose(), epsilon = 0.0);
        Ok(())
    }

    #[test]
    fn spd_sqrt_reconstructs_matrix() -> Result<()> {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0.3, 1.0]);
        let l = spd_sqrt(&m, "test")?;
        approx::assert_abs_diff_eq!(&l * l.transpose(), m, epsilon = 1e-12);
        assert_eq!(l[(0, 1)], 0.0);
        Ok(())
    }

    #[test]
    fn spd_inverse_rejects_singular_and_indefinite() {
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            spd_inverse(&singular, "singular"),
            Err(FilterError::SingularCovariance("singular"))
        );

        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        assert!(spd_inverse(&indefinite, "indefinite").is_err());

        let nearly_singular = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1e-20]);
        assert!(spd_sqrt(&nearly_singular, "nearly singular").is_err());
    }

    #[test]
    fn block_diagonal_places_blocks() {
        let a = DMatrix::from_element(2, 2, 1.0);
        let b = DMatrix::from_element(1, 1, 3.0);
        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(3, 3, &[
            1.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
            0.0, 0.0, 3.0,
        ]);
        assert_eq!(block_diagonal(&a, &b), expected);
    }
}
