use thiserror::Error;

/// Errors returned by the quadrature, the models and the filters.
///
/// Every operation checks its inputs before writing any output, so an error
/// never leaves a belief half updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid sensor count {0}: at least one sensor is required")]
    InvalidSensorCount(usize),

    #[error("covariance is singular or not positive-definite: {0}")]
    SingularCovariance(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// Fails with [`FilterError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn check_dimension(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FilterError::DimensionMismatch {
            context,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_dimension_reports_context() {
        assert!(check_dimension("state", 3, 3).is_ok());
        let err = check_dimension("state", 3, 2).unwrap_err();
        assert_eq!(
            err,
            FilterError::DimensionMismatch {
                context: "state",
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "dimension mismatch for state: expected 3, got 2"
        );
    }
}
